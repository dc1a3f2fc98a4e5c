//! Notification Dispatcher - Invio best-effort delle notifiche push
//!
//! Canale secondario at-most-once: il fallimento di una notifica non viene mai
//! propagato all'operazione (messaggio, proposta) che l'ha generata.

use crate::api::PushRelay;
use crate::dtos::PushNotificationDTO;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

lazy_static! {
    static ref PUSH_TOKEN_RE: Option<Regex> =
        Regex::new(r"^Expo(nent)?PushToken\[[^\[\]]+\]$").ok();
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    relay: Arc<dyn PushRelay>,
}

impl NotificationDispatcher {
    pub fn new(relay: Arc<dyn PushRelay>) -> Self {
        Self { relay }
    }

    pub fn is_valid_token(token: &str) -> bool {
        PUSH_TOKEN_RE
            .as_ref()
            .is_some_and(|re| re.is_match(token))
    }

    /// Fire-and-forget: lancia l'invio su un task separato e ritorna subito.
    ///
    /// # Returns
    /// * `Some(handle)` - invio avviato (l'handle serve solo a chi vuole attenderlo, es. i test)
    /// * `None` - token assente o malformato, nessun invio
    #[instrument(skip(self, token, body))]
    pub fn notify(&self, token: Option<&str>, title: &str, body: &str) -> Option<JoinHandle<()>> {
        let Some(token) = token else {
            debug!("Recipient has no push token, skipping notification");
            return None;
        };
        if !Self::is_valid_token(token) {
            warn!("Recipient push token is malformed, skipping notification");
            return None;
        }

        let relay = self.relay.clone();
        let notification = PushNotificationDTO {
            expo_push_token: token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        };
        Some(tokio::spawn(async move {
            match relay.send(&notification).await {
                Ok(()) => debug!("Notification sent"),
                Err(e) => warn!("Error sending notification: {}", e),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AppError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRelay {
        sent: Mutex<Vec<PushNotificationDTO>>,
        fail: bool,
    }

    #[async_trait]
    impl PushRelay for RecordingRelay {
        async fn send(&self, notification: &PushNotificationDTO) -> Result<(), AppError> {
            self.sent.lock().unwrap().push(notification.clone());
            if self.fail {
                Err(AppError::service_unavailable("relay down"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn token_shape_is_checked() {
        assert!(NotificationDispatcher::is_valid_token("ExponentPushToken[abc123]"));
        assert!(NotificationDispatcher::is_valid_token("ExpoPushToken[xyz]"));
        assert!(!NotificationDispatcher::is_valid_token("abc123"));
        assert!(!NotificationDispatcher::is_valid_token("ExpoPushToken[]"));
    }

    #[tokio::test]
    async fn missing_token_is_a_silent_no_op() {
        let relay = Arc::new(RecordingRelay::default());
        let dispatcher = NotificationDispatcher::new(relay.clone());
        assert!(dispatcher.notify(None, "New Message", "hi").is_none());
        assert!(relay.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn relay_failure_is_swallowed() {
        let relay = Arc::new(RecordingRelay {
            fail: true,
            ..Default::default()
        });
        let dispatcher = NotificationDispatcher::new(relay.clone());
        let handle = dispatcher
            .notify(Some("ExpoPushToken[abc]"), "New Message", "Bob: hi")
            .unwrap();
        assert!(handle.await.is_ok());
        assert_eq!(relay.sent.lock().unwrap()[0].body, "Bob: hi");
    }
}
