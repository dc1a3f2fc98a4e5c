use super::ensure_success;
use crate::core::AppError;
use crate::dtos::PushNotificationDTO;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

#[async_trait]
pub trait PushRelay: Send + Sync {
    async fn send(&self, notification: &PushNotificationDTO) -> Result<(), AppError>;
}

pub struct HttpPushRelay {
    client: Client,
    url: String,
}

impl HttpPushRelay {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl PushRelay for HttpPushRelay {
    #[instrument(skip(self, notification), fields(title = %notification.title))]
    async fn send(&self, notification: &PushNotificationDTO) -> Result<(), AppError> {
        let response = self.client.post(&self.url).json(notification).send().await?;
        ensure_success(response, "Push relay rejected the notification").await?;
        debug!("Notification handed to relay");
        Ok(())
    }
}
