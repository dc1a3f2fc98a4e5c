use dashmap::DashMap;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::{debug, instrument};

use crate::live::FEED_CHANNEL_CAPACITY;

/// Cosa è cambiato in una conversazione. Gli eventi non trasportano dati:
/// chi è in ascolto rilegge lo snapshot dallo store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Messages,
    Conversation,
    ConversationDeleted,
}

pub struct FeedMap {
    /// Head tx del canale broadcast di ogni conversazione, per conversation_id
    channels: DashMap<String, Sender<ChangeEvent>>,
}

impl Default for FeedMap {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedMap {
    pub fn new() -> Self {
        FeedMap {
            channels: DashMap::new(),
        }
    }

    #[instrument(skip(self))]
    pub fn subscribe(&self, conversation_id: &str) -> Receiver<ChangeEvent> {
        self.channels
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                debug!("Creating new change feed for conversation");
                broadcast::channel::<ChangeEvent>(FEED_CHANNEL_CAPACITY).0
            })
            .subscribe()
    }

    /// Notifica i listener della conversazione; ritorna quanti ne ha raggiunti
    #[instrument(skip(self))]
    pub fn publish(&self, conversation_id: &str, event: ChangeEvent) -> usize {
        let sent = match self.channels.get(conversation_id) {
            Some(tx) => tx.send(event).unwrap_or(0),
            None => return 0,
        };

        if sent == 0 {
            // nessuno sta ascoltando, rimuovi il canale
            self.channels
                .remove_if(conversation_id, |_, tx| tx.receiver_count() == 0);
        } else {
            debug!(receivers = sent, "Change broadcast to listeners");
        }
        sent
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let feeds = FeedMap::new();
        let mut rx1 = feeds.subscribe("c1");
        let mut rx2 = feeds.subscribe("c1");

        assert_eq!(feeds.publish("c1", ChangeEvent::Messages), 2);
        assert_eq!(rx1.recv().await.ok(), Some(ChangeEvent::Messages));
        assert_eq!(rx2.recv().await.ok(), Some(ChangeEvent::Messages));
    }

    #[test]
    fn channel_without_listeners_is_dropped() {
        let feeds = FeedMap::new();
        let rx = feeds.subscribe("c1");
        assert_eq!(feeds.channel_count(), 1);
        drop(rx);

        assert_eq!(feeds.publish("c1", ChangeEvent::Conversation), 0);
        assert_eq!(feeds.channel_count(), 0);
        assert_eq!(feeds.publish("unknown", ChangeEvent::Conversation), 0);
    }
}
