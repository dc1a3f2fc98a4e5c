//! Presence & Read Receipts - Stato "sta scrivendo" e conferme di lettura
//!
//! Il typing è derivato dai timestamp sul documento conversazione, rivalutato ad
//! ogni snapshot; le conferme di lettura sono scritte da uno sweep periodico
//! legato alla vita della sessione.

use crate::core::AppState;
use crate::dtos::UpdateConversationDTO;
use crate::entities::{Conversation, Message};
use crate::repositories::{MessageRepository, Update};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

/// `user_id` sta scrivendo se il suo ultimo timestamp è più recente della finestra.
/// Non esiste un timer locale: lo stato cambia solo ad ogni nuovo snapshot.
pub fn is_typing(
    conversation: &Conversation,
    user_id: &str,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    let Ok(window) = chrono::Duration::from_std(window) else {
        return false;
    };
    conversation
        .typing
        .get(user_id)
        .is_some_and(|started| now - *started < window)
}

/// Scrittura best-effort del flag typing: un errore viene solo loggato
#[instrument(skip(state))]
pub async fn set_typing(state: &AppState, conversation_id: &str, user_id: &str, typing: bool) {
    let result = state
        .conversation
        .update(
            &conversation_id.to_string(),
            &UpdateConversationDTO {
                typing: Some((user_id.to_string(), typing)),
                ..Default::default()
            },
        )
        .await;
    if let Err(e) = result {
        warn!("Error updating typing status: {}", e);
    }
}

/// Riflette localmente una conferma di lettura ricevuta: ogni messaggio di
/// `author_id` creato entro `read_until` diventa letto. Idempotente.
///
/// # Returns
/// Numero di messaggi passati a letto in questa chiamata
pub fn apply_read_receipt(
    messages: &mut [Message],
    author_id: &str,
    read_until: DateTime<Utc>,
) -> usize {
    let mut flipped = 0;
    for message in messages
        .iter_mut()
        .filter(|m| m.sender_id == author_id && !m.read && m.created_at <= read_until)
    {
        message.read = true;
        flipped += 1;
    }
    flipped
}

/// Uno sweep: segna come letti tutti i messaggi non letti dell'interlocutore e
/// timbra il last-read del lettore, in un unico batch atomico.
/// Gli errori vengono loggati: le conferme di lettura non sono critiche.
#[instrument(skip(messages))]
pub async fn sweep_read_receipts(
    messages: &MessageRepository,
    conversation_id: &str,
    reader_id: &str,
    counterpart_id: &str,
) -> usize {
    match messages
        .mark_read_batch(conversation_id, reader_id, counterpart_id)
        .await
    {
        Ok(flipped) => {
            if flipped > 0 {
                debug!(flipped, "Messages marked as seen");
            }
            flipped
        }
        Err(e) => {
            warn!("Error marking messages as seen: {}", e);
            0
        }
    }
}

/// Task periodico di sweep, legato alla sessione che lo possiede:
/// parte subito, poi ad intervallo fisso, e viene abortito al drop.
pub struct ReadReceiptSweeper {
    handle: JoinHandle<()>,
}

impl ReadReceiptSweeper {
    pub fn spawn(
        messages: MessageRepository,
        conversation_id: String,
        reader_id: String,
        counterpart_id: String,
        every: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // il primo tick è immediato
                ticker.tick().await;
                sweep_read_receipts(&messages, &conversation_id, &reader_id, &counterpart_id)
                    .await;
            }
        });
        info!("Read receipt sweeper started");
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ReadReceiptSweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::CreateConversationDTO;
    use crate::repositories::{ConversationRepository, Create, DocumentStore};
    use chrono::Duration as ChronoDuration;
    use std::collections::HashMap;

    fn message(id: &str, sender: &str, at: DateTime<Utc>) -> Message {
        Message {
            message_id: id.to_string(),
            conversation_id: "c1".to_string(),
            sender_id: sender.to_string(),
            text: "hi".to_string(),
            created_at: at,
            read: false,
            image: None,
            local_image_id: None,
            shared_post: None,
        }
    }

    #[test]
    fn read_receipt_is_idempotent() {
        let t0 = Utc::now();
        let mut messages = vec![
            message("m1", "alice", t0),
            message("m2", "bob", t0 + ChronoDuration::seconds(1)),
            message("m3", "alice", t0 + ChronoDuration::seconds(2)),
            message("m4", "alice", t0 + ChronoDuration::seconds(10)),
        ];
        let read_until = t0 + ChronoDuration::seconds(5);

        assert_eq!(apply_read_receipt(&mut messages, "alice", read_until), 2);
        let once = messages.clone();
        assert_eq!(apply_read_receipt(&mut messages, "alice", read_until), 0);
        assert_eq!(messages, once);

        let read: Vec<bool> = messages.iter().map(|m| m.read).collect();
        assert_eq!(read, vec![true, false, true, false]);
    }

    #[test]
    fn typing_expires_after_window() {
        let now = Utc::now();
        let mut typing = HashMap::new();
        typing.insert("bob".to_string(), now - ChronoDuration::seconds(2));
        typing.insert("carol".to_string(), now - ChronoDuration::seconds(7));
        let conversation = Conversation {
            conversation_id: "c1".into(),
            participants: ["alice".into(), "bob".into()],
            pair_key: Conversation::pair_key("alice", "bob"),
            last_message: String::new(),
            last_message_at: None,
            last_sender_id: None,
            typing,
            last_read: HashMap::new(),
            created_at: now,
        };
        let window = Duration::from_secs(5);

        assert!(is_typing(&conversation, "bob", now, window));
        assert!(!is_typing(&conversation, "carol", now, window));
        assert!(!is_typing(&conversation, "alice", now, window));
    }

    #[tokio::test]
    async fn sweeper_runs_immediately_and_stops_on_drop() {
        let store = std::sync::Arc::new(DocumentStore::new());
        let (conversation, _) = ConversationRepository::new(store.clone())
            .create_or_get(&CreateConversationDTO {
                participants: ["alice".into(), "bob".into()],
            })
            .await
            .unwrap();
        let cid = conversation.conversation_id;
        let messages = MessageRepository::new(store.clone());
        messages
            .create(&crate::dtos::CreateMessageDTO::text(&cid, "bob", "hello"))
            .await
            .unwrap();

        let sweeper = ReadReceiptSweeper::spawn(
            messages.clone(),
            cid.clone(),
            "alice".into(),
            "bob".into(),
            Duration::from_secs(3600),
        );
        // nessuna attesa dell'intervallo: il primo sweep è immediato
        for _ in 0..50 {
            if messages.find_unread_from(&cid, "bob").await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(messages.find_unread_from(&cid, "bob").await.unwrap().is_empty());
        assert!(sweeper.is_running());

        sweeper.stop();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!sweeper.is_running());
    }
}
