//! Subscriptions - Query live su una conversazione
//!
//! Ogni sottoscrizione possiede il proprio receiver sul feed della conversazione;
//! quando viene droppata il receiver si chiude e il canale viene rimosso al
//! publish successivo senza listener.

use crate::entities::{Conversation, Message};
use crate::live::ChangeEvent;
use crate::repositories::{ConversationRepository, MessageRepository, Read, StoreError};
use futures::FutureExt;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, instrument, warn};

/// Attende il prossimo evento rilevante sul feed.
/// Un receiver in lag viene trattato come "qualcosa è cambiato": lo snapshot
/// viene comunque riletto per intero.
/// Ritorna `None` quando il feed è chiuso.
async fn next_relevant<F>(events: &mut BroadcastStream<ChangeEvent>, relevant: F) -> Option<()>
where
    F: Fn(ChangeEvent) -> bool,
{
    loop {
        match events.next().await? {
            Ok(event) if relevant(event) => break,
            Ok(_) => continue,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Live subscription lagged, reloading snapshot");
                break;
            }
        }
    }

    // coalesce gli eventi già in coda: lo snapshot li riflette tutti
    while let Some(Some(_)) = events.next().now_or_never() {}
    Some(())
}

/// Query live sulla finestra dei messaggi più recenti (`page_size` righe).
/// I cambiamenti a messaggi più vecchi della finestra sono comunque notificati,
/// ma lo snapshot contiene solo la pagina più recente.
pub struct MessageWindowSubscription {
    repo: MessageRepository,
    conversation_id: String,
    page_size: usize,
    events: BroadcastStream<ChangeEvent>,
}

impl MessageWindowSubscription {
    pub fn new(
        repo: MessageRepository,
        events: tokio::sync::broadcast::Receiver<ChangeEvent>,
        conversation_id: &str,
        page_size: usize,
    ) -> Self {
        Self {
            repo,
            conversation_id: conversation_id.to_string(),
            page_size,
            events: BroadcastStream::new(events),
        }
    }

    /// Snapshot corrente della finestra, dal più recente al più vecchio
    #[instrument(skip(self), fields(conversation_id = %self.conversation_id))]
    pub async fn snapshot(&self) -> Result<Vec<Message>, StoreError> {
        let messages = self
            .repo
            .find_latest(&self.conversation_id, self.page_size)
            .await?;
        debug!(count = messages.len(), "Message window snapshot");
        Ok(messages)
    }

    /// Attende il prossimo cambiamento e ritorna il nuovo snapshot.
    /// `None` quando il feed è chiuso.
    pub async fn changed(&mut self) -> Option<Result<Vec<Message>, StoreError>> {
        next_relevant(&mut self.events, |event| {
            matches!(event, ChangeEvent::Messages | ChangeEvent::ConversationDeleted)
        })
        .await?;
        Some(self.snapshot().await)
    }

    /// Variante non bloccante di [`changed`](Self::changed)
    pub fn poll_changed(&mut self) -> Option<Result<Vec<Message>, StoreError>> {
        self.changed().now_or_never().flatten()
    }
}

/// Query live sul documento conversazione (typing, letture, anteprima)
pub struct ConversationSubscription {
    repo: ConversationRepository,
    conversation_id: String,
    events: BroadcastStream<ChangeEvent>,
}

impl ConversationSubscription {
    pub fn new(
        repo: ConversationRepository,
        events: tokio::sync::broadcast::Receiver<ChangeEvent>,
        conversation_id: &str,
    ) -> Self {
        Self {
            repo,
            conversation_id: conversation_id.to_string(),
            events: BroadcastStream::new(events),
        }
    }

    /// `Ok(None)` se il documento è stato cancellato
    pub async fn snapshot(&self) -> Result<Option<Conversation>, StoreError> {
        self.repo.read(&self.conversation_id).await
    }

    pub async fn changed(&mut self) -> Option<Result<Option<Conversation>, StoreError>> {
        next_relevant(&mut self.events, |event| {
            matches!(
                event,
                ChangeEvent::Conversation | ChangeEvent::ConversationDeleted
            )
        })
        .await?;
        Some(self.snapshot().await)
    }

    pub fn poll_changed(&mut self) -> Option<Result<Option<Conversation>, StoreError>> {
        self.changed().now_or_never().flatten()
    }
}
