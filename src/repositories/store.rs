//! DocumentStore - Adapter del document database gestito
//!
//! Espone solo le primitive su cui il client fa affidamento: collection per id,
//! sub-collection dei messaggi, timestamp assegnati dal server, indice univoco
//! sulla coppia di partecipanti, batch atomici e change feed per conversazione.

use crate::entities::{Conversation, ExchangeOffer, Message, Post, User};
use crate::live::FeedMap;
use crate::live::feed::ChangeEvent;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Documento inesistente
    NotFound,
    /// Violazione di un indice univoco
    AlreadyExists,
    /// Il documento non è nello stato richiesto dalla scrittura condizionale
    FailedPrecondition,
    /// Rete assente o backend irraggiungibile
    Unavailable,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StoreError::NotFound => "document not found",
            StoreError::AlreadyExists => "document already exists",
            StoreError::FailedPrecondition => "document is not in the expected state",
            StoreError::Unavailable => "backend unavailable",
        };
        f.write_str(text)
    }
}

impl std::error::Error for StoreError {}

pub struct DocumentStore {
    pub(crate) users: DashMap<String, User>,
    pub(crate) posts: DashMap<String, Post>,
    pub(crate) offers: DashMap<String, ExchangeOffer>,
    pub(crate) conversations: DashMap<String, Conversation>,
    /// pair_key -> conversation_id
    pub(crate) pair_index: DashMap<String, String>,
    /// conversation_id -> messaggi in ordine crescente di created_at
    pub(crate) messages: DashMap<String, Vec<Message>>,
    pub(crate) feeds: FeedMap,
    clock_micros: AtomicI64,
    online: AtomicBool,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            posts: DashMap::new(),
            offers: DashMap::new(),
            conversations: DashMap::new(),
            pair_index: DashMap::new(),
            messages: DashMap::new(),
            feeds: FeedMap::new(),
            clock_micros: AtomicI64::new(0),
            online: AtomicBool::new(true),
        }
    }

    /// Simula la perdita (o il ritorno) della connettività verso il backend
    pub fn set_online(&self, online: bool) {
        if online {
            info!("Backend connectivity restored");
        } else {
            warn!("Backend connectivity lost");
        }
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn ensure_online(&self) -> Result<(), StoreError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }

    /// Timestamp assegnato dal server: strettamente crescente, quindi
    /// l'ordinamento per timestamp non ha mai pareggi.
    pub fn server_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros();
        let previous = match self.clock_micros.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |last| Some(now.max(last + 1)),
        ) {
            Ok(prev) | Err(prev) => prev,
        };
        let assigned = now.max(previous + 1);
        DateTime::<Utc>::from_timestamp_micros(assigned).unwrap_or_else(Utc::now)
    }

    pub fn new_document_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    pub(crate) fn publish(&self, conversation_id: &str, event: ChangeEvent) {
        self.feeds.publish(conversation_id, event);
    }

    pub fn feeds(&self) -> &FeedMap {
        &self.feeds
    }
}
