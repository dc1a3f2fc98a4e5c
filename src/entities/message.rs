//! Message entity - Entità messaggio della sub-collection di una conversazione

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Riferimento a un post condiviso in chat, mostrato come card
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SharedPost {
    pub post_id: String,
    pub title: String,
    pub image: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub message_id: String,
    pub conversation_id: String,
    pub sender_id: String,
    // può essere vuoto per immagini e post condivisi
    pub text: String,
    // assegnato dallo store, mai dal client
    pub created_at: DateTime<Utc>,
    // prospettiva del mittente: il destinatario l'ha visto?
    pub read: bool,
    pub image: Option<String>,
    // correlation id dell'immagine locale, azzerato al primo patch riuscito
    pub local_image_id: Option<String>,
    pub shared_post: Option<SharedPost>,
}

impl Message {
    pub fn is_pending_upload(&self) -> bool {
        self.local_image_id.is_some()
    }
}
