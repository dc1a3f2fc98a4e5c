//! Query DTOs - Cursori e pagine per le query paginate

use crate::entities::{Message, Post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Posizione di un messaggio nell'ordinamento (timestamp, id).
/// Le query "più vecchi di" restituiscono solo righe strettamente minori.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MessageCursor {
    pub created_at: DateTime<Utc>,
    pub message_id: String,
}

impl From<&Message> for MessageCursor {
    fn from(value: &Message) -> Self {
        Self {
            created_at: value.created_at,
            message_id: value.message_id.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PostCursor {
    pub created_at: DateTime<Utc>,
    pub post_id: String,
}

impl From<&Post> for PostCursor {
    fn from(value: &Post) -> Self {
        Self {
            created_at: value.created_at,
            post_id: value.post_id.clone(),
        }
    }
}

/// Pagina di messaggi, dal più recente al più vecchio
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub cursor: Option<MessageCursor>,
    pub has_more: bool,
}

/// Pagina di annunci, dal più recente al più vecchio
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub cursor: Option<PostCursor>,
    pub has_more: bool,
}
