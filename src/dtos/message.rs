//! Message DTOs - Data Transfer Objects per messaggi

use crate::entities::SharedPost;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO per creare un nuovo messaggio (senza message_id, timestamp e read)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateMessageDTO {
    pub conversation_id: String,
    pub sender_id: String,

    #[validate(length(max = 5000, message = "Message text must be at most 5000 characters"))]
    pub text: String,

    pub image: Option<String>,
    pub local_image_id: Option<String>,
    pub shared_post: Option<SharedPost>,
}

impl CreateMessageDTO {
    pub fn text(conversation_id: &str, sender_id: &str, text: &str) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            text: text.to_string(),
            image: None,
            local_image_id: None,
            shared_post: None,
        }
    }
}

/// DTO per aggiornare un messaggio (solo campi modificabili)
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateMessageDTO {
    pub image: Option<String>,
    pub clear_local_image_id: bool,
    pub read: Option<bool>,
}
