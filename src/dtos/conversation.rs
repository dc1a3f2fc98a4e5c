//! Conversation DTOs - Data Transfer Objects per conversazioni

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DTO per creare una conversazione (id, pair_key e timestamp assegnati dallo store)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateConversationDTO {
    pub participants: [String; 2],
}

/// Patch parziale del documento conversazione.
/// I timestamp (anteprima, typing) sono sempre assegnati dallo store; le letture
/// passano da `MessageRepository::mark_read_batch`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateConversationDTO {
    /// (testo anteprima, mittente)
    pub preview: Option<(String, String)>,
    /// (utente, sta scrivendo?)
    pub typing: Option<(String, bool)>,
}

/// Riga della lista conversazioni (tab Messaggi)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConversationPreview {
    pub conversation_id: String,
    pub counterpart_id: String,
    pub counterpart_name: String,
    pub counterpart_picture: String,
    pub last_message: String,
    pub last_message_at: Option<DateTime<Utc>>,
}
