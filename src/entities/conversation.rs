//! Conversation entity - Entità conversazione tra esattamente due utenti

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Conversation {
    pub conversation_id: String,
    pub participants: [String; 2],
    // chiave composita ordinata, indicizzata in modo univoco dallo store
    pub pair_key: String,
    pub last_message: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_sender_id: Option<String>,
    // assente = non sta scrivendo
    pub typing: HashMap<String, DateTime<Utc>>,
    // "ho letto i messaggi fino a questo istante, istante INCLUSO"
    pub last_read: HashMap<String, DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Builds the order-independent key identifying the participant pair
    pub fn pair_key(a: &str, b: &str) -> String {
        if a <= b {
            format!("{}:{}", a, b)
        } else {
            format!("{}:{}", b, a)
        }
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    /// Returns the other participant, or None if `user_id` is not a member
    pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
        match &self.participants {
            [a, b] if a == user_id => Some(b.as_str()),
            [a, b] if b == user_id => Some(a.as_str()),
            _ => None,
        }
    }
}
