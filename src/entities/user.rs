//! User entity - Entità utente con metodi per gestione password

use bcrypt::{hash, verify};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Nome mostrato quando il profilo dell'interlocutore non è disponibile
pub const DEFAULT_DISPLAY_NAME: &str = "App User";
pub const DEFAULT_PROFILE_IMAGE: &str =
    "https://static-00.iconduck.com/assets.00/profile-circle-icon-512x512-zxne30hp.png";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub profile_picture: Option<String>,
    pub push_token: Option<String>,
    #[serde(skip_serializing)]
    pub password: String,
    pub email_verified: bool,
    pub liked_posts: BTreeSet<String>,
}

impl User {
    /// Verify if target_password matches the stored hashed password
    pub fn verify_password(&self, target_password: &str) -> bool {
        verify(target_password, &self.password).unwrap_or(false)
    }

    /// Hash a password using bcrypt with the given cost
    pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
        let hash = hash(password, cost)?;
        Ok(hash)
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            DEFAULT_DISPLAY_NAME
        } else {
            &self.name
        }
    }

    pub fn display_picture(&self) -> &str {
        self.profile_picture
            .as_deref()
            .unwrap_or(DEFAULT_PROFILE_IMAGE)
    }
}
