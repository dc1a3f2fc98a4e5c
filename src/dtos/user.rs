//! User DTOs - Data Transfer Objects per utenti

use crate::entities::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Struct per esporre il profilo pubblico (mai la password)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserDTO {
    pub user_id: String,
    pub name: String,
    pub profile_picture: String,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            name: value.display_name().to_string(),
            profile_picture: value.display_picture().to_string(),
            user_id: value.user_id,
        }
    }
}

/// Dati inseriti nel form di registrazione
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct SignUpDTO {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be between 6 and 128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,
}

/// DTO per creare un nuovo utente (password già hashata)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateUserDTO {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// DTO per aggiornare un utente (solo i campi `Some(_)` vengono modificati)
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateUserDTO {
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub push_token: Option<String>,
    pub password: Option<String>,
    pub email_verified: Option<bool>,
    /// (post_id, liked?)
    pub liked_post: Option<(String, bool)>,
}

/// Campi modificabili dalla schermata di modifica profilo
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateProfileDTO {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub push_token: Option<String>,
}
