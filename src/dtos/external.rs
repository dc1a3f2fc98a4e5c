//! External DTOs - Payload scambiati con i servizi HTTP esterni

use serde::{Deserialize, Serialize};

/// Body JSON atteso dal relay delle notifiche push
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PushNotificationDTO {
    #[serde(rename = "expoPushToken")]
    pub expo_push_token: String,
    pub title: String,
    pub body: String,
}

/// Risposta dell'image host dopo un upload multipart
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ImageUploadResponseDTO {
    pub secure_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthenticityScore {
    /// probabilità (0-100) che l'immagine sia generata artificialmente
    pub percentage: f64,
}

/// Risposta del classificatore di autenticità
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthenticityResponseDTO {
    pub filename: String,
    pub result: AuthenticityScore,
}

/// Risposta del generatore 2D->3D
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModelResponseDTO {
    #[serde(rename = "modelUrl")]
    pub model_url: Option<String>,
}
