//! Post DTOs - Data Transfer Objects per annunci

use crate::entities::{GeoPoint, Post, PostKind};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO per creare un nuovo annuncio (contatori e timestamp assegnati dallo store)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreatePostDTO {
    pub owner_id: String,
    pub kind: PostKind,

    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 2000, message = "Description must be between 1 and 2000 characters"))]
    pub description: String,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[validate(length(min = 1, max = 10, message = "A post needs between 1 and 10 images"))]
    pub images: Vec<String>,

    pub location: Option<GeoPoint>,

    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,

    #[validate(length(min = 1, message = "At least one exchange option is required"))]
    pub exchange_options: Vec<String>,
}

/// DTO per aggiornare un annuncio: oggi solo il modello 3D generato in background
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdatePostDTO {
    pub model_url: Option<String>,
}

/// Annuncio con la distanza dall'utente, per la schermata "vicino a me"
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NearbyPost {
    pub post: Post,
    pub distance_km: f64,
}
