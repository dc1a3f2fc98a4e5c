//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità che rappresentano i documenti persistiti
//! nel document store. Ogni entity corrisponde a una collection (o sub-collection).

pub mod conversation;
pub mod enums;
pub mod message;
pub mod offer;
pub mod post;
pub mod user;

// Re-exports per facilitare l'import
pub use conversation::Conversation;
pub use enums::{OfferStatus, PostKind};
pub use message::{Message, SharedPost};
pub use offer::ExchangeOffer;
pub use post::{GeoPoint, PLACEHOLDER_POST_IMAGE, Post};
pub use user::{DEFAULT_DISPLAY_NAME, DEFAULT_PROFILE_IMAGE, User};
