//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per parlare con il document store
//! e con i servizi HTTP esterni. I DTOs separano la rappresentazione esterna
//! (payload, patch parziali, viste arricchite) dalle entities.

pub mod conversation;
pub mod external;
pub mod message;
pub mod offer;
pub mod post;
pub mod query;
pub mod user;

// Re-exports per facilitare l'import
pub use conversation::{ConversationPreview, CreateConversationDTO, UpdateConversationDTO};
pub use external::{
    AuthenticityResponseDTO, AuthenticityScore, ImageUploadResponseDTO, ModelResponseDTO,
    PushNotificationDTO,
};
pub use message::{CreateMessageDTO, UpdateMessageDTO};
pub use offer::{CreateOfferDTO, EnrichedOfferDTO, OfferDecision, UpdateOfferDTO};
pub use post::{CreatePostDTO, NearbyPost, UpdatePostDTO};
pub use query::{MessageCursor, MessagePage, PostCursor, PostPage};
pub use user::{CreateUserDTO, SignUpDTO, UpdateProfileDTO, UpdateUserDTO, UserDTO};
