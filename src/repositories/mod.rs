//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza i repository in sotto-moduli separati per una migliore manutenibilità.
//! Ogni repository gestisce le operazioni sul document store per una specifica collection;
//! tutti condividono lo stesso `Arc<DocumentStore>`.

// Dichiarazione dei sotto-moduli
pub mod conversation;
pub mod message;
pub mod offer;
pub mod post;
pub mod store;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read, ReadMany, Update};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use conversation::ConversationRepository;
pub use message::MessageRepository;
pub use offer::OfferRepository;
pub use post::PostRepository;
pub use store::{DocumentStore, StoreError};
pub use user::UserRepository;
