//! Services module - Coordinatore per tutte le operazioni dell'applicazione
//!
//! Questo modulo organizza i servizi in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo espone le operazioni di una specifica funzionalità; la `ChatSession`
//! le compone nel controller della schermata di chat.

pub mod auth;
pub mod conversation;
pub mod messages;
pub mod notify;
pub mod offers;
pub mod posts;
pub mod presence;
pub mod session;
pub mod upload;

// Re-exports per facilitare l'import
pub use auth::{Session, SignUpOutcome};
pub use notify::NotificationDispatcher;
pub use presence::ReadReceiptSweeper;
pub use session::{ChatItem, ChatSession, ChatViewModel, SessionEvent};
pub use upload::{UploadOutcome, UploadPipeline, UploadStatus};
