//! Barter chat library - client del marketplace di scambio
//!
//! Espone il flusso di sincronizzazione della chat (messaggi, presenza, conferme
//! di lettura, upload immagini, notifiche) e le operazioni su annunci, proposte
//! di scambio e autenticazione, tutte sopra un document store con feed live.

pub mod api;
pub mod core;
pub mod dtos;
pub mod entities;
pub mod live;
pub mod repositories;
pub mod services;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, Config, ExternalClients, auth, config};
pub use repositories::DocumentStore;
pub use services::ChatSession;
