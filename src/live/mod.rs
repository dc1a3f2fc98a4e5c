//! Live Module - Sottoscrizioni in tempo reale sullo store
//!
//! Questo modulo sostituisce i listener del document database:
//! - `feed`: canali broadcast per conversazione, alimentati dai repository
//! - `subscription`: query live sui messaggi recenti e sul documento conversazione
//!
//! Gli eventi non trasportano dati: ad ogni notifica la sottoscrizione rilegge lo
//! snapshot dallo store, quindi un listener in ritardo non perde mai lo stato finale.

pub mod feed;
pub mod subscription;

pub use feed::{ChangeEvent, FeedMap};
pub use subscription::{ConversationSubscription, MessageWindowSubscription};

/// Capacità del canale broadcast di ogni conversazione
pub const FEED_CHANNEL_CAPACITY: usize = 64;
