//! ExchangeOffer entity - Proposta di scambio tra due post

use super::enums::OfferStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExchangeOffer {
    pub offer_id: String,
    pub post_id: String,         // post richiesto
    pub offered_post_id: String, // post offerto in cambio
    pub offered_by_id: String,   // utente che propone
    pub post_owner_id: String,   // proprietario del post richiesto, l'unico che risponde
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
}
