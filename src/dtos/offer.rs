//! Offer DTOs - Data Transfer Objects per proposte di scambio

use crate::entities::{ExchangeOffer, OfferStatus, Post};
use serde::{Deserialize, Serialize};

/// DTO per creare una nuova proposta (status sempre Pending alla creazione)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateOfferDTO {
    pub post_id: String,
    pub offered_post_id: String,
    pub offered_by_id: String,
    pub post_owner_id: String,
}

/// DTO per aggiornare una proposta (solo lo stato è modificabile)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateOfferDTO {
    pub status: OfferStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferDecision {
    Accept,
    Decline,
}

impl OfferDecision {
    pub fn target_status(&self) -> OfferStatus {
        match self {
            OfferDecision::Accept => OfferStatus::Accepted,
            OfferDecision::Decline => OfferStatus::Declined,
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            OfferDecision::Accept => "accepted",
            OfferDecision::Decline => "declined",
        }
    }
}

/// DTO arricchito con i due post coinvolti (None se il post non esiste più)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EnrichedOfferDTO {
    pub offer: ExchangeOffer,
    pub post: Option<Post>,
    pub offered_post: Option<Post>,
}
