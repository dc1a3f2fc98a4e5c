//! OfferRepository - Repository per la gestione delle proposte di scambio

use super::{Create, DocumentStore, Read, StoreError, Update};
use crate::dtos::{CreateOfferDTO, UpdateOfferDTO};
use crate::entities::{ExchangeOffer, OfferStatus};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

//OFFER REPOSITORY
#[derive(Clone)]
pub struct OfferRepository {
    store: Arc<DocumentStore>,
}

impl OfferRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    fn newest_first<F>(&self, keep: F) -> Vec<ExchangeOffer>
    where
        F: Fn(&ExchangeOffer) -> bool,
    {
        let mut offers: Vec<ExchangeOffer> = self
            .store
            .offers
            .iter()
            .filter(|o| keep(o.value()))
            .map(|o| o.value().clone())
            .collect();
        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        offers
    }

    /// Get all offers received on posts owned by `owner_id`
    #[instrument(skip(self))]
    pub async fn find_many_by_owner(&self, owner_id: &str) -> Result<Vec<ExchangeOffer>, StoreError> {
        self.store.ensure_online()?;
        Ok(self.newest_first(|o| o.post_owner_id == owner_id))
    }

    /// Get all offers proposed by `offerer_id`
    #[instrument(skip(self))]
    pub async fn find_many_by_offerer(
        &self,
        offerer_id: &str,
    ) -> Result<Vec<ExchangeOffer>, StoreError> {
        self.store.ensure_online()?;
        Ok(self.newest_first(|o| o.offered_by_id == offerer_id))
    }

    /// Check if the same swap is already pending
    pub async fn has_pending_offer(
        &self,
        post_id: &str,
        offered_post_id: &str,
        offerer_id: &str,
    ) -> Result<bool, StoreError> {
        self.store.ensure_online()?;
        Ok(self.store.offers.iter().any(|o| {
            o.status == OfferStatus::Pending
                && o.post_id == post_id
                && o.offered_post_id == offered_post_id
                && o.offered_by_id == offerer_id
        }))
    }
}

impl Create<ExchangeOffer, CreateOfferDTO> for OfferRepository {
    #[instrument(skip(self, data), fields(post_id = %data.post_id))]
    async fn create(&self, data: &CreateOfferDTO) -> Result<ExchangeOffer, StoreError> {
        self.store.ensure_online()?;
        let offer = ExchangeOffer {
            offer_id: DocumentStore::new_document_id(),
            post_id: data.post_id.clone(),
            offered_post_id: data.offered_post_id.clone(),
            offered_by_id: data.offered_by_id.clone(),
            post_owner_id: data.post_owner_id.clone(),
            status: OfferStatus::Pending,
            created_at: self.store.server_timestamp(),
        };
        self.store.offers.insert(offer.offer_id.clone(), offer.clone());
        info!(offer_id = %offer.offer_id, "Offer created");
        Ok(offer)
    }
}

impl Read<ExchangeOffer, String> for OfferRepository {
    async fn read(&self, id: &String) -> Result<Option<ExchangeOffer>, StoreError> {
        self.store.ensure_online()?;
        Ok(self.store.offers.get(id).map(|o| o.value().clone()))
    }
}

impl Update<ExchangeOffer, UpdateOfferDTO, String> for OfferRepository {
    /// Conditional status transition: only a pending offer can move, and only
    /// to a terminal status. Anything else fails with `FailedPrecondition`.
    #[instrument(skip(self, data), fields(offer_id = %id, status = ?data.status))]
    async fn update(&self, id: &String, data: &UpdateOfferDTO) -> Result<ExchangeOffer, StoreError> {
        self.store.ensure_online()?;
        let mut offer = self.store.offers.get_mut(id).ok_or(StoreError::NotFound)?;

        if offer.status.is_terminal() || !data.status.is_terminal() {
            warn!(current = ?offer.status, "Rejected offer status transition");
            return Err(StoreError::FailedPrecondition);
        }

        offer.status = data.status;
        debug!("Offer status updated");
        Ok(offer.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> CreateOfferDTO {
        CreateOfferDTO {
            post_id: "p-target".into(),
            offered_post_id: "p-offered".into(),
            offered_by_id: "bob".into(),
            post_owner_id: "alice".into(),
        }
    }

    #[tokio::test]
    async fn status_transition_is_one_way() {
        let repo = OfferRepository::new(Arc::new(DocumentStore::new()));
        let offer = repo.create(&dto()).await.unwrap();
        assert_eq!(offer.status, OfferStatus::Pending);

        let accepted = repo
            .update(&offer.offer_id, &UpdateOfferDTO { status: OfferStatus::Accepted })
            .await
            .unwrap();
        assert_eq!(accepted.status, OfferStatus::Accepted);

        for status in [OfferStatus::Declined, OfferStatus::Accepted, OfferStatus::Pending] {
            let err = repo
                .update(&offer.offer_id, &UpdateOfferDTO { status })
                .await
                .unwrap_err();
            assert_eq!(err, StoreError::FailedPrecondition);
        }
        let stored = repo.read(&offer.offer_id).await.unwrap().unwrap();
        assert_eq!(stored.status, OfferStatus::Accepted);
    }

    #[tokio::test]
    async fn pending_duplicate_is_detected() {
        let repo = OfferRepository::new(Arc::new(DocumentStore::new()));
        assert!(!repo.has_pending_offer("p-target", "p-offered", "bob").await.unwrap());
        repo.create(&dto()).await.unwrap();
        assert!(repo.has_pending_offer("p-target", "p-offered", "bob").await.unwrap());
        assert_eq!(repo.find_many_by_owner("alice").await.unwrap().len(), 1);
        assert_eq!(repo.find_many_by_offerer("bob").await.unwrap().len(), 1);
    }
}
