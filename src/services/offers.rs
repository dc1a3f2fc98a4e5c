//! Offer services - Proposte di scambio tra annunci

use crate::core::{AppError, AppState};
use crate::dtos::{CreateOfferDTO, EnrichedOfferDTO, OfferDecision, UpdateOfferDTO};
use crate::entities::{ExchangeOffer, User};
use crate::repositories::{Create, Read, StoreError, Update};
use futures_util::future::try_join_all;
use tracing::{debug, info, instrument, warn};

/// Propone di scambiare `offered_post_id` (dell'utente) con `target_post_id`
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn propose(
    state: &AppState,
    current_user: &User,
    target_post_id: &str,
    offered_post_id: &str,
) -> Result<ExchangeOffer, AppError> {
    // 1. Recuperare i due post; entrambi devono esistere
    // 2. Il post offerto deve essere dell'utente, quello richiesto no
    // 3. Rifiutare una proposta identica ancora pending
    // 4. Creare la proposta (pending) e notificare il proprietario, best-effort
    let target = state
        .post
        .read(&target_post_id.to_string())
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    let offered = state
        .post
        .read(&offered_post_id.to_string())
        .await?
        .ok_or_else(|| AppError::not_found("Offered post not found"))?;

    if offered.owner_id != current_user.user_id {
        warn!("Offered post belongs to another user");
        return Err(AppError::forbidden("You can only offer your own posts"));
    }
    if target.owner_id == current_user.user_id {
        return Err(AppError::bad_request("You cannot make an offer on your own post"));
    }
    if state
        .offer
        .has_pending_offer(&target.post_id, &offered.post_id, &current_user.user_id)
        .await?
    {
        return Err(AppError::conflict("An identical offer is already pending"));
    }

    let offer = state
        .offer
        .create(&CreateOfferDTO {
            post_id: target.post_id.clone(),
            offered_post_id: offered.post_id.clone(),
            offered_by_id: current_user.user_id.clone(),
            post_owner_id: target.owner_id.clone(),
        })
        .await?;
    info!(offer_id = %offer.offer_id, "Exchange offer created");

    match state.user.read(&target.owner_id).await {
        Ok(owner) => {
            let token = owner.as_ref().and_then(|u| u.push_token.as_deref());
            state.notifier.notify(
                token,
                current_user.display_name(),
                &format!("Offer you a deal for your post {}", target.title),
            );
        }
        Err(e) => warn!("Could not load post owner for notification: {}", e),
    }
    Ok(offer)
}

async fn enrich(
    state: &AppState,
    offers: Vec<ExchangeOffer>,
) -> Result<Vec<EnrichedOfferDTO>, AppError> {
    let enriched = try_join_all(offers.into_iter().map(|offer| async move {
        let post = state.post.read(&offer.post_id).await?;
        let offered_post = state.post.read(&offer.offered_post_id).await?;
        Ok::<_, StoreError>(EnrichedOfferDTO {
            offer,
            post,
            offered_post,
        })
    }))
    .await?;
    Ok(enriched)
}

/// Proposte ricevute sui post dell'utente, dalla più recente
#[instrument(skip(state))]
pub async fn received(state: &AppState, owner_id: &str) -> Result<Vec<EnrichedOfferDTO>, AppError> {
    let offers = state.offer.find_many_by_owner(owner_id).await?;
    debug!(count = offers.len(), "Received offers");
    enrich(state, offers).await
}

/// Proposte inviate dall'utente, dalla più recente
#[instrument(skip(state))]
pub async fn sent(state: &AppState, offerer_id: &str) -> Result<Vec<EnrichedOfferDTO>, AppError> {
    let offers = state.offer.find_many_by_offerer(offerer_id).await?;
    debug!(count = offers.len(), "Sent offers");
    enrich(state, offers).await
}

/// Accetta o rifiuta una proposta. Solo il proprietario del post può rispondere,
/// e una sola volta: lo stato finale non si modifica più.
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn respond(
    state: &AppState,
    current_user: &User,
    offer_id: &str,
    decision: OfferDecision,
) -> Result<ExchangeOffer, AppError> {
    let offer_key = offer_id.to_string();
    let offer = state
        .offer
        .read(&offer_key)
        .await?
        .ok_or_else(|| AppError::not_found("Offer not found"))?;

    if offer.post_owner_id != current_user.user_id {
        warn!("User attempted to respond to an offer on someone else's post");
        return Err(AppError::forbidden("Only the post owner can respond to this offer"));
    }

    let updated = state
        .offer
        .update(
            &offer_key,
            &UpdateOfferDTO {
                status: decision.target_status(),
            },
        )
        .await
        .map_err(|e| match e {
            StoreError::FailedPrecondition => AppError::conflict("Offer is already processed")
                .with_details(format!("Offer is already {:?}", offer.status)),
            other => other.into(),
        })?;
    info!(status = ?updated.status, "Offer resolved");

    match state.user.read(&updated.offered_by_id).await {
        Ok(offerer) => {
            let token = offerer.as_ref().and_then(|u| u.push_token.as_deref());
            let past = decision.past_tense();
            let title = capitalize(past);
            state
                .notifier
                .notify(token, &title, &format!("Your offer has been {}", past));
        }
        Err(e) => warn!("Could not load offerer for notification: {}", e),
    }
    Ok(updated)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
