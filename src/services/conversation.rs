//! Conversation services - Risoluzione della conversazione e lista chat

use crate::core::{AppError, AppState};
use crate::dtos::{ConversationPreview, CreateConversationDTO};
use crate::entities::{Conversation, DEFAULT_DISPLAY_NAME, DEFAULT_PROFILE_IMAGE};
use crate::repositories::{Delete, ReadMany};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Anteprima mostrata per conversazioni senza messaggi
pub const EMPTY_CONVERSATION_PREVIEW: &str = "No message yet";

/// Risolve (o crea) la conversazione tra i due utenti con un point lookup sulla
/// chiave di coppia.
///
/// # Returns
/// `(conversation, created)`: `created` è true solo se il documento è stato
/// creato da questa chiamata
#[instrument(skip(state))]
pub async fn find_or_create(
    state: &AppState,
    current_user_id: &str,
    other_user_id: &str,
) -> Result<(Conversation, bool), AppError> {
    if current_user_id == other_user_id {
        warn!("Attempted to open a conversation with self");
        return Err(AppError::bad_request(
            "Cannot start a conversation with yourself",
        ));
    }

    let (conversation, created) = state
        .conversation
        .create_or_get(&CreateConversationDTO {
            participants: [current_user_id.to_string(), other_user_id.to_string()],
        })
        .await?;

    if created {
        info!(conversation_id = %conversation.conversation_id, "New conversation opened");
    } else {
        debug!(conversation_id = %conversation.conversation_id, "Existing conversation resolved");
    }
    Ok((conversation, created))
}

/// Lista delle conversazioni dell'utente, dalla più recente.
/// Le conversazioni mai usate finiscono in fondo.
#[instrument(skip(state))]
pub async fn inbox(
    state: &AppState,
    current_user_id: &str,
) -> Result<Vec<ConversationPreview>, AppError> {
    // 1. Recuperare tutte le conversazioni in cui compare l'utente
    // 2. Recuperare con una sola lettura i profili degli interlocutori
    // 3. Costruire le anteprime con i fallback di visualizzazione
    // 4. Ordinare per timestamp dell'ultimo messaggio, decrescente
    let conversations = state
        .conversation
        .find_many_by_participant(current_user_id)
        .await?;

    let counterpart_ids: Vec<String> = conversations
        .iter()
        .filter_map(|c| c.counterpart_of(current_user_id))
        .map(str::to_string)
        .collect();
    // i profili mancanti vengono saltati e prendono il fallback
    let counterparts: HashMap<String, _> = state
        .user
        .read_many(&counterpart_ids)
        .await?
        .into_iter()
        .map(|user| (user.user_id.clone(), user))
        .collect();

    let mut previews: Vec<ConversationPreview> = conversations
        .into_iter()
        .map(|conversation| {
            let counterpart_id = conversation
                .counterpart_of(current_user_id)
                .unwrap_or_default()
                .to_string();
            let (counterpart_name, counterpart_picture) = match counterparts.get(&counterpart_id) {
                Some(user) => (
                    user.display_name().to_string(),
                    user.display_picture().to_string(),
                ),
                None => (
                    DEFAULT_DISPLAY_NAME.to_string(),
                    DEFAULT_PROFILE_IMAGE.to_string(),
                ),
            };
            let last_message = if conversation.last_message.is_empty() {
                EMPTY_CONVERSATION_PREVIEW.to_string()
            } else {
                conversation.last_message
            };
            ConversationPreview {
                conversation_id: conversation.conversation_id,
                counterpart_id,
                counterpart_name,
                counterpart_picture,
                last_message,
                last_message_at: conversation.last_message_at,
            }
        })
        .collect();

    previews.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    debug!(count = previews.len(), "Inbox built");
    Ok(previews)
}

/// Azione compensativa per l'assenza di una scrittura transazionale
/// "crea conversazione + primo messaggio": cancella la conversazione se è vuota.
///
/// # Returns
/// true se la conversazione è stata cancellata
#[instrument(skip(state))]
pub async fn discard_if_empty(state: &AppState, conversation_id: &str) -> Result<bool, AppError> {
    if state.msg.count(conversation_id).await? > 0 {
        debug!("Conversation has messages, keeping it");
        return Ok(false);
    }
    state.conversation.delete(&conversation_id.to_string()).await?;
    info!("Empty conversation discarded");
    Ok(true)
}
