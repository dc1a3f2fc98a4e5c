//! Message services - Adapter di scrittura e lettura dei messaggi
//!
//! Ogni invio scrive il messaggio e poi aggiorna l'anteprima della conversazione.
//! Gli errori di scrittura risalgono al chiamante, che mostra un alert; nessun
//! retry automatico.

use crate::core::{AppError, AppState};
use crate::dtos::{CreateMessageDTO, MessageCursor, MessagePage, UpdateConversationDTO};
use crate::entities::{Conversation, Message, PLACEHOLDER_POST_IMAGE, SharedPost};
use crate::repositories::{Create, Read, Update};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

pub const MAX_TEXT_LEN: usize = 5000;
pub const IMAGE_PREVIEW: &str = "Image";
pub const SHARED_POST_PREVIEW: &str = "Shared a post";
pub const MISSING_POST_TITLE: &str = "Post unavailable";

/// Verifica che la conversazione esista e che il mittente ne faccia parte
async fn sender_conversation(
    state: &AppState,
    conversation_id: &str,
    sender_id: &str,
) -> Result<Conversation, AppError> {
    let conversation = state
        .conversation
        .read(&conversation_id.to_string())
        .await?
        .ok_or_else(|| AppError::not_found("Conversation not found"))?;

    if !conversation.has_participant(sender_id) {
        warn!(%sender_id, "Sender is not a participant of the conversation");
        return Err(AppError::forbidden(
            "You are not a participant of this conversation",
        ));
    }
    Ok(conversation)
}

/// Scrive il messaggio e poi l'anteprima sulla conversazione padre
async fn write_message(
    state: &AppState,
    dto: CreateMessageDTO,
    preview: &str,
) -> Result<Message, AppError> {
    dto.validate()?;
    sender_conversation(state, &dto.conversation_id, &dto.sender_id).await?;

    let message = state.msg.create(&dto).await?;
    state
        .conversation
        .update(
            &dto.conversation_id,
            &UpdateConversationDTO {
                preview: Some((preview.to_string(), dto.sender_id.clone())),
                ..Default::default()
            },
        )
        .await?;

    debug!(message_id = %message.message_id, "Message written and preview updated");
    Ok(message)
}

#[instrument(skip(state, text), fields(len = text.len()))]
pub async fn send_text(
    state: &AppState,
    conversation_id: &str,
    sender_id: &str,
    text: &str,
) -> Result<Message, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::bad_request("Message text cannot be empty"));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::bad_request(
            "Message text must be at most 5000 characters",
        ));
    }

    write_message(
        state,
        CreateMessageDTO::text(conversation_id, sender_id, text),
        text,
    )
    .await
}

/// Scrive subito il messaggio con il riferimento locale come immagine segnaposto
/// e un correlation id; l'upload vero avviene a parte, senza bloccare l'invio.
#[instrument(skip(state))]
pub async fn send_image(
    state: &AppState,
    conversation_id: &str,
    sender_id: &str,
    local_ref: &str,
) -> Result<Message, AppError> {
    if local_ref.trim().is_empty() {
        return Err(AppError::bad_request("No image selected"));
    }
    let correlation_id = Uuid::new_v4().to_string();

    let dto = CreateMessageDTO {
        image: Some(local_ref.to_string()),
        local_image_id: Some(correlation_id),
        ..CreateMessageDTO::text(conversation_id, sender_id, "")
    };
    let message = write_message(state, dto, IMAGE_PREVIEW).await?;
    info!(message_id = %message.message_id, "Image message staged");
    Ok(message)
}

/// Condivide un annuncio in chat come card. Un post inesistente non è un errore:
/// la card usa titolo e immagine segnaposto.
#[instrument(skip(state))]
pub async fn send_post_share(
    state: &AppState,
    conversation_id: &str,
    sender_id: &str,
    post_id: &str,
) -> Result<Message, AppError> {
    if post_id.trim().is_empty() {
        return Err(AppError::bad_request("Post id is required"));
    }
    let shared_post = match state.post.read(&post_id.to_string()).await? {
        Some(post) => SharedPost {
            post_id: post.post_id.clone(),
            title: post.title.clone(),
            image: post.cover_image().to_string(),
        },
        None => {
            debug!("Shared post not found, using placeholder card");
            SharedPost {
                post_id: post_id.to_string(),
                title: MISSING_POST_TITLE.to_string(),
                image: PLACEHOLDER_POST_IMAGE.to_string(),
            }
        }
    };

    let dto = CreateMessageDTO {
        shared_post: Some(shared_post),
        ..CreateMessageDTO::text(conversation_id, sender_id, "")
    };
    write_message(state, dto, SHARED_POST_PREVIEW).await
}

/// Pagina più recente (la stessa finestra coperta dalla sottoscrizione live)
#[instrument(skip(state))]
pub async fn load_latest(
    state: &AppState,
    conversation_id: &str,
    page_size: usize,
) -> Result<MessagePage, AppError> {
    let messages = state.msg.find_latest(conversation_id, page_size).await?;
    Ok(live_window_page(messages))
}

/// Costruisce la pagina per uno snapshot della finestra live.
///
/// Uno snapshot vuoto imposta `has_more = false`: "nessun messaggio" e "nessun
/// messaggio più vecchio" qui coincidono. Il comportamento è voluto e
/// documentato; uno snapshot non vuoto non tocca mai `has_more`, che resta
/// governato da `load_older`.
pub fn live_window_page(messages: Vec<Message>) -> MessagePage {
    MessagePage {
        cursor: messages.last().map(MessageCursor::from),
        has_more: !messages.is_empty(),
        messages,
    }
}

/// Lettura one-shot (non live) dei messaggi strettamente più vecchi di `cursor`
#[instrument(skip(state, cursor))]
pub async fn load_older(
    state: &AppState,
    conversation_id: &str,
    cursor: &MessageCursor,
    page_size: usize,
) -> Result<MessagePage, AppError> {
    let messages = state
        .msg
        .find_older(conversation_id, cursor, page_size)
        .await?;
    let has_more = messages.len() == page_size;
    debug!(count = messages.len(), has_more, "Older page loaded");
    Ok(MessagePage {
        cursor: Some(
            messages
                .last()
                .map(MessageCursor::from)
                .unwrap_or_else(|| cursor.clone()),
        ),
        has_more,
        messages,
    })
}

/// Anteprima e corpo della notifica per un messaggio appena inviato
pub fn notification_text(message: &Message) -> &str {
    if message.shared_post.is_some() {
        SHARED_POST_PREVIEW
    } else if message.text.is_empty() && message.image.is_some() {
        "Sent an image"
    } else {
        &message.text
    }
}
