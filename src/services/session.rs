//! Chat Session - Controller della schermata di chat
//!
//! Compone adapter dei messaggi, presenza, upload e notifiche in un'unica
//! sessione posseduta dalla schermata. La sessione non scrive mai direttamente
//! nel proprio view model in risposta ad un'azione: lo stato arriva sempre dagli
//! snapshot delle sottoscrizioni live (o dagli esiti degli upload).

use crate::core::{AppError, AppState};
use crate::dtos::{MessageCursor, MessagePage, UserDTO};
use crate::entities::{
    Conversation, DEFAULT_DISPLAY_NAME, DEFAULT_PROFILE_IMAGE, Message, SharedPost, User,
};
use crate::live::{ConversationSubscription, MessageWindowSubscription};
use crate::repositories::{Read, StoreError};
use crate::services::presence::{ReadReceiptSweeper, apply_read_receipt, is_typing};
use crate::services::upload::{UploadOutcome, UploadPipeline, UploadStatus};
use crate::services::{conversation, messages, presence};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, instrument, warn};

pub const NOTIFICATION_TITLE: &str = "New Message";

/// Elemento renderizzabile della lista messaggi
#[derive(Debug, Clone, PartialEq)]
pub enum ChatItem {
    /// Bolla di testo e/o immagine
    Bubble {
        message: Message,
        mine: bool,
        upload: Option<UploadStatus>,
    },
    /// Card di un annuncio condiviso: al tap si naviga al dettaglio del post
    SharedPostCard {
        message_id: String,
        post: SharedPost,
        mine: bool,
        read: bool,
        created_at: DateTime<Utc>,
    },
}

impl ChatItem {
    pub fn message_id(&self) -> &str {
        match self {
            ChatItem::Bubble { message, .. } => &message.message_id,
            ChatItem::SharedPostCard { message_id, .. } => message_id,
        }
    }

    /// Post da aprire al tap, solo per le card
    pub fn post_target(&self) -> Option<&str> {
        match self {
            ChatItem::SharedPostCard { post, .. } => Some(&post.post_id),
            ChatItem::Bubble { .. } => None,
        }
    }
}

/// Stato della schermata, modificato solo dalle funzioni di transizione
#[derive(Debug, Clone)]
pub struct ChatViewModel {
    pub conversation_id: String,
    pub current_user_id: String,
    pub counterpart: UserDTO,
    /// dal più recente al più vecchio
    pub messages: Vec<Message>,
    pub has_more: bool,
    pub loading_older: bool,
    pub counterpart_typing: bool,
    /// la conversazione è stata cancellata mentre la schermata era aperta
    pub conversation_gone: bool,
    counterpart_read_until: Option<DateTime<Utc>>,
}

impl ChatViewModel {
    pub fn new(conversation_id: &str, current_user_id: &str, counterpart: UserDTO) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            current_user_id: current_user_id.to_string(),
            counterpart,
            messages: Vec::new(),
            has_more: true,
            loading_older: false,
            counterpart_typing: false,
            conversation_gone: false,
            counterpart_read_until: None,
        }
    }

    /// Cursore per la prossima pagina: il messaggio più vecchio in memoria
    pub fn cursor(&self) -> Option<MessageCursor> {
        self.messages.last().map(MessageCursor::from)
    }

    /// Sostituisce la finestra live mantenendo le pagine più vecchie già caricate.
    ///
    /// I messaggi locali che ricadono nell'intervallo coperto dallo snapshot
    /// vengono rimpiazzati (o rimossi se spariti); quelli più vecchi restano.
    pub fn apply_live_snapshot(&mut self, snapshot: Vec<Message>) {
        let page = messages::live_window_page(snapshot);
        let Some(window_start) = page.cursor else {
            // finestra vuota: la conversazione non ha messaggi
            self.messages.clear();
            self.has_more = page.has_more;
            return;
        };

        let older: Vec<Message> = self
            .messages
            .drain(..)
            .filter(|m| MessageCursor::from(m) < window_start)
            .collect();
        self.messages = page.messages;
        self.messages.extend(older);
        self.reapply_read_receipt();
    }

    /// Accoda una pagina più vecchia, scartando id già presenti
    pub fn apply_older_page(&mut self, page: MessagePage) {
        let known: HashSet<String> = self.messages.iter().map(|m| m.message_id.clone()).collect();
        self.messages.extend(
            page.messages
                .into_iter()
                .filter(|m| !known.contains(&m.message_id)),
        );
        self.has_more = page.has_more;
        self.loading_older = false;
        self.reapply_read_receipt();
    }

    /// Rivaluta typing e conferme di lettura dell'interlocutore
    pub fn apply_conversation(
        &mut self,
        conversation: Option<&Conversation>,
        now: DateTime<Utc>,
        typing_window: Duration,
    ) {
        let Some(conversation) = conversation else {
            self.conversation_gone = true;
            self.counterpart_typing = false;
            return;
        };
        let counterpart_id = self.counterpart.user_id.clone();
        self.counterpart_typing = is_typing(conversation, &counterpart_id, now, typing_window);

        if let Some(read_until) = conversation.last_read.get(&counterpart_id) {
            self.counterpart_read_until = Some(*read_until);
            self.reapply_read_receipt();
        }
    }

    /// Riflette localmente un upload concluso, in attesa dello snapshot live
    pub fn apply_upload_outcome(&mut self, outcome: &UploadOutcome) {
        let (UploadStatus::Done, Some(url)) = (outcome.status, &outcome.hosted_url) else {
            return;
        };
        if let Some(message) = self
            .messages
            .iter_mut()
            .find(|m| m.message_id == outcome.message_id)
        {
            message.image = Some(url.clone());
            message.local_image_id = None;
        }
    }

    fn reapply_read_receipt(&mut self) {
        if let Some(read_until) = self.counterpart_read_until {
            apply_read_receipt(&mut self.messages, &self.current_user_id, read_until);
        }
    }
}

/// Cosa è cambiato dopo un evento della sessione
#[derive(Debug)]
pub enum SessionEvent {
    Messages,
    Conversation,
    Upload(UploadOutcome),
    /// Lettura fallita: la schermata mostra un alert
    Failed(AppError),
    /// Tutti i feed sono chiusi
    Closed,
}

enum Incoming {
    Messages(Result<Vec<Message>, StoreError>),
    Conversation(Result<Option<Conversation>, StoreError>),
    Upload(UploadOutcome),
    Closed,
}

pub struct ChatSession {
    state: Arc<AppState>,
    current_user: User,
    counterpart: Option<User>,
    view: ChatViewModel,
    created_here: bool,
    sent_any: bool,
    messages_feed: MessageWindowSubscription,
    conversation_feed: ConversationSubscription,
    uploads: UploadPipeline,
    upload_outcomes: UnboundedReceiver<UploadOutcome>,
    sweeper: ReadReceiptSweeper,
}

impl ChatSession {
    /// Apre la chat con `other_user_id`, creando la conversazione se necessario.
    ///
    /// # Arguments
    /// * `share_post_id` - se la chat è aperta da un annuncio, il post viene
    ///   condiviso una sola volta all'apertura
    #[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
    pub async fn open(
        state: Arc<AppState>,
        current_user: User,
        other_user_id: &str,
        share_post_id: Option<&str>,
    ) -> Result<Self, AppError> {
        // 1. Risolvere (o creare) la conversazione per la coppia
        // 2. Caricare una sola volta il profilo dell'interlocutore, con i fallback
        // 3. Sottoscriversi ai feed PRIMA di leggere gli snapshot iniziali
        // 4. Avviare lo sweep delle conferme di lettura
        // 5. Condividere il post di partenza, se presente
        let (conversation, created_here) =
            conversation::find_or_create(&state, &current_user.user_id, other_user_id).await?;
        let conversation_id = conversation.conversation_id.clone();

        let counterpart = match state.user.read(&other_user_id.to_string()).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Error fetching user data: {}", e);
                None
            }
        };
        let counterpart_dto = counterpart
            .clone()
            .map(UserDTO::from)
            .unwrap_or_else(|| UserDTO {
                user_id: other_user_id.to_string(),
                name: DEFAULT_DISPLAY_NAME.to_string(),
                profile_picture: DEFAULT_PROFILE_IMAGE.to_string(),
            });

        let feeds = state.store.feeds();
        let messages_feed = MessageWindowSubscription::new(
            state.msg.clone(),
            feeds.subscribe(&conversation_id),
            &conversation_id,
            state.config.message_page_size,
        );
        let conversation_feed = ConversationSubscription::new(
            state.conversation.clone(),
            feeds.subscribe(&conversation_id),
            &conversation_id,
        );

        let mut view =
            ChatViewModel::new(&conversation_id, &current_user.user_id, counterpart_dto);
        view.apply_live_snapshot(messages_feed.snapshot().await?);
        view.apply_conversation(
            Some(&conversation),
            Utc::now(),
            state.config.typing_window(),
        );

        let sweeper = ReadReceiptSweeper::spawn(
            state.msg.clone(),
            conversation_id.clone(),
            current_user.user_id.clone(),
            other_user_id.to_string(),
            state.config.read_sweep_interval(),
        );
        let (uploads, upload_outcomes) =
            UploadPipeline::new(state.image_host.clone(), state.msg.clone());

        let mut session = Self {
            state,
            current_user,
            counterpart,
            view,
            created_here,
            sent_any: false,
            messages_feed,
            conversation_feed,
            uploads,
            upload_outcomes,
            sweeper,
        };

        if let Some(post_id) = share_post_id {
            if let Err(e) = session.share_post(post_id).await {
                // la conversazione creata in questa apertura non deve restare vuota
                warn!("Initial post share failed: {}", e);
                if let Err(cleanup) = session.leave().await {
                    warn!("Error discarding empty conversation: {}", cleanup);
                }
                return Err(e);
            }
        }
        info!(%conversation_id, created_here, "Chat session opened");
        Ok(session)
    }

    pub fn view(&self) -> &ChatViewModel {
        &self.view
    }

    pub fn conversation_id(&self) -> &str {
        &self.view.conversation_id
    }

    pub fn created_here(&self) -> bool {
        self.created_here
    }

    pub fn upload_status(&self, message_id: &str) -> Option<UploadStatus> {
        self.uploads.status(message_id)
    }

    /// Attende il prossimo evento da feed o upload e lo applica al view model
    pub async fn next_event(&mut self) -> SessionEvent {
        let incoming = tokio::select! {
            Some(snapshot) = self.messages_feed.changed() => Incoming::Messages(snapshot),
            Some(snapshot) = self.conversation_feed.changed() => Incoming::Conversation(snapshot),
            Some(outcome) = self.upload_outcomes.recv() => Incoming::Upload(outcome),
            else => Incoming::Closed,
        };
        self.apply(incoming)
    }

    /// Applica tutti gli eventi già disponibili senza attendere
    ///
    /// # Returns
    /// Numero di eventi applicati
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.next_event().now_or_never() {
            if matches!(event, SessionEvent::Closed) {
                break;
            }
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, incoming: Incoming) -> SessionEvent {
        match incoming {
            Incoming::Messages(Ok(snapshot)) => {
                debug!(count = snapshot.len(), "Message snapshot received");
                self.view.apply_live_snapshot(snapshot);
                SessionEvent::Messages
            }
            Incoming::Conversation(Ok(conversation)) => {
                self.view.apply_conversation(
                    conversation.as_ref(),
                    Utc::now(),
                    self.state.config.typing_window(),
                );
                SessionEvent::Conversation
            }
            Incoming::Messages(Err(e)) | Incoming::Conversation(Err(e)) => {
                warn!("Error fetching messages: {}", e);
                SessionEvent::Failed(AppError::from(e))
            }
            Incoming::Upload(outcome) => {
                self.view.apply_upload_outcome(&outcome);
                SessionEvent::Upload(outcome)
            }
            Incoming::Closed => SessionEvent::Closed,
        }
    }

    fn notify_counterpart(&self, message: &Message) {
        let token = self
            .counterpart
            .as_ref()
            .and_then(|u| u.push_token.as_deref());
        let body = format!(
            "{}: {}",
            self.current_user.display_name(),
            messages::notification_text(message)
        );
        self.state.notifier.notify(token, NOTIFICATION_TITLE, &body);
    }

    #[instrument(skip(self, text), fields(conversation_id = %self.view.conversation_id))]
    pub async fn send_text(&mut self, text: &str) -> Result<Message, AppError> {
        let message = messages::send_text(
            &self.state,
            &self.view.conversation_id,
            &self.current_user.user_id,
            text,
        )
        .await?;
        self.sent_any = true;
        self.notify_counterpart(&message);
        Ok(message)
    }

    /// Invia l'immagine locale e avvia l'upload in background
    #[instrument(skip(self), fields(conversation_id = %self.view.conversation_id))]
    pub async fn send_image(&mut self, local_ref: &str) -> Result<Message, AppError> {
        let message = messages::send_image(
            &self.state,
            &self.view.conversation_id,
            &self.current_user.user_id,
            local_ref,
        )
        .await?;
        self.sent_any = true;
        self.uploads.start(&message)?;
        self.notify_counterpart(&message);
        Ok(message)
    }

    /// Retry manuale (long-press) di un upload fallito
    pub fn retry_upload(&mut self, message_id: &str) -> Result<(), AppError> {
        self.uploads.retry(message_id)?;
        Ok(())
    }

    pub async fn share_post(&mut self, post_id: &str) -> Result<Message, AppError> {
        let message = messages::send_post_share(
            &self.state,
            &self.view.conversation_id,
            &self.current_user.user_id,
            post_id,
        )
        .await?;
        self.sent_any = true;
        self.notify_counterpart(&message);
        Ok(message)
    }

    /// Carica la pagina precedente. No-op se non ci sono altri messaggi,
    /// se un caricamento è già in corso o se non c'è ancora un cursore.
    ///
    /// # Returns
    /// Numero di messaggi aggiunti alla lista
    #[instrument(skip(self), fields(conversation_id = %self.view.conversation_id))]
    pub async fn load_older(&mut self) -> Result<usize, AppError> {
        let Some(cursor) = self.view.cursor() else {
            return Ok(0);
        };
        if !self.view.has_more || self.view.loading_older {
            return Ok(0);
        }

        self.view.loading_older = true;
        let before = self.view.messages.len();
        match messages::load_older(
            &self.state,
            &self.view.conversation_id,
            &cursor,
            self.state.config.message_page_size,
        )
        .await
        {
            Ok(page) => {
                self.view.apply_older_page(page);
                Ok(self.view.messages.len() - before)
            }
            Err(e) => {
                self.view.loading_older = false;
                Err(e)
            }
        }
    }

    /// Callback dell'input: best-effort, gli errori vengono solo loggati
    pub async fn set_typing(&self, typing: bool) {
        presence::set_typing(
            &self.state,
            &self.view.conversation_id,
            &self.current_user.user_id,
            typing,
        )
        .await;
    }

    /// Modello renderizzabile, dal più recente al più vecchio
    pub fn render(&self) -> Vec<ChatItem> {
        self.view
            .messages
            .iter()
            .map(|message| {
                let mine = message.sender_id == self.current_user.user_id;
                match &message.shared_post {
                    Some(post) => ChatItem::SharedPostCard {
                        message_id: message.message_id.clone(),
                        post: post.clone(),
                        mine,
                        read: message.read,
                        created_at: message.created_at,
                    },
                    None => {
                        let upload = if message.is_pending_upload() {
                            // un upload non tracciato da questa sessione resta "in caricamento"
                            Some(
                                self.uploads
                                    .status(&message.message_id)
                                    .unwrap_or(UploadStatus::Uploading),
                            )
                        } else {
                            message.image.as_ref().map(|_| UploadStatus::Done)
                        };
                        ChatItem::Bubble {
                            message: message.clone(),
                            mine,
                            upload,
                        }
                    }
                }
            })
            .collect()
    }

    /// Uscita dalla schermata: ferma lo sweep, chiude le sottoscrizioni e
    /// cancella la conversazione se è stata creata per questa visita e non è
    /// stato inviato nulla.
    ///
    /// # Returns
    /// true se la conversazione vuota è stata cancellata
    #[instrument(skip(self), fields(conversation_id = %self.view.conversation_id))]
    pub async fn leave(self) -> Result<bool, AppError> {
        self.sweeper.stop();
        let discarded = if self.created_here && !self.sent_any {
            conversation::discard_if_empty(&self.state, &self.view.conversation_id).await?
        } else {
            false
        };
        info!(discarded, "Chat session closed");
        Ok(discarded)
    }
}
