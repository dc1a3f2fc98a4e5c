//! Image Upload Pipeline - Upload asincrono delle immagini di chat
//!
//! L'upload è disaccoppiato dall'invio: il messaggio esiste già con il riferimento
//! locale, qui lo si sostituisce con l'URL ospitato quando l'host risponde.
//! Ogni upload è tracciato per message_id; nessuna coda condivisa, nessun ordine
//! garantito tra completamenti concorrenti, nessun retry automatico.

use crate::api::ImageHost;
use crate::core::AppError;
use crate::entities::Message;
use crate::repositories::MessageRepository;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadStatus {
    Uploading,
    Failed,
    Done,
}

/// Esito di un upload, consegnato alla sessione che l'ha avviato
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub message_id: String,
    pub status: UploadStatus,
    pub hosted_url: Option<String>,
}

#[derive(Debug, Clone)]
struct UploadJob {
    conversation_id: String,
    local_ref: String,
    correlation_id: String,
}

#[derive(Clone)]
pub struct UploadPipeline {
    host: Arc<dyn ImageHost>,
    messages: MessageRepository,
    jobs: Arc<DashMap<String, UploadJob>>,
    statuses: Arc<DashMap<String, UploadStatus>>,
    outcomes: UnboundedSender<UploadOutcome>,
}

impl UploadPipeline {
    /// Crea la pipeline e il receiver degli esiti.
    /// Se il receiver viene droppato gli upload proseguono comunque, l'esito va perso.
    pub fn new(
        host: Arc<dyn ImageHost>,
        messages: MessageRepository,
    ) -> (Self, UnboundedReceiver<UploadOutcome>) {
        let (tx, rx) = unbounded_channel();
        (
            Self {
                host,
                messages,
                jobs: Arc::new(DashMap::new()),
                statuses: Arc::new(DashMap::new()),
                outcomes: tx,
            },
            rx,
        )
    }

    pub fn status(&self, message_id: &str) -> Option<UploadStatus> {
        self.statuses.get(message_id).map(|s| *s)
    }

    /// Avvia l'upload dell'immagine locale di un messaggio appena inviato
    #[instrument(skip(self, message), fields(message_id = %message.message_id))]
    pub fn start(&self, message: &Message) -> Result<JoinHandle<()>, AppError> {
        let (Some(local_ref), Some(correlation_id)) = (&message.image, &message.local_image_id)
        else {
            return Err(AppError::bad_request("Message has no pending image"));
        };
        let job = UploadJob {
            conversation_id: message.conversation_id.clone(),
            local_ref: local_ref.clone(),
            correlation_id: correlation_id.clone(),
        };
        self.jobs.insert(message.message_id.clone(), job.clone());
        Ok(self.launch(message.message_id.clone(), job))
    }

    /// Retry manuale di un upload fallito, per lo stesso messaggio
    #[instrument(skip(self))]
    pub fn retry(&self, message_id: &str) -> Result<JoinHandle<()>, AppError> {
        match self.status(message_id) {
            Some(UploadStatus::Failed) => {}
            Some(UploadStatus::Uploading) => {
                return Err(AppError::conflict("Upload already in progress"));
            }
            Some(UploadStatus::Done) => {
                return Err(AppError::conflict("Image already uploaded"));
            }
            None => return Err(AppError::not_found("No upload for this message")),
        }
        let job = self
            .jobs
            .get(message_id)
            .map(|j| j.value().clone())
            .ok_or_else(|| AppError::not_found("No upload for this message"))?;
        info!("Retrying image upload");
        Ok(self.launch(message_id.to_string(), job))
    }

    fn launch(&self, message_id: String, job: UploadJob) -> JoinHandle<()> {
        self.statuses
            .insert(message_id.clone(), UploadStatus::Uploading);

        let host = self.host.clone();
        let messages = self.messages.clone();
        let jobs = self.jobs.clone();
        let statuses = self.statuses.clone();
        let outcomes = self.outcomes.clone();

        tokio::spawn(async move {
            let file_name = format!("chat_{}_{}.jpg", job.conversation_id, message_id);
            let result = match host.upload(&job.local_ref, &file_name).await {
                Ok(url) => messages
                    .patch_by_correlation_id(&job.conversation_id, &job.correlation_id, &url)
                    .await
                    .map(|_| url)
                    .map_err(AppError::from),
                Err(e) => Err(e),
            };

            let outcome = match result {
                Ok(url) => {
                    info!(%message_id, "Image upload completed");
                    jobs.remove(&message_id);
                    UploadOutcome {
                        message_id: message_id.clone(),
                        status: UploadStatus::Done,
                        hosted_url: Some(url),
                    }
                }
                Err(e) => {
                    error!(%message_id, "Error uploading image: {}", e);
                    UploadOutcome {
                        message_id: message_id.clone(),
                        status: UploadStatus::Failed,
                        hosted_url: None,
                    }
                }
            };
            statuses.insert(message_id, outcome.status);
            if outcomes.send(outcome).is_err() {
                warn!("Upload finished after its session closed");
            }
        })
    }
}
