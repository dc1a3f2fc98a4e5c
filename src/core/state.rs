//! Application State - Stato condiviso dell'applicazione
//!
//! Contiene tutti i repository, la configurazione e i client dei servizi esterni.
//! Ogni schermata riceve un `Arc<AppState>`; lo stato per-schermata (sottoscrizioni,
//! lista messaggi, upload in corso) vive invece nella `ChatSession`.

use crate::api::{
    AuthenticityService, HttpAuthenticityService, HttpImageHost, HttpModelGenerator,
    HttpPushRelay, ImageHost, ModelGenerator, PushRelay, build_http_client,
};
use crate::core::{AppError, Config};
use crate::repositories::{
    ConversationRepository, DocumentStore, MessageRepository, OfferRepository, PostRepository,
    UserRepository,
};
use crate::services::NotificationDispatcher;
use std::sync::Arc;
use tracing::info;

/// Client dei servizi esterni, iniettabili (i test passano implementazioni finte)
#[derive(Clone)]
pub struct ExternalClients {
    pub image_host: Arc<dyn ImageHost>,
    pub push_relay: Arc<dyn PushRelay>,
    pub authenticity: Arc<dyn AuthenticityService>,
    pub models: Arc<dyn ModelGenerator>,
}

impl ExternalClients {
    /// Costruisce i client HTTP reali a partire dalla configurazione,
    /// condividendo un solo `reqwest::Client`
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = build_http_client(config.http_timeout())?;
        Ok(Self {
            image_host: Arc::new(HttpImageHost::new(
                client.clone(),
                config.image_host_url.clone(),
                config.image_upload_preset.clone(),
            )),
            push_relay: Arc::new(HttpPushRelay::new(
                client.clone(),
                config.push_relay_url.clone(),
            )),
            authenticity: Arc::new(HttpAuthenticityService::new(
                client.clone(),
                config.authenticity_url.clone(),
            )),
            models: Arc::new(HttpModelGenerator::new(
                client,
                config.model_generator_url.clone(),
            )),
        })
    }
}

/// Stato condiviso tra tutte le schermate
pub struct AppState {
    /// Document store condiviso da tutti i repository
    pub store: Arc<DocumentStore>,

    /// Repository per la gestione degli utenti
    pub user: UserRepository,

    /// Repository per la gestione degli annunci
    pub post: PostRepository,

    /// Repository per la gestione delle conversazioni
    pub conversation: ConversationRepository,

    /// Repository per la gestione dei messaggi
    pub msg: MessageRepository,

    /// Repository per la gestione delle proposte di scambio
    pub offer: OfferRepository,

    pub config: Config,

    /// Invio best-effort delle notifiche push
    pub notifier: NotificationDispatcher,

    pub image_host: Arc<dyn ImageHost>,
    pub authenticity: Arc<dyn AuthenticityService>,
    pub models: Arc<dyn ModelGenerator>,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// sullo store fornito.
    ///
    /// # Arguments
    /// * `store` - Document store condiviso
    /// * `config` - Configurazione caricata
    /// * `clients` - Client dei servizi esterni
    pub fn new(store: Arc<DocumentStore>, config: Config, clients: ExternalClients) -> Self {
        Self {
            user: UserRepository::new(store.clone()),
            post: PostRepository::new(store.clone()),
            conversation: ConversationRepository::new(store.clone()),
            msg: MessageRepository::new(store.clone()),
            offer: OfferRepository::new(store.clone()),
            store,
            config,
            notifier: NotificationDispatcher::new(clients.push_relay),
            image_host: clients.image_host,
            authenticity: clients.authenticity,
            models: clients.models,
        }
    }

    /// Stato con uno store vuoto e i client HTTP reali
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let clients = ExternalClients::from_config(&config)?;
        info!("External clients initialized");
        Ok(Self::new(Arc::new(DocumentStore::new()), config, clients))
    }
}
