#![allow(dead_code)]

use async_trait::async_trait;
use barter_chat::api::{AuthenticityService, ImageHost, ModelGenerator, PushRelay};
use barter_chat::dtos::{
    AuthenticityResponseDTO, AuthenticityScore, CreatePostDTO, PushNotificationDTO, SignUpDTO,
    UpdateProfileDTO,
};
use barter_chat::entities::{GeoPoint, PostKind, User};
use barter_chat::repositories::Read;
use barter_chat::services::{ChatSession, SessionEvent, auth};
use barter_chat::{AppError, AppState, Config, DocumentStore, ExternalClients};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const TEST_PASSWORD: &str = "swap-it-123";

// ============================================================
// Servizi esterni finti
// ============================================================

/// Image host in memoria; `set_failing(true)` simula la rete assente
#[derive(Default)]
pub struct FakeImageHost {
    failing: AtomicBool,
    uploads: Mutex<Vec<String>>,
}

impl FakeImageHost {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(&self, _local_ref: &str, file_name: &str) -> Result<String, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::service_unavailable("Image upload failed"));
        }
        self.uploads.lock().unwrap().push(file_name.to_string());
        Ok(format!("https://cdn.test/{}", file_name))
    }
}

#[derive(Default)]
pub struct RecordingRelay {
    sent: Mutex<Vec<PushNotificationDTO>>,
}

impl RecordingRelay {
    pub fn sent(&self) -> Vec<PushNotificationDTO> {
        self.sent.lock().unwrap().clone()
    }

    /// Attende che arrivino almeno `count` notifiche (gli invii sono fire-and-forget)
    pub async fn wait_for(&self, count: usize) -> Vec<PushNotificationDTO> {
        let deadline = Instant::now() + Duration::from_secs(3);
        loop {
            let sent = self.sent();
            if sent.len() >= count || Instant::now() >= deadline {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl PushRelay for RecordingRelay {
    async fn send(&self, notification: &PushNotificationDTO) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct FakeAuthenticity;

#[async_trait]
impl AuthenticityService for FakeAuthenticity {
    async fn analyze(&self, image_url: &str) -> Result<AuthenticityResponseDTO, AppError> {
        Ok(AuthenticityResponseDTO {
            filename: image_url.rsplit('/').next().unwrap_or_default().to_string(),
            result: AuthenticityScore { percentage: 12.5 },
        })
    }
}

#[derive(Default)]
pub struct FakeModelGenerator {
    failing: AtomicBool,
}

impl FakeModelGenerator {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModelGenerator for FakeModelGenerator {
    async fn generate(&self, _local_ref: &str, post_id: &str) -> Result<String, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::service_unavailable("3D model was not generated"));
        }
        Ok(format!("https://models.test/{}.glb", post_id))
    }
}

// ============================================================
// Stato di test
// ============================================================

pub struct TestEnv {
    pub state: Arc<AppState>,
    pub images: Arc<FakeImageHost>,
    pub relay: Arc<RecordingRelay>,
    pub models: Arc<FakeModelGenerator>,
}

/// Configurazione con tempi brevi e bcrypt al costo minimo
pub fn test_config() -> Config {
    Config {
        jwt_secret: "ilmiobellissimosegretochevaassolutamentecambiato".to_string(),
        bcrypt_cost: 4,
        typing_window_ms: 2_000,
        read_sweep_interval_ms: 50,
        app_env: "test".to_string(),
        ..Config::default()
    }
}

/// Crea un AppState su uno store vuoto con tutti i servizi esterni finti
pub fn create_test_env() -> TestEnv {
    let images = Arc::new(FakeImageHost::default());
    let relay = Arc::new(RecordingRelay::default());
    let models = Arc::new(FakeModelGenerator::default());
    let clients = ExternalClients {
        image_host: images.clone(),
        push_relay: relay.clone(),
        authenticity: Arc::new(FakeAuthenticity),
        models: models.clone(),
    };
    let state = Arc::new(AppState::new(
        Arc::new(DocumentStore::new()),
        test_config(),
        clients,
    ));
    TestEnv {
        state,
        images,
        relay,
        models,
    }
}

/// Registra e verifica un utente, ritornando il documento salvato
pub async fn create_verified_user(state: &AppState, name: &str) -> User {
    let email = format!("{}@example.com", name.to_lowercase());
    let outcome = auth::sign_up(
        state,
        SignUpDTO {
            email,
            password: TEST_PASSWORD.to_string(),
            name: name.to_string(),
        },
    )
    .await
    .expect("sign up should succeed");
    auth::verify_email(state, &outcome.verification_token)
        .await
        .expect("verification should succeed");
    state
        .user
        .read(&outcome.user.user_id)
        .await
        .unwrap()
        .expect("user should exist")
}

/// Come `create_verified_user`, con un push token registrato
pub async fn create_reachable_user(state: &AppState, name: &str) -> User {
    let user = create_verified_user(state, name).await;
    auth::update_profile(
        state,
        &user,
        UpdateProfileDTO {
            push_token: Some(format!("ExponentPushToken[{}]", name.to_lowercase())),
            ..Default::default()
        },
    )
    .await
    .expect("profile update should succeed");
    state.user.read(&user.user_id).await.unwrap().unwrap()
}

pub fn post_dto(title: &str, category: &str, exchange_for: &[&str]) -> CreatePostDTO {
    CreatePostDTO {
        owner_id: String::new(),
        kind: PostKind::Item,
        title: title.to_string(),
        description: format!("{} in good condition", title),
        category: category.to_string(),
        images: vec![format!("https://img.test/{}.jpg", title.replace(' ', "_"))],
        location: None,
        address: "Via Roma 1, Torino".to_string(),
        exchange_options: exchange_for.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn post_dto_at(title: &str, category: &str, location: GeoPoint) -> CreatePostDTO {
    CreatePostDTO {
        location: Some(location),
        ..post_dto(title, category, &["books"])
    }
}

// ============================================================
// Attesa sugli eventi della sessione
// ============================================================

/// Consuma eventi della sessione finché `done` non diventa vero (max 3 secondi)
pub async fn wait_until<F>(session: &mut ChatSession, mut done: F)
where
    F: FnMut(&ChatSession) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(3);
    while !done(session) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, session.next_event()).await {
            Ok(SessionEvent::Closed) => panic!("session feeds closed before condition was met"),
            Ok(_) => {}
            Err(_) => panic!("condition not reached within timeout"),
        }
    }
}
