use barter_chat::dtos::SignUpDTO;
use barter_chat::services::{auth, conversation};
use barter_chat::{AppState, ChatSession, Config};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();

    // Inizializza la configurazione
    let config = Config::from_env()?;
    config.print_info();

    let state = Arc::new(AppState::from_config(config)?);

    if let Err(e) = run_demo(state).await {
        error!("Demo failed: {}", e);
        return Err(e.into());
    }
    Ok(())
}

/// Due utenti si registrano, si scrivono e chiudono la chat
async fn run_demo(state: Arc<AppState>) -> Result<(), barter_chat::AppError> {
    let mut users = Vec::new();
    for (email, name) in [("ada@example.com", "Ada"), ("bruno@example.com", "Bruno")] {
        let outcome = auth::sign_up(
            &state,
            SignUpDTO {
                email: email.to_string(),
                password: "swap-it-123".to_string(),
                name: name.to_string(),
            },
        )
        .await?;
        auth::verify_email(&state, &outcome.verification_token).await?;
        let session = auth::sign_in(&state, email, "swap-it-123").await?;
        users.push(barter_chat::core::authenticate(&state, &session.token).await?);
    }

    let ada = users.remove(0);
    let bruno = users.remove(0);

    let mut chat = ChatSession::open(state.clone(), ada.clone(), &bruno.user_id, None).await?;
    chat.send_text("Hello! Is the bike still available?").await?;
    chat.drain_events();
    for item in chat.render() {
        info!(message_id = item.message_id(), "Rendered chat item");
    }
    chat.leave().await?;

    for preview in conversation::inbox(&state, &bruno.user_id).await? {
        info!(
            from = %preview.counterpart_name,
            last_message = %preview.last_message,
            "Inbox entry"
        );
    }
    Ok(())
}
