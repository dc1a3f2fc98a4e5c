use crate::core::{AppError, AppState};
use crate::entities::User;
use crate::repositories::Read;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

/// Uso del token: una sessione non vale come link di verifica e viceversa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Session,
    VerifyEmail,
    PasswordReset,
}

impl TokenPurpose {
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenPurpose::Session | TokenPurpose::VerifyEmail => Duration::hours(24),
            TokenPurpose::PasswordReset => Duration::hours(1),
        }
    }
}

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub sub: String,
    pub email: String,
    pub purpose: TokenPurpose,
    /// impronta dell'hash password: un reset lo cambia e invalida i token di reset precedenti
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Ultimi caratteri dell'hash bcrypt (il salt cambia ad ogni hash)
pub(crate) fn password_fingerprint(user: &User) -> String {
    let len = user.password.len();
    user.password[len.saturating_sub(8)..].to_string()
}

#[instrument(skip(user, secret), fields(user_id = %user.user_id))]
pub fn encode_jwt(user: &User, purpose: TokenPurpose, secret: &str) -> Result<String, AppError> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let exp: usize = (now + purpose.lifetime()).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        sub: user.user_id.clone(),
        email: user.email.clone(),
        purpose,
        fingerprint: (purpose == TokenPurpose::PasswordReset).then(|| password_fingerprint(user)),
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map(|token| {
        debug!("JWT token encoded successfully");
        token
    })
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        AppError::internal("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(
    jwt_token: &str,
    expected: TokenPurpose,
    secret: &str,
) -> Result<TokenData<Claims>, AppError> {
    debug!("Decoding JWT token");
    let data = decode::<Claims>(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    if data.claims.purpose != expected {
        warn!(found = ?data.claims.purpose, ?expected, "Token used for the wrong purpose");
        return Err(AppError::unauthorized("Invalid or expired session"));
    }
    Ok(data)
}

/// Risolve il token di sessione nell'utente corrente
#[instrument(skip(state, token))]
pub async fn authenticate(state: &AppState, token: &str) -> Result<User, AppError> {
    let token_data = decode_jwt(token, TokenPurpose::Session, &state.config.jwt_secret)?;

    match state.user.read(&token_data.claims.sub).await? {
        Some(user) => {
            debug!(user_id = %user.user_id, "User authenticated");
            Ok(user)
        }
        None => {
            warn!("User not found for session: {}", token_data.claims.sub);
            Err(AppError::unauthorized("You are not an authorized user"))
        }
    }
}

/// Precondizione delle azioni sensibili (chat, like, proposte):
/// senza una sessione valida l'utente viene invitato a fare login.
pub async fn require_user(state: &AppState, token: Option<&str>) -> Result<User, AppError> {
    let Some(token) = token else {
        info!("Action requires login");
        return Err(AppError::unauthorized("Please log in"));
    };
    authenticate(state, token)
        .await
        .map_err(|e| AppError::unauthorized("Please log in").with_details(e.to_string()))
}
