//! Auth services - Registrazione, login, verifica email e reset password

use crate::core::auth::password_fingerprint;
use crate::core::{AppError, AppState, TokenPurpose, authenticate, decode_jwt, encode_jwt};
use crate::dtos::{CreateUserDTO, SignUpDTO, UpdateProfileDTO, UpdateUserDTO, UserDTO};
use crate::entities::User;
use crate::repositories::{Create, Read, StoreError, Update};
use crate::services::NotificationDispatcher;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Sessione autenticata restituita dal login
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: UserDTO,
}

/// Esito della registrazione: il token va recapitato via email
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: UserDTO,
    pub verification_token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn sign_up(state: &AppState, body: SignUpDTO) -> Result<SignUpOutcome, AppError> {
    // 1. Validare il DTO (formato email, lunghezza password e nome)
    // 2. Rifiutare email già registrate con CONFLICT
    // 3. Hashare la password e salvare l'utente (non ancora verificato)
    // 4. Emettere il token di verifica email
    body.validate()?;
    let email = normalize_email(&body.email);

    if state.user.find_by_email(&email).await?.is_some() {
        warn!("Sign up attempted with an email already in use");
        return Err(AppError::conflict("Email already in use"));
    }

    let password_hash = User::hash_password(&body.password, state.config.bcrypt_cost)?;

    let user = state
        .user
        .create(&CreateUserDTO {
            email,
            name: body.name.trim().to_string(),
            password: password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::AlreadyExists => AppError::conflict("Email already in use"),
            other => other.into(),
        })?;

    let verification_token =
        encode_jwt(&user, TokenPurpose::VerifyEmail, &state.config.jwt_secret)?;
    info!(user_id = %user.user_id, "User registered, verification pending");

    Ok(SignUpOutcome {
        user: UserDTO::from(user),
        verification_token,
    })
}

#[instrument(skip(state, token))]
pub async fn verify_email(state: &AppState, token: &str) -> Result<UserDTO, AppError> {
    let claims = decode_jwt(token, TokenPurpose::VerifyEmail, &state.config.jwt_secret)?.claims;

    let user = state
        .user
        .update(
            &claims.sub,
            &UpdateUserDTO {
                email_verified: Some(true),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::not_found("User not found"),
            other => other.into(),
        })?;

    info!(user_id = %user.user_id, "Email verified");
    Ok(UserDTO::from(user))
}

#[instrument(skip(state, password))]
pub async fn sign_in(state: &AppState, email: &str, password: &str) -> Result<Session, AppError> {
    // 1. Fail-fast su password vuota, prima di interrogare lo store
    // 2. Cercare l'utente per email; se manca o la password non corrisponde, UNAUTHORIZED
    // 3. Rifiutare gli account non verificati
    // 4. Generare il token di sessione (24 ore)
    if password.is_empty() {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let user = match state.user.find_by_email(&normalize_email(email)).await? {
        Some(user) => user,
        None => return Err(AppError::unauthorized("Invalid email or password")),
    };

    if !user.verify_password(password) {
        warn!(user_id = %user.user_id, "Wrong password");
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    if !user.email_verified {
        info!(user_id = %user.user_id, "Login refused, email not verified");
        return Err(AppError::forbidden(
            "Please verify your email before logging in",
        ));
    }

    let token = encode_jwt(&user, TokenPurpose::Session, &state.config.jwt_secret)?;
    info!(user_id = %user.user_id, "User signed in");
    Ok(Session {
        token,
        user: UserDTO::from(user),
    })
}

pub async fn current_user(state: &AppState, token: &str) -> Result<UserDTO, AppError> {
    Ok(UserDTO::from(authenticate(state, token).await?))
}

/// Emette un token di reset se l'email è registrata.
/// `Ok(None)` per email sconosciute: il chiamante mostra lo stesso messaggio in entrambi i casi.
#[instrument(skip(state))]
pub async fn request_password_reset(
    state: &AppState,
    email: &str,
) -> Result<Option<String>, AppError> {
    let Some(user) = state.user.find_by_email(&normalize_email(email)).await? else {
        debug!("Password reset requested for unknown email");
        return Ok(None);
    };
    let token = encode_jwt(&user, TokenPurpose::PasswordReset, &state.config.jwt_secret)?;
    info!(user_id = %user.user_id, "Password reset token issued");
    Ok(Some(token))
}

#[instrument(skip(state, token, new_password))]
pub async fn reset_password(
    state: &AppState,
    token: &str,
    new_password: &str,
) -> Result<(), AppError> {
    if !(6..=128).contains(&new_password.chars().count()) {
        return Err(AppError::bad_request(
            "Password must be between 6 and 128 characters",
        ));
    }

    let claims = decode_jwt(token, TokenPurpose::PasswordReset, &state.config.jwt_secret)?.claims;
    let user = state
        .user
        .read(&claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    // il token vale solo finché l'hash è quello su cui è stato emesso
    if claims.fingerprint.as_deref() != Some(password_fingerprint(&user).as_str()) {
        warn!(user_id = %user.user_id, "Password reset token already used");
        return Err(AppError::unauthorized("Reset link is no longer valid"));
    }

    let password = User::hash_password(new_password, state.config.bcrypt_cost)?;
    state
        .user
        .update(
            &user.user_id,
            &UpdateUserDTO {
                password: Some(password),
                ..Default::default()
            },
        )
        .await?;
    info!(user_id = %user.user_id, "Password reset");
    Ok(())
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_profile(
    state: &AppState,
    current_user: &User,
    body: UpdateProfileDTO,
) -> Result<UserDTO, AppError> {
    body.validate()?;
    if let Some(token) = &body.push_token {
        if !NotificationDispatcher::is_valid_token(token) {
            return Err(AppError::bad_request("Invalid push token"));
        }
    }

    let user = state
        .user
        .update(
            &current_user.user_id,
            &UpdateUserDTO {
                name: body.name.map(|n| n.trim().to_string()),
                profile_picture: body.profile_picture,
                push_token: body.push_token,
                ..Default::default()
            },
        )
        .await?;
    debug!("Profile updated");
    Ok(UserDTO::from(user))
}
