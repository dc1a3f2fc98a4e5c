//! API Module - Client HTTP verso i servizi esterni
//!
//! Ogni servizio è esposto come trait asincrono, così il resto del crate dipende
//! solo dal contratto e i test possono iniettare implementazioni finte.
//! - `image_host`: upload multipart delle immagini, ritorna l'URL ospitato
//! - `push_relay`: relay delle notifiche push
//! - `authenticity`: classificatore di immagini generate artificialmente
//! - `model_generator`: conversione 2D -> 3D delle foto degli annunci

pub mod authenticity;
pub mod image_host;
pub mod model_generator;
pub mod push_relay;

pub use authenticity::{AuthenticityService, HttpAuthenticityService};
pub use image_host::{HttpImageHost, ImageHost};
pub use model_generator::{HttpModelGenerator, ModelGenerator};
pub use push_relay::{HttpPushRelay, PushRelay};

use crate::core::AppError;
use reqwest::{Client, Response};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Client HTTP condiviso da tutti i servizi.
/// Senza timeout una richiesta bloccata resta in attesa finché lo stack di rete non la chiude.
pub fn build_http_client(timeout: Option<Duration>) -> Result<Client, AppError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(AppError::from)
}

/// Converte un riferimento locale (`file://...` o path) in un path del filesystem
pub(crate) fn local_path(local_ref: &str) -> PathBuf {
    PathBuf::from(local_ref.strip_prefix("file://").unwrap_or(local_ref))
}

/// Controlla lo status prima di provare a leggere il body come JSON
pub(crate) async fn ensure_success(
    response: Response,
    message: &'static str,
) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(%status, %body, "Remote service returned an error");
    Err(AppError::service_unavailable(message).with_details(format!("{}: {}", status, body)))
}
