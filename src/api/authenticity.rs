use super::ensure_success;
use crate::core::AppError;
use crate::dtos::AuthenticityResponseDTO;
use async_trait::async_trait;
use reqwest::{Client, header, multipart};
use tracing::{debug, instrument};

#[async_trait]
pub trait AuthenticityService: Send + Sync {
    /// Scarica l'immagine e chiede al classificatore la probabilità che sia generata
    async fn analyze(&self, image_url: &str) -> Result<AuthenticityResponseDTO, AppError>;
}

pub struct HttpAuthenticityService {
    client: Client,
    url: String,
}

impl HttpAuthenticityService {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl AuthenticityService for HttpAuthenticityService {
    #[instrument(skip(self))]
    async fn analyze(&self, image_url: &str) -> Result<AuthenticityResponseDTO, AppError> {
        let image = self.client.get(image_url).send().await?;
        let image = ensure_success(image, "Failed to fetch image").await?;
        let mime = image
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = image.bytes().await?;
        debug!(size = bytes.len(), %mime, "Image fetched for analysis");

        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name("image.jpg")
            .mime_str(&mime)?;
        let form = multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(&self.url)
            .header(header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response, "Failed to analyze image").await?;
        Ok(response.json().await?)
    }
}
