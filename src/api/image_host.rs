use super::{ensure_success, local_path};
use crate::core::AppError;
use crate::dtos::ImageUploadResponseDTO;
use async_trait::async_trait;
use reqwest::{Client, multipart};
use tracing::{debug, info, instrument};

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Carica l'immagine referenziata da `local_ref` e ritorna l'URL ospitato
    async fn upload(&self, local_ref: &str, file_name: &str) -> Result<String, AppError>;
}

pub struct HttpImageHost {
    client: Client,
    upload_url: String,
    upload_preset: String,
}

impl HttpImageHost {
    pub fn new(client: Client, upload_url: String, upload_preset: String) -> Self {
        Self {
            client,
            upload_url,
            upload_preset,
        }
    }
}

#[async_trait]
impl ImageHost for HttpImageHost {
    #[instrument(skip(self), fields(url = %self.upload_url))]
    async fn upload(&self, local_ref: &str, file_name: &str) -> Result<String, AppError> {
        let bytes = tokio::fs::read(local_path(local_ref)).await?;
        debug!(size = bytes.len(), "Local image read");

        let file_part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("image/jpeg")?;
        let form = multipart::Form::new()
            .part("file", file_part)
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response, "Image upload failed").await?;

        let body: ImageUploadResponseDTO = response.json().await?;
        let url = body
            .secure_url
            .ok_or_else(|| AppError::service_unavailable("Image host returned no URL"))?;
        info!(%url, "Image uploaded");
        Ok(url)
    }
}
