use super::{ensure_success, local_path};
use crate::core::AppError;
use crate::dtos::ModelResponseDTO;
use async_trait::async_trait;
use reqwest::{Client, multipart};
use tracing::{info, instrument};

#[async_trait]
pub trait ModelGenerator: Send + Sync {
    /// Genera il modello 3D a partire da una foto locale; ritorna l'URL del modello
    async fn generate(&self, local_ref: &str, post_id: &str) -> Result<String, AppError>;
}

pub struct HttpModelGenerator {
    client: Client,
    url: String,
}

impl HttpModelGenerator {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl ModelGenerator for HttpModelGenerator {
    #[instrument(skip(self))]
    async fn generate(&self, local_ref: &str, post_id: &str) -> Result<String, AppError> {
        let bytes = tokio::fs::read(local_path(local_ref)).await?;
        let part = multipart::Part::bytes(bytes)
            .file_name(format!("model_image_{}.jpg", post_id))
            .mime_str("image/jpeg")?;
        let form = multipart::Form::new()
            .part("image", part)
            .text("postId", post_id.to_string());

        let response = self.client.post(&self.url).multipart(form).send().await?;
        let response = ensure_success(response, "Failed to generate 3D model").await?;

        let body: ModelResponseDTO = response.json().await?;
        let model_url = body
            .model_url
            .ok_or_else(|| AppError::service_unavailable("3D model was not generated"))?;
        info!(%model_url, "3D model generated");
        Ok(model_url)
    }
}
