use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::{error, info};

use crate::models::{ErrorDetail, GenerateResponse, RequestDraft, ValidateResponse};

pub const VALIDATE_PATH: &str = "/api/validate";
pub const GENERATE_PATH: &str = "/api/generate-config";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("status={status} detail={detail:?}")]
    Status { status: StatusCode, detail: Option<String> },
}

impl UpstreamError {
    /// The message a user should see: the server's own detail when it sent
    /// one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            UpstreamError::Status { detail: Some(detail), .. } if !detail.trim().is_empty() => {
                detail.clone()
            }
            _ => fallback.to_string(),
        }
    }
}

/// The external decision service. Returns raw text; normalizing it is the
/// caller's job.
#[async_trait]
pub trait DecisionBackend: Send + Sync {
    /// Raw `validation` text, possibly fenced.
    async fn validate(&self, draft: &RequestDraft) -> Result<String, UpstreamError>;
    /// Manifest document text.
    async fn generate_config(&self, draft: &RequestDraft) -> Result<String, UpstreamError>;
}

pub struct DecisionClient {
    client: Client,
    base_url: String,
}

impl DecisionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client: Client::new(), base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, path: &str, draft: &RequestDraft) -> Result<Response, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        info!("🔗 POST {} for service '{}'", url, draft.service_name);

        let response = self.client.post(&url).json(draft).send().await?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Decision service error response: {}", body);
            let detail = serde_json::from_str::<ErrorDetail>(&body)
                .ok()
                .map(|d| d.detail)
                .filter(|d| !d.trim().is_empty());
            return Err(UpstreamError::Status { status, detail });
        }
        Ok(response)
    }
}

#[async_trait]
impl DecisionBackend for DecisionClient {
    async fn validate(&self, draft: &RequestDraft) -> Result<String, UpstreamError> {
        let parsed: ValidateResponse = self.post(VALIDATE_PATH, draft).await?.json().await?;
        info!("✅ Validation text received ({} chars)", parsed.validation.len());
        Ok(parsed.validation)
    }

    async fn generate_config(&self, draft: &RequestDraft) -> Result<String, UpstreamError> {
        let parsed: GenerateResponse = self.post(GENERATE_PATH, draft).await?.json().await?;
        info!("✅ Manifest received ({} chars)", parsed.yaml.len());
        Ok(parsed.yaml)
    }
}
