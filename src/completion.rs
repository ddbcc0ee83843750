use crate::io_struct::{CompletionRequest, CompletionResponse, UpstreamErrorPayload};
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Error, Debug)]
pub enum CompletionError {
    /// The service answered with a non-2xx status.
    #[error("{} {}", .status.as_u16(), api_message(.message))]
    Api {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Response parsing failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// Failure without a structured HTTP response. `status` is informational only.
    #[error("{message}")]
    Service {
        status: Option<u16>,
        message: String,
    },
}

fn api_message(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("status code (no body)")
}

impl CompletionError {
    pub fn is_network(&self) -> bool {
        match self {
            CompletionError::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: reqwest::Client,
    api_base: String,
}

impl OpenAIClient {
    pub fn new(api_base: impl Into<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self::with_client(client, api_base))
    }

    pub fn with_client(client: reqwest::Client, api_base: impl Into<String>) -> Self {
        OpenAIClient {
            client,
            api_base: api_base.into(),
        }
    }

    pub fn api_path(&self, api_path: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        if api_path.starts_with('/') {
            format!("{}{}", base, api_path)
        } else {
            format!("{}/{}", base, api_path)
        }
    }
}

#[async_trait]
impl CompletionService for OpenAIClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let resp = self
            .client
            .post(self.api_path("/chat/completions"))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<UpstreamErrorPayload>(&body)
                .ok()
                .and_then(|payload| payload.error)
                .and_then(|detail| detail.message);
            return Err(CompletionError::Api { status, message });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}
