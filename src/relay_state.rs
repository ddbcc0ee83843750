use crate::completion::{CompletionService, OpenAIClient};
use crate::error::RelayError;
use crate::io_struct::{ChatReply, ChatRequest};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RuntimeMode {
    Development,
    #[default]
    Production,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub api_base: String,
    pub timeout: u64,
    pub mode: RuntimeMode,
    pub log_level: log::LevelFilter,
}

#[derive(Clone)]
pub struct RelayState {
    pub completion: Arc<dyn CompletionService>,
    pub api_key: Option<String>,
    pub mode: RuntimeMode,
}

impl RelayState {
    pub fn new(relay_config: RelayConfig) -> anyhow::Result<Self> {
        let client = OpenAIClient::new(relay_config.api_base, relay_config.timeout)?;
        Ok(Self::with_service(
            Arc::new(client),
            relay_config.api_key,
            relay_config.mode,
        ))
    }

    pub fn with_service(
        completion: Arc<dyn CompletionService>,
        api_key: Option<String>,
        mode: RuntimeMode,
    ) -> Self {
        // an empty key is as good as none
        let api_key = api_key.filter(|key| !key.is_empty());
        RelayState {
            completion,
            api_key,
            mode,
        }
    }

    pub fn is_development(&self) -> bool {
        self.mode == RuntimeMode::Development
    }

    /// Runs one chat submission against the completion service.
    pub async fn relay(&self, body: &[u8]) -> Result<ChatReply, RelayError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(RelayError::MissingApiKey);
        };
        let chat = ChatRequest::from_body(body).ok_or(RelayError::InvalidMessage)?;
        log::info!(
            "Processing OpenAI request with model: {}, message length: {}",
            chat.model,
            chat.message.chars().count()
        );

        let request = chat.into_completion_request();
        let response = self.completion.complete(api_key, &request).await?;
        let reply = response
            .first_content()
            .ok_or(RelayError::EmptyCompletion)?
            .to_string();
        Ok(ChatReply {
            success: true,
            reply,
            model: response.model,
            usage: response.usage,
        })
    }
}

impl std::fmt::Debug for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayState")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
