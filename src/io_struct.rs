use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Provide clear, accurate, and helpful responses.";

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";

const MAX_TOKENS: u32 = 1500;
const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 1.0;
const FREQUENCY_PENALTY: f32 = 0.0;
const PRESENCE_PENALTY: f32 = 0.0;

/// Inbound body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub model: String,
}

impl ChatRequest {
    /// Extracts `message` and `model` from a raw request body.
    ///
    /// Returns `None` when the body is not a JSON object or `message` is
    /// missing, empty, or not a string. A `model` that is absent or not a
    /// string falls back to [`DEFAULT_MODEL`].
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(body).ok()?;
        let message = value.get("message")?.as_str()?;
        if message.is_empty() {
            return None;
        }
        let model = value
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MODEL);
        Some(ChatRequest {
            message: message.to_string(),
            model: model.to_string(),
        })
    }

    pub fn into_completion_request(self) -> CompletionRequest {
        CompletionRequest {
            model: self.model,
            messages: vec![
                ChatMessage::new(ROLE_SYSTEM, SYSTEM_PROMPT),
                ChatMessage::new(ROLE_USER, self.message),
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            frequency_penalty: FREQUENCY_PENALTY,
            presence_penalty: PRESENCE_PENALTY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        ChatMessage {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Body sent to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<Value>,
}

impl CompletionResponse {
    /// Text of the first choice, if there is a non-empty one.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
            .filter(|content| !content.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: Option<CompletionMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error payload returned by the completion service on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct UpstreamErrorPayload {
    pub error: Option<UpstreamErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct UpstreamErrorDetail {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub reply: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
