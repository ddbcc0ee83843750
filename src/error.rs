use crate::completion::CompletionError;
use crate::io_struct::ErrorBody;
use actix_web::http::StatusCode;
use thiserror::Error;

pub const METHOD_NOT_ALLOWED: &str = "Method not allowed. Use POST.";
pub const MISSING_API_KEY: &str = "Server configuration error: OpenAI API key missing";
pub const INVALID_MESSAGE: &str = "Message is required and must be a string";
pub const GENERIC_FAILURE: &str = "Something went wrong with the AI service";
pub const UPSTREAM_FAILURE: &str = "OpenAI API error";
pub const API_KEY_FAILURE: &str = "OpenAI API key error. Please check server configuration.";
pub const RATE_LIMITED: &str = "Rate limit exceeded. Please try again later.";
pub const NETWORK_FAILURE: &str = "Network timeout. Please try again.";

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("{}", METHOD_NOT_ALLOWED)]
    MethodNotAllowed,

    #[error("OpenAI API key is not configured")]
    MissingApiKey,

    #[error("{}", INVALID_MESSAGE)]
    InvalidMessage,

    #[error("No response received from OpenAI")]
    EmptyCompletion,

    #[error(transparent)]
    Upstream(#[from] CompletionError),
}

impl RelayError {
    /// Maps the error to the status and body sent back to the caller.
    ///
    /// `details` carries the raw error text and is only filled in when
    /// `development` is set.
    pub fn to_response_parts(&self, development: bool) -> (StatusCode, ErrorBody) {
        let (status, message) = match self {
            RelayError::MethodNotAllowed => {
                return (StatusCode::METHOD_NOT_ALLOWED, bare(METHOD_NOT_ALLOWED));
            }
            RelayError::MissingApiKey => {
                return (StatusCode::INTERNAL_SERVER_ERROR, bare(MISSING_API_KEY));
            }
            RelayError::InvalidMessage => {
                return (StatusCode::BAD_REQUEST, bare(INVALID_MESSAGE));
            }
            RelayError::EmptyCompletion => self.classify_text(),
            RelayError::Upstream(CompletionError::Api { status, message }) => {
                let status = StatusCode::from_u16(status.as_u16())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let message = message
                    .as_deref()
                    .filter(|m| !m.is_empty())
                    .unwrap_or(UPSTREAM_FAILURE)
                    .to_string();
                (status, message)
            }
            RelayError::Upstream(_) => self.classify_text(),
        };
        let details = development.then(|| self.to_string());
        let body = ErrorBody {
            success: Some(false),
            error: message,
            details,
        };
        (status, body)
    }

    // Best effort: unstructured failures are told apart by their wording.
    fn classify_text(&self) -> (StatusCode, String) {
        let text = self.to_string();
        let network = matches!(self, RelayError::Upstream(e) if e.is_network());
        let (status, message) = if text.contains("API key") {
            (StatusCode::INTERNAL_SERVER_ERROR, API_KEY_FAILURE)
        } else if text.contains("rate limit") {
            (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED)
        } else if network || text.contains("timeout") || text.contains("network") {
            (StatusCode::INTERNAL_SERVER_ERROR, NETWORK_FAILURE)
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE)
        };
        (status, message.to_string())
    }
}

fn bare(message: &str) -> ErrorBody {
    ErrorBody {
        success: None,
        error: message.to_string(),
        details: None,
    }
}
