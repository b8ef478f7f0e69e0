use reqwest::StatusCode;

/// Errors raised by recall queries and taxonomy lookups.
#[derive(Debug, thiserror::Error)]
pub enum RecallError {
    /// The caller supplied no usable search criteria.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry answered with a non-success status.
    #[error("API request failed: HTTP {status} for url ({url}): {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    /// The response body was not the expected JSON envelope.
    #[error("failed to parse API JSON (url={url}): {message}")]
    Json { url: String, message: String },
}

// The registry reports failures as {"Count":0,"Message":"...","results":[]};
// some gateway errors use lowercase keys instead.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default, alias = "Message")]
    pub(crate) message: Option<String>,
    #[serde(default, alias = "Error")]
    pub(crate) error: Option<String>,
}

pub(crate) fn format_api_error(status: StatusCode, url: &str, body: &str) -> RecallError {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
    let server_message = parsed
        .as_ref()
        .and_then(|e| e.message.as_deref().or(e.error.as_deref()))
        .map(str::trim)
        .filter(|m| !m.is_empty());

    let message = match server_message {
        Some(m) => m.to_string(),
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
        None => body.trim().to_string(),
    };

    RecallError::Api {
        status: status.as_u16(),
        url: url.to_string(),
        message,
    }
}
