//! Error types for the gateway core

use thiserror::Error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{service} returned HTTP {status}: {message}")]
    Upstream {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("A response is already streaming")]
    StreamBusy,

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Whether the failure happened before the upstream service accepted the call.
    pub fn is_unreachable(&self) -> bool {
        match self {
            GatewayError::Http(err) => err.is_connect() || err.is_timeout() || err.is_request(),
            _ => false,
        }
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_is_not_unreachable() {
        let err = GatewayError::Upstream {
            service: "Ollama".to_string(),
            status: 500,
            message: "model crashed".to_string(),
        };
        assert!(!err.is_unreachable());
        assert!(!GatewayError::Stream("reset".to_string()).is_unreachable());
        assert_eq!(err.to_string(), "Ollama returned HTTP 500: model crashed");
    }
}
