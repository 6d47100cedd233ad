//! Error handling for the GreenLoop transport

use serde_json::Value;
use thiserror::Error;

/// Message shown when a failure carries nothing more specific.
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred";

pub type Result<T> = std::result::Result<T, ApiError>;

/// Every way a GreenLoop API call can fail.
///
/// Transport failures, HTTP failures and business rejections stay distinct
/// so callers can pick a retry policy; [`ApiError::user_message`] collapses
/// them into the single string the UI shows.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No response reached us (DNS, refused connection, timeout, TLS).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response that did not carry a business payload.
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// The backend answered with `success: false`.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        errors: Option<Value>,
    },

    /// The body did not follow the envelope contract.
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The request could not be built from the given parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn rejected<T: Into<String>>(status: u16, message: T) -> Self {
        ApiError::Rejected {
            status,
            message: message.into(),
            errors: None,
        }
    }

    /// HTTP status of the failed exchange, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } | ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether repeating the same request could succeed.
    ///
    /// Business rejections and malformed bodies are terminal; transport
    /// failures, throttling and server errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            ApiError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// The human-readable message for this failure. Never empty.
    pub fn user_message(&self) -> String {
        let message = match self {
            // A failed status says more than the generic fallback
            ApiError::Rejected { status, message, .. }
                if message.trim().is_empty() && !(200..300).contains(status) =>
            {
                status_message(*status)
            }
            ApiError::Rejected { message, .. } => message.trim().to_string(),
            ApiError::Http { status, message } if message.trim().is_empty() => status_message(*status),
            ApiError::Http { message, .. } => message.trim().to_string(),
            other => other.to_string(),
        };

        if message.is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        }
    }
}

fn status_message(status: u16) -> String {
    format!("Request failed with status code {}", status)
}

/// Normalize any API failure into the string shown next to a form.
pub fn handle_api_error(error: &ApiError) -> String {
    error.user_message()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_is_passed_through() {
        let err = ApiError::rejected(401, "Invalid credentials");
        assert_eq!(handle_api_error(&err), "Invalid credentials");
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(err.is_unauthorized());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_blank_messages_fall_back() {
        let err = ApiError::rejected(200, "   ");
        assert_eq!(handle_api_error(&err), FALLBACK_MESSAGE);

        let err = ApiError::Http {
            status: 502,
            message: String::new(),
        };
        assert_eq!(handle_api_error(&err), "Request failed with status code 502");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_blank_rejection_uses_the_status_code() {
        let err = ApiError::rejected(401, "");
        assert_eq!(handle_api_error(&err), "Request failed with status code 401");

        let err = ApiError::rejected(200, "");
        assert_eq!(handle_api_error(&err), FALLBACK_MESSAGE);
    }

    #[test]
    fn test_every_variant_has_a_message() {
        let errors = vec![
            ApiError::Malformed(String::new()),
            ApiError::InvalidRequest("nested query values".into()),
            ApiError::Cancelled,
            ApiError::Url(url::ParseError::EmptyHost),
            ApiError::Json(serde_json::from_str::<Value>("{").unwrap_err()),
            ApiError::Http {
                status: 404,
                message: "Item not found".into(),
            },
        ];

        for err in &errors {
            assert!(!handle_api_error(err).is_empty(), "{:?}", err);
        }
        assert_eq!(handle_api_error(&errors[5]), "Item not found");
    }
}
