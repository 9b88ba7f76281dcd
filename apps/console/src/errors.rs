use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Shown when a failure carries neither a server `detail` nor a transport message.
pub const GENERIC_ERROR_MESSAGE: &str = "Une erreur inattendue est survenue.";

/// Failure of a single backend call.
///
/// Feature modules only ever see this type. When the renewal protocol gives up,
/// the caller still receives the *original* failure, so every call site handles
/// errors along the same path.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Transport { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("{message}")]
    Status {
        status: StatusCode,
        message: String,
        /// Response body, parsed as JSON when possible.
        body: Option<Value>,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Coarse classification of a failure, used when logging the renewal protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network, timeout, or non-auth HTTP failure. Never triggers renewal.
    TransportError,
    /// 401 on a non-exempt path.
    AuthExpired,
    /// The renewal call failed, or there was no refresh token to send.
    RefreshFailed,
    /// An expiry failure arrived while another renewal was already in flight.
    ConcurrentRefreshConflict,
}

impl ApiError {
    pub fn from_status(status: StatusCode, body: Option<Value>) -> Self {
        ApiError::Status {
            status,
            message: format!("Request failed with status code {}", status.as_u16()),
            body,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Class of a failure as it comes back from the transport.
    pub fn class(&self) -> ErrorClass {
        if self.is_auth_failure() {
            ErrorClass::AuthExpired
        } else {
            ErrorClass::TransportError
        }
    }

    /// The server-supplied `detail` reason, if the body carries a non-blank one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                body: Some(body), ..
            } => body
                .get("detail")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|d| !d.is_empty()),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        describe(self)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_builder() {
            ApiError::InvalidRequest(e.to_string())
        } else {
            ApiError::Transport {
                message: e.to_string(),
            }
        }
    }
}

/// Converts a failure into a single display string.
///
/// Prefers the server's `detail`, then the failure's own message, then
/// [`GENERIC_ERROR_MESSAGE`].
pub fn describe(error: &ApiError) -> String {
    if let Some(detail) = error.detail() {
        return detail.to_string();
    }

    let message = error.to_string();
    if message.trim().is_empty() {
        GENERIC_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_prefers_detail() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            Some(json!({"detail": "Cette offre est déjà publiée."})),
        );
        assert_eq!(describe(&err), "Cette offre est déjà publiée.");
    }

    #[test]
    fn test_describe_falls_back_to_message_when_detail_blank() {
        let err = ApiError::from_status(StatusCode::FORBIDDEN, Some(json!({"detail": "   "})));
        assert_eq!(describe(&err), "Request failed with status code 403");
    }

    #[test]
    fn test_describe_ignores_non_string_detail() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            Some(json!({"detail": ["first", "second"]})),
        );
        assert_eq!(describe(&err), "Request failed with status code 400");
    }

    #[test]
    fn test_describe_uses_transport_message() {
        let err = ApiError::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(describe(&err), "connection refused");
    }

    #[test]
    fn test_describe_generic_fallback() {
        let err = ApiError::Transport {
            message: String::new(),
        };
        assert_eq!(describe(&err), GENERIC_ERROR_MESSAGE);
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_auth_failure_is_only_401() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, None).is_auth_failure());
        assert!(!ApiError::from_status(StatusCode::FORBIDDEN, None).is_auth_failure());
        assert!(!ApiError::Timeout.is_auth_failure());
    }

    #[test]
    fn test_class_of_raw_failures() {
        assert_eq!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, None).class(),
            ErrorClass::AuthExpired
        );
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, None).class(),
            ErrorClass::TransportError
        );
    }
}
