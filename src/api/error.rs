use crate::util::UrlValidationError;
use thiserror::Error;

/// Shown when an authentication failure carries no server message.
pub const MSG_SESSION_EXPIRED: &str = "Session expired, please log in again";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// 401. The session has already been cleared when this is returned.
    #[error("Authentication required")]
    Unauthorized { message: Option<String> },

    /// Any other non-2xx status.
    #[error("HTTP error: status {status}")]
    Status { status: u16, message: Option<String> },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(#[from] UrlValidationError),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Text to put in front of the operator.
    ///
    /// A message from the server is shown verbatim; otherwise authentication
    /// failures get [`MSG_SESSION_EXPIRED`] and everything else the
    /// operation's `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        let server_message = match self {
            ApiError::Status { message, .. } | ApiError::Unauthorized { message } => message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty()),
            _ => None,
        };
        match (server_message, self) {
            (Some(m), _) => m.to_string(),
            (None, ApiError::Unauthorized { .. }) => MSG_SESSION_EXPIRED.to_string(),
            (None, _) => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_wins() {
        let err = ApiError::Status {
            status: 400,
            message: Some("Code is wrong".to_string()),
        };
        assert_eq!(err.user_message("Login failed"), "Code is wrong");
    }

    #[test]
    fn test_fallback_without_message() {
        let err = ApiError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message("Publish failed"), "Publish failed");

        let blank = ApiError::Status {
            status: 500,
            message: Some("  ".to_string()),
        };
        assert_eq!(blank.user_message("Publish failed"), "Publish failed");

        let decode = ApiError::Decode("bad json".to_string());
        assert_eq!(decode.user_message("Update failed"), "Update failed");
    }

    #[test]
    fn test_unauthorized_message() {
        let err = ApiError::Unauthorized { message: None };
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message("whatever"), MSG_SESSION_EXPIRED);
    }
}
