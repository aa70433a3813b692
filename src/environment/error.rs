use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HTTP_UNAUTHORIZED: u16 = 401;

pub const CONNECTION_ERROR: &str = "There appears to be a problem with your internet connection.";
pub const INVALID_RESPONSE: &str = "Received invalid response from the server.";

/// Error returned by every remote call.
///
/// A missing `status_code` means the request never got a response
/// (transport failure). Everything else carries the status the server
/// reported and, when the server tagged it, a `server_error_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}: {}", .url.as_deref().unwrap_or_default())]
pub struct ClientError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_error_id: Option<String>,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_server_error_id(mut self, id: impl Into<String>) -> Self {
        self.server_error_id = Some(id.into());
        self
    }

    /// The request never reached the server or the connection dropped
    pub fn connection(url: impl Into<String>) -> Self {
        Self::new(CONNECTION_ERROR).with_url(url)
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status_code.is_none() && self.message == CONNECTION_ERROR
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code == Some(HTTP_UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_url() {
        let error = ClientError::new("Not found").with_url("http://chat.local/api/v4/posts/x");
        assert_eq!(
            error.to_string(),
            "Not found: http://chat.local/api/v4/posts/x"
        );
    }

    #[test]
    fn serializes_only_present_fields() {
        let error = ClientError::new("boom").with_status(500);
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"message": "boom", "status_code": 500})
        );
    }

    #[test]
    fn transport_failure_has_no_status() {
        let error = ClientError::connection("http://chat.local/api/v4/users/me");
        assert!(error.is_transport_failure());
        assert!(!error.clone().with_status(502).is_transport_failure());
        assert!(!error.is_unauthorized());
    }
}
