// Client-side error type

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with the failure envelope
    #[error("{message}")]
    Api {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Session storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Corrupt session data: {0}")]
    CorruptSession(#[from] serde_json::Error),

    #[error("No active session")]
    NoSession,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Network(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Connection-level failure, the server was never reached
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Network(e) if e.status().is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_expose_status() {
        let err = ClientError::Api {
            status: StatusCode::UNAUTHORIZED,
            code: Some("AUTHENTICATION_ERROR".to_string()),
            message: "Invalid credentials".to_string(),
        };
        assert!(err.is_unauthorized());
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn storage_errors_have_no_status() {
        let err = ClientError::NoSession;
        assert_eq!(err.status(), None);
        assert!(!err.is_unauthorized());
    }
}
