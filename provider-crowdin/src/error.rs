//! Error types for the Crowdin provider

use core_auth::AuthError;
use thiserror::Error;

/// Crowdin API errors
#[derive(Error, Debug)]
pub enum CrowdinError {
    /// No token available; the user must sign in first
    #[error("Not signed in to Crowdin")]
    SignInRequired,

    /// The server rejected the token; it has been forgotten
    #[error("Crowdin authorization expired during {operation}, please sign in again")]
    RemoteAuthorizationExpired { operation: String },

    /// The request failed remotely (with a status) or never got a response
    #[error("Crowdin request failed during {operation}{}: {message}", status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
    RemoteRequestFailed {
        operation: String,
        status: Option<u16>,
        message: String,
    },

    /// Failed to parse API response
    #[error("Failed to parse Crowdin response for {operation}: {message}")]
    ParseError { operation: String, message: String },

    /// Local file could not be read or written
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrowdinError {
    pub(crate) fn request_failed(
        operation: &str,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        CrowdinError::RemoteRequestFailed {
            operation: operation.to_string(),
            status,
            message: message.into(),
        }
    }

    pub(crate) fn parse(operation: &str, message: impl std::fmt::Display) -> Self {
        CrowdinError::ParseError {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether the caller has to sign in before retrying.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            CrowdinError::SignInRequired | CrowdinError::RemoteAuthorizationExpired { .. }
        )
    }

    /// HTTP status reported by the server, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CrowdinError::RemoteRequestFailed { status, .. } => *status,
            CrowdinError::RemoteAuthorizationExpired { .. } => Some(401),
            _ => None,
        }
    }
}

impl From<AuthError> for CrowdinError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::SignInRequired => CrowdinError::SignInRequired,
            other => CrowdinError::RemoteRequestFailed {
                operation: "authentication".to_string(),
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// Result type for Crowdin operations
pub type Result<T> = std::result::Result<T, CrowdinError>;
