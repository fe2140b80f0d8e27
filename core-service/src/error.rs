use core_auth::AuthError;
use provider_crowdin::CrowdinError;
use thiserror::Error;

/// Errors surfaced to the host application.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No usable token; call `authenticate()` first
    #[error("Not signed in to Crowdin")]
    SignInRequired,

    /// State mismatch, denied consent or a failed code exchange
    #[error("Crowdin sign-in failed: {0}")]
    AuthenticationRejected(String),

    /// The sign-in was cancelled by `sign_out()`, a newer teardown or shutdown
    #[error("Crowdin sign-in was cancelled")]
    AuthenticationCancelled,

    /// The server rejected the token; it has been forgotten
    #[error("Crowdin authorization expired during {operation}, please sign in again")]
    RemoteAuthorizationExpired { operation: String },

    #[error("Crowdin request failed during {operation}{}: {message}", status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
    RemoteRequestFailed {
        operation: String,
        status: Option<u16>,
        message: String,
    },

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected Crowdin response for {operation}: {message}")]
    Parse { operation: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the host should prompt the user to sign in again.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            ClientError::SignInRequired | ClientError::RemoteAuthorizationExpired { .. }
        )
    }
}

impl From<AuthError> for ClientError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::SignInRequired => ClientError::SignInRequired,
            AuthError::AuthenticationRejected(reason) => ClientError::AuthenticationRejected(reason),
            AuthError::Cancelled => ClientError::AuthenticationCancelled,
            AuthError::LaunchFailed(message) => ClientError::AuthenticationRejected(format!(
                "failed to open authorization page: {}",
                message
            )),
            AuthError::InvalidConfig(message) => ClientError::Config(message),
        }
    }
}

impl From<CrowdinError> for ClientError {
    fn from(error: CrowdinError) -> Self {
        match error {
            CrowdinError::SignInRequired => ClientError::SignInRequired,
            CrowdinError::RemoteAuthorizationExpired { operation } => {
                ClientError::RemoteAuthorizationExpired { operation }
            }
            CrowdinError::RemoteRequestFailed {
                operation,
                status,
                message,
            } => ClientError::RemoteRequestFailed {
                operation,
                status,
                message,
            },
            CrowdinError::ParseError { operation, message } => {
                ClientError::Parse { operation, message }
            }
            CrowdinError::Io(e) => ClientError::Io(e),
        }
    }
}

impl From<core_runtime::Error> for ClientError {
    fn from(error: core_runtime::Error) -> Self {
        ClientError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
