use thiserror::Error;

/// Authentication errors.
///
/// `Clone` so a single handshake outcome can be delivered to every caller
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Not signed in to Crowdin")]
    SignInRequired,

    #[error("Authentication rejected: {0}")]
    AuthenticationRejected(String),

    #[error("Authentication cancelled")]
    Cancelled,

    #[error("Failed to open authorization page: {0}")]
    LaunchFailed(String),

    #[error("Invalid OAuth configuration: {0}")]
    InvalidConfig(String),
}

impl AuthError {
    /// Whether starting a new sign-in may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AuthError::SignInRequired
            | AuthError::AuthenticationRejected(_)
            | AuthError::Cancelled => true,
            AuthError::LaunchFailed(_) | AuthError::InvalidConfig(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
