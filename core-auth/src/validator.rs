//! Token validation ahead of authenticated requests.

use crate::error::{AuthError, Result};
use crate::token_store::TokenStore;
use crate::types::AccessToken;
use std::sync::Arc;
use tracing::debug;

/// Hands out the token an authenticated request should use.
///
/// Validation is lazy: a token that is present (and not known to be expired)
/// is assumed valid and the server has the final word. No network access.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    token_store: Arc<TokenStore>,
}

impl TokenValidator {
    pub fn new(token_store: Arc<TokenStore>) -> Self {
        Self { token_store }
    }

    /// Return the current token or [`AuthError::SignInRequired`].
    pub async fn get_valid_token(&self) -> Result<AccessToken> {
        match self.token_store.load().await {
            Some(token) => Ok(token),
            None => {
                debug!("No usable Crowdin token, sign-in required");
                Err(AuthError::SignInRequired)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemorySecureStore;
    use crate::token_store::TOKEN_STORAGE_KEY;

    #[tokio::test]
    async fn test_sign_in_required_without_token() {
        let store = Arc::new(MemorySecureStore::default());
        let validator = TokenValidator::new(Arc::new(TokenStore::new(store)));

        assert_eq!(
            validator.get_valid_token().await,
            Err(AuthError::SignInRequired)
        );
    }

    #[tokio::test]
    async fn test_persisted_token_is_returned() {
        let store = Arc::new(MemorySecureStore::default());
        store.insert(TOKEN_STORAGE_KEY, b"from-keychain").await;
        let validator = TokenValidator::new(Arc::new(TokenStore::new(store)));

        let token = validator.get_valid_token().await.unwrap();
        assert_eq!(token.secret(), "from-keychain");
    }
}
