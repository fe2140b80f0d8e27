//! # Authentication Module
//!
//! Crowdin sign-in and token lifecycle.
//!
//! ## Overview
//!
//! - [`AccessToken`]: the bearer token with claims decoded best-effort
//! - [`TokenStore`]: cached token backed by the platform secure store
//! - [`TokenValidator`]: hands out the token for authenticated requests
//! - [`OAuthFlow`]: authorization URL, callback parsing, code exchange
//! - [`OAuthHandshake`]: single-flight sign-in driven by the redirect callback
//!
//! ## Features
//!
//! - OAuth 2.0 authorization-code flow over a custom-scheme redirect
//! - CSRF state verification
//! - Secure token storage via platform-specific secure stores
//! - Auth state event emission

pub mod error;
pub mod handshake;
pub mod oauth;
pub mod token_store;
pub mod types;
pub mod validator;

#[cfg(test)]
mod test_support;

pub use error::{AuthError, Result};
pub use handshake::{AuthOutcome, HandshakeState, OAuthHandshake};
pub use oauth::{CallbackParams, OAuthFlow};
pub use token_store::{TokenStore, TOKEN_STORAGE_KEY};
pub use types::AccessToken;
pub use validator::TokenValidator;
