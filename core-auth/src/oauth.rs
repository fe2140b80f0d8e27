//! OAuth 2.0 Authorization-Code Flow for Crowdin
//!
//! Stateless building blocks of the sign-in handshake:
//! - CSRF `state` generation
//! - Authorization URL construction
//! - Recognising and parsing the custom-scheme redirect callback
//! - Exchanging the authorization code for an access token
//!
//! Sequencing (one attempt at a time, state verification, storing the
//! token) lives in [`crate::handshake`].
//!
//! Codes, states, secrets and tokens are never logged.
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::OAuthFlow;
//! use std::sync::Arc;
//! # use bridge_traits::http::HttpClient;
//! # use core_runtime::config::OAuthSettings;
//! # fn example(settings: OAuthSettings, http_client: Arc<dyn HttpClient>) -> core_auth::Result<()> {
//! let flow = OAuthFlow::new(settings, http_client);
//! let state = OAuthFlow::generate_state();
//! let auth_url = flow.build_auth_url(&state)?;
//! // Open auth_url in the browser, wait for the redirect...
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::AccessToken;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::config::OAuthSettings;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const STATE_BYTES: usize = 16;
const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameters carried by the redirect callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// `error` reported by the authorization server (e.g. `access_denied`).
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret: Option<&'a str>,
    redirect_uri: &'a str,
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Crowdin OAuth client.
#[derive(Clone)]
pub struct OAuthFlow {
    settings: OAuthSettings,
    http_client: Arc<dyn HttpClient>,
    timeout: Duration,
}

impl OAuthFlow {
    pub fn new(settings: OAuthSettings, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            settings,
            http_client,
            timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn settings(&self) -> &OAuthSettings {
        &self.settings
    }

    /// Random CSRF nonce: 16 bytes, URL-safe base64 without padding.
    pub fn generate_state() -> String {
        let mut bytes = [0u8; STATE_BYTES];
        rand::thread_rng().fill(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Authorization page URL for the given state.
    #[instrument(skip(self, state))]
    pub fn build_auth_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&self.settings.authorize_url).map_err(|e| {
            AuthError::InvalidConfig(format!(
                "Invalid authorization URL '{}': {}",
                self.settings.authorize_url, e
            ))
        })?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", &self.settings.redirect_uri)
            .append_pair("scope", &self.settings.scope)
            .append_pair("state", state);

        Ok(url.to_string())
    }

    /// Whether `uri` is addressed to our redirect URI, whatever its query.
    ///
    /// Scheme and host compare case-insensitively; the path must match
    /// exactly except for a missing trailing slash.
    pub fn is_callback(&self, uri: &str) -> bool {
        let (Ok(uri), Ok(redirect)) = (
            Url::parse(uri.trim()),
            Url::parse(&self.settings.redirect_uri),
        ) else {
            return false;
        };

        let same_host = match (uri.host_str(), redirect.host_str()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };

        uri.scheme().eq_ignore_ascii_case(redirect.scheme())
            && same_host
            && uri.port() == redirect.port()
            && without_trailing_slash(uri.path()) == without_trailing_slash(redirect.path())
    }

    /// Extract `code`, `state` and `error` from a callback URI.
    pub fn parse_callback(&self, uri: &str) -> Result<CallbackParams> {
        let url = Url::parse(uri).map_err(|e| {
            AuthError::AuthenticationRejected(format!("malformed callback URI: {}", e))
        })?;

        let mut params = CallbackParams::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                "error_description" => params.error_description = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(params)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// Any non-2xx answer, a transport failure or a response without
    /// `access_token` is reported as [`AuthError::AuthenticationRejected`].
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken> {
        let body = TokenRequest {
            grant_type: "authorization_code",
            client_id: &self.settings.client_id,
            client_secret: self.settings.client_secret.as_deref(),
            redirect_uri: &self.settings.redirect_uri,
            code,
        };

        let request = HttpRequest::new(HttpMethod::Post, self.settings.token_url.clone())
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .map_err(|e| {
                AuthError::AuthenticationRejected(format!("failed to encode token request: {}", e))
            })?;

        debug!("Exchanging authorization code");

        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(error = %e, "Token request failed");
            AuthError::AuthenticationRejected(format!("token request failed: {}", e))
        })?;

        if !response.is_success() {
            let reason = token_error_message(&response);
            warn!(status = response.status, reason = %reason, "Token exchange rejected");
            return Err(AuthError::AuthenticationRejected(reason));
        }

        let token_response: TokenResponse = response.json().map_err(|e| {
            warn!(error = %e, "Unreadable token response");
            AuthError::AuthenticationRejected(format!("unreadable token response: {}", e))
        })?;

        if token_response.access_token.trim().is_empty() {
            warn!("Token response did not contain an access token");
            return Err(AuthError::AuthenticationRejected(
                "token response did not contain an access token".to_string(),
            ));
        }

        let mut token = AccessToken::new(token_response.access_token);
        if let Some(expires_in) = token_response.expires_in {
            token = token.with_expires_in(expires_in);
        }

        tracing::info!(
            enterprise = token.domain().is_some(),
            expires_at = ?token.expires_at(),
            "Obtained Crowdin access token"
        );

        Ok(token)
    }
}

fn without_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

impl std::fmt::Debug for OAuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthFlow")
            .field("settings", &self.settings)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn token_error_message(response: &HttpResponse) -> String {
    let parsed: TokenErrorResponse = response.json().unwrap_or_default();

    parsed
        .error_description
        .or(parsed.message)
        .or(parsed.error)
        .unwrap_or_else(|| format!("token endpoint returned HTTP {}", response.status))
}
