//! # Client Configuration Module
//!
//! Provides configuration management for the Crowdin client core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `ClientConfig` holding the OAuth application settings, the Crowdin
//! endpoints and the bridge implementations the core talks through. It
//! enforces fail-fast validation so a misconfigured host never reaches the
//! browser step.
//!
//! ## Required Settings
//!
//! - `client_id` - the OAuth application registered with Crowdin
//!
//! ## Bridges (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `SecureStore` - token persistence (desktop default: OS keyring)
//! - `UrlLauncher` - opening the authorization page (desktop default: system browser)
//!
//! When the `desktop-shims` feature is enabled, missing bridges are filled
//! in from `bridge-desktop`. Without it, a missing bridge is reported as
//! [`Error::CapabilityMissing`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ClientConfig;
//!
//! let config = ClientConfig::builder()
//!     .client_id("my-client-id")
//!     .client_secret("my-client-secret")
//!     .redirect_uri("poedit://auth/crowdin/")
//!     .build()?;
//! ```
//!
//! Hosts that keep OAuth credentials out of the binary can start from the
//! environment:
//!
//! ```ignore
//! let config = ClientConfig::builder_from_env().build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, SecureStore, UrlLauncher};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default Crowdin OAuth authorization endpoint
pub const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.crowdin.com/oauth/authorize";

/// Default Crowdin OAuth token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.crowdin.com/oauth/token";

/// Default Crowdin API v2 base URL (used when the token names no organization)
pub const DEFAULT_API_BASE_URL: &str = "https://api.crowdin.com/api/v2/";

/// Default custom-scheme redirect URI registered for the desktop app
pub const DEFAULT_REDIRECT_URI: &str = "poedit://auth/crowdin/";

/// Default OAuth scope
pub const DEFAULT_SCOPE: &str = "project";

/// Default keyring service name
pub const DEFAULT_KEYRING_SERVICE: &str = "crowdin-client";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable names read by [`ClientConfigBuilder::from_env`]
pub const ENV_CLIENT_ID: &str = "CROWDIN_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CROWDIN_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "CROWDIN_REDIRECT_URI";

/// Referral parameters appended by attribution links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// `utm_source` value identifying the host application
    pub source: String,
    /// `utm_campaign` value
    pub campaign: String,
}

impl Default for Attribution {
    fn default() -> Self {
        Self {
            source: "crowdin-client".to_string(),
            campaign: "crowdin-client".to_string(),
        }
    }
}

/// OAuth application and endpoint settings.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub scope: String,
}

impl std::fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Client configuration.
///
/// Use [`ClientConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ClientConfig {
    /// OAuth application settings
    pub oauth: OAuthSettings,

    /// API base URL used when the token does not carry an organization domain
    pub api_base_url: String,

    /// Referral parameters for [`attribute_link`]-style helpers
    pub attribution: Attribution,

    /// Keyring service name the token is stored under
    pub keyring_service: String,

    /// Timeout applied to every API request
    pub request_timeout: Duration,

    /// HTTP transport
    pub http_client: Arc<dyn HttpClient>,

    /// Secure credential storage
    pub secure_store: Arc<dyn SecureStore>,

    /// Browser launcher for the authorization page
    pub url_launcher: Arc<dyn UrlLauncher>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("oauth", &self.oauth)
            .field("api_base_url", &self.api_base_url)
            .field("attribution", &self.attribution)
            .field("keyring_service", &self.keyring_service)
            .field("request_timeout", &self.request_timeout)
            .field("http_client", &"HttpClient { ... }")
            .field("secure_store", &"SecureStore { ... }")
            .field("url_launcher", &"UrlLauncher { ... }")
            .finish()
    }
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Creates a builder pre-filled from `CROWDIN_*` environment variables.
    pub fn builder_from_env() -> ClientConfigBuilder {
        ClientConfigBuilder::from_env()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Client ID is not empty
    /// - Endpoint URLs parse and use http(s)
    /// - Redirect URI parses and has a scheme
    /// - Request timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.oauth.client_id.trim().is_empty() {
            return Err(Error::Config("OAuth client ID cannot be empty".to_string()));
        }

        for (name, value) in [
            ("authorize URL", &self.oauth.authorize_url),
            ("token URL", &self.oauth.token_url),
            ("API base URL", &self.api_base_url),
        ] {
            let url = Url::parse(value)
                .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", name, value, e)))?;
            if url.scheme() != "https" && url.scheme() != "http" {
                return Err(Error::Config(format!(
                    "Invalid {} '{}': expected an http(s) URL",
                    name, value
                )));
            }
        }

        if !self.api_base_url.ends_with('/') {
            return Err(Error::Config(format!(
                "API base URL '{}' must end with '/'",
                self.api_base_url
            )));
        }

        Url::parse(&self.oauth.redirect_uri).map_err(|e| {
            Error::Config(format!(
                "Invalid redirect URI '{}': {}",
                self.oauth.redirect_uri, e
            ))
        })?;

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::{ReqwestHttpClient, DEFAULT_USER_AGENT};

    let client = ReqwestHttpClient::with_timeout(DEFAULT_USER_AGENT, timeout)
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(capability_missing(
        "HttpClient",
        "No HTTP client implementation provided. \
         Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient. \
         Other hosts: inject a platform-native adapter.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_secure_store(service: &str) -> Result<Arc<dyn SecureStore>> {
    use bridge_desktop::KeyringSecureStore;

    Ok(Arc::new(KeyringSecureStore::with_service_name(service)))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store(_service: &str) -> Result<Arc<dyn SecureStore>> {
    Err(capability_missing(
        "SecureStore",
        "SecureStore implementation is required for token persistence. \
         Desktop: enable the 'desktop-shims' feature to use KeyringSecureStore. \
         Other hosts: inject platform-native secure storage.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_url_launcher() -> Result<Arc<dyn UrlLauncher>> {
    use bridge_desktop::SystemBrowserLauncher;

    Ok(Arc::new(SystemBrowserLauncher::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_url_launcher() -> Result<Arc<dyn UrlLauncher>> {
    Err(capability_missing(
        "UrlLauncher",
        "UrlLauncher implementation is required to show the authorization page. \
         Desktop: enable the 'desktop-shims' feature to use SystemBrowserLauncher.",
    ))
}

/// Builder for constructing [`ClientConfig`] instances.
#[derive(Default)]
pub struct ClientConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    authorize_url: Option<String>,
    token_url: Option<String>,
    api_base_url: Option<String>,
    scope: Option<String>,
    attribution: Option<Attribution>,
    keyring_service: Option<String>,
    request_timeout: Option<Duration>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    url_launcher: Option<Arc<dyn UrlLauncher>>,
}

impl ClientConfigBuilder {
    /// Builder pre-filled from `CROWDIN_CLIENT_ID`, `CROWDIN_CLIENT_SECRET`
    /// and `CROWDIN_REDIRECT_URI`. Unset variables are left empty.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            client_id: var(ENV_CLIENT_ID),
            client_secret: var(ENV_CLIENT_SECRET),
            redirect_uri: var(ENV_REDIRECT_URI),
            ..Self::default()
        }
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = Some(url.into());
        self
    }

    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn attribution(mut self, source: impl Into<String>, campaign: impl Into<String>) -> Self {
        self.attribution = Some(Attribution {
            source: source.into(),
            campaign: campaign.into(),
        });
        self
    }

    pub fn keyring_service(mut self, service: impl Into<String>) -> Self {
        self.keyring_service = Some(service.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn url_launcher(mut self, launcher: Arc<dyn UrlLauncher>) -> Self {
        self.url_launcher = Some(launcher);
        self
    }

    /// Builds the final [`ClientConfig`], filling defaults and validating.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the client ID is missing or a setting is invalid
    /// - [`Error::CapabilityMissing`] if a bridge is missing and no platform
    ///   default is available
    pub fn build(self) -> Result<ClientConfig> {
        let client_id = self.client_id.ok_or_else(|| {
            Error::Config(format!(
                "OAuth client ID is required (set it explicitly or via {})",
                ENV_CLIENT_ID
            ))
        })?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let keyring_service = self
            .keyring_service
            .unwrap_or_else(|| DEFAULT_KEYRING_SERVICE.to_string());

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };
        let secure_store = match self.secure_store {
            Some(store) => store,
            None => provide_default_secure_store(&keyring_service)?,
        };
        let url_launcher = match self.url_launcher {
            Some(launcher) => launcher,
            None => provide_default_url_launcher()?,
        };

        let config = ClientConfig {
            oauth: OAuthSettings {
                client_id,
                client_secret: self.client_secret,
                redirect_uri: self
                    .redirect_uri
                    .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
                authorize_url: self
                    .authorize_url
                    .unwrap_or_else(|| DEFAULT_AUTHORIZE_URL.to_string()),
                token_url: self
                    .token_url
                    .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
                scope: self.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            },
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            attribution: self.attribution.unwrap_or_default(),
            keyring_service,
            request_timeout,
            http_client,
            secure_store,
            url_launcher,
        };

        config.validate()?;
        Ok(config)
    }
}
