//! Crowdin client façade.
//!
//! [`CrowdinClient`] wires the host-provided bridges from a
//! [`ClientConfig`] into the token store, the OAuth handshake and the API
//! gateway, and exposes the operations the UI layer consumes. Build it once
//! at startup and clone the handle wherever it is needed; when the last
//! handle is dropped any sign-in still waiting for its callback resolves as
//! cancelled.
//!
//! ```ignore
//! let client = CrowdinClient::new(ClientConfig::builder_from_env().build()?).await?;
//!
//! if !client.is_signed_in() {
//!     // The host forwards the redirect to `handle_oauth_callback`
//!     client.authenticate().await?;
//! }
//! for project in client.get_user_projects().await? {
//!     println!("{}", project.name);
//! }
//! ```

pub mod error;

pub use error::{ClientError, Result};

pub use core_auth::{AuthOutcome, HandshakeState};
pub use core_runtime::config::{ClientConfig, ClientConfigBuilder};
pub use core_runtime::events::{AuthEvent, EventSeverity, EventStream};
pub use provider_crowdin::{FileInfo, Language, ProjectInfo, ProjectListing, UserInfo};

use bytes::Bytes;
use core_auth::{OAuthFlow, OAuthHandshake, TokenStore};
use core_runtime::config::Attribution;
use core_runtime::events::EventBus;
use provider_crowdin::CrowdinApi;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Site that relative attribution links point into
pub const CROWDIN_SITE: &str = "https://crowdin.com";

struct ClientInner {
    attribution: Attribution,
    token_store: Arc<TokenStore>,
    handshake: OAuthHandshake,
    api: CrowdinApi,
    event_bus: EventBus,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        // Dropping the handshake resolves any pending outcome as cancelled
        debug!("Crowdin client released");
    }
}

/// Handle to the Crowdin client. Cheap to clone.
#[derive(Clone)]
pub struct CrowdinClient {
    inner: Arc<ClientInner>,
}

impl CrowdinClient {
    /// Build the client and restore a previously stored token.
    ///
    /// # Errors
    ///
    /// [`ClientError::Config`] if the configuration does not validate.
    #[instrument(skip(config))]
    pub async fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::default();
        let token_store = Arc::new(TokenStore::new(config.secure_store.clone()));

        let flow = OAuthFlow::new(config.oauth.clone(), config.http_client.clone())
            .with_timeout(config.request_timeout);
        let handshake = OAuthHandshake::new(
            flow,
            config.url_launcher.clone(),
            token_store.clone(),
            event_bus.clone(),
        );
        let api = CrowdinApi::new(
            config.http_client.clone(),
            token_store.clone(),
            config.api_base_url.clone(),
            event_bus.clone(),
        )
        .with_timeout(config.request_timeout);

        let signed_in = token_store.load().await.is_some();
        info!(signed_in, "Crowdin client ready");

        Ok(Self {
            inner: Arc::new(ClientInner {
                attribution: config.attribution,
                token_store,
                handshake,
                api,
                event_bus,
            }),
        })
    }

    /// Whether a token is held. The server may still reject it.
    pub fn is_signed_in(&self) -> bool {
        self.inner.token_store.cached().is_some()
    }

    /// Sign in through the browser and wait for the result.
    ///
    /// Concurrent calls share one attempt and observe the same result.
    pub async fn authenticate(&self) -> Result<()> {
        let outcome = self.begin_authentication().await?;
        outcome.await.map_err(ClientError::from)
    }

    /// Open the authorization page and return the pending outcome without
    /// waiting on it.
    pub async fn begin_authentication(&self) -> Result<AuthOutcome> {
        Ok(self.inner.handshake.authenticate().await?)
    }

    /// Whether `uri` is the OAuth redirect and should be passed to
    /// [`handle_oauth_callback`](Self::handle_oauth_callback).
    pub fn is_oauth_callback(&self, uri: &str) -> bool {
        self.inner.handshake.is_oauth_callback(uri)
    }

    /// Complete the pending sign-in with the redirect received by the host.
    ///
    /// Returns `false` if the URI was ignored.
    pub async fn handle_oauth_callback(&self, uri: &str) -> bool {
        self.inner.handshake.handle_oauth_callback(uri).await
    }

    pub async fn handshake_state(&self) -> HandshakeState {
        self.inner.handshake.state().await
    }

    /// Forget the token and fail any pending sign-in as cancelled.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        self.inner.handshake.sign_out().await;
        info!("Signed out of Crowdin");
        let _ = self.inner.event_bus.emit(AuthEvent::SignedOut);
    }

    pub async fn get_user_info(&self) -> Result<UserInfo> {
        Ok(self.inner.api.get_user_info().await?)
    }

    pub async fn get_user_projects(&self) -> Result<Vec<ProjectListing>> {
        Ok(self.inner.api.get_user_projects().await?)
    }

    pub async fn get_project_info(&self, project_id: u64) -> Result<ProjectInfo> {
        Ok(self.inner.api.get_project_info(project_id).await?)
    }

    /// Download the translation of `file_id` into `output`.
    ///
    /// With `force_export_as_xliff`, Crowdin converts the file to XLIFF
    /// before sending it.
    pub async fn download_file(
        &self,
        project_id: u64,
        lang: &Language,
        file_id: u64,
        file_extension: &str,
        force_export_as_xliff: bool,
        output: impl AsRef<Path>,
    ) -> Result<()> {
        Ok(self
            .inner
            .api
            .download_file(
                project_id,
                lang,
                file_id,
                file_extension,
                force_export_as_xliff,
                output.as_ref(),
            )
            .await?)
    }

    /// Upload translated content for `file_id`.
    pub async fn upload_file(
        &self,
        project_id: u64,
        lang: &Language,
        file_id: u64,
        file_extension: &str,
        content: impl Into<Bytes>,
    ) -> Result<()> {
        Ok(self
            .inner
            .api
            .upload_file(project_id, lang, file_id, file_extension, content.into())
            .await?)
    }

    /// Crowdin URL tagged with this application's referral parameters.
    pub fn attribute_link(&self, page: &str) -> String {
        attribute_link(&self.inner.attribution, page)
    }

    /// Subscribe to sign-in and session events.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.inner.event_bus.subscribe())
    }

    /// Events at or above `min_severity`, e.g. only what the UI should surface.
    pub fn notifications(&self, min_severity: EventSeverity) -> EventStream {
        self.events()
            .filter(move |event| event.severity() >= min_severity)
    }

    /// Cancel any pending sign-in now, then release this handle.
    pub async fn shutdown(self) {
        self.inner.handshake.cancel().await;
        debug!(
            handles = Arc::strong_count(&self.inner),
            "Crowdin client shutting down"
        );
    }
}

impl std::fmt::Debug for CrowdinClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrowdinClient")
            .field("signed_in", &self.is_signed_in())
            .field("api", &self.inner.api)
            .finish_non_exhaustive()
    }
}

fn attribute_link(attribution: &Attribution, page: &str) -> String {
    let (target, fragment) = match page.split_once('#') {
        Some((target, fragment)) => (target, Some(fragment)),
        None => (page, None),
    };

    let mut url = if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else if target.starts_with('/') {
        format!("{}{}", CROWDIN_SITE, target)
    } else {
        format!("{}/{}", CROWDIN_SITE, target)
    };

    if !url.contains('?') {
        url.push('?');
    } else if !url.ends_with('?') && !url.ends_with('&') {
        url.push('&');
    }
    url.push_str(&format!(
        "utm_source={}&utm_medium=referral&utm_campaign={}",
        urlencoding::encode(&attribution.source),
        urlencoding::encode(&attribution.campaign)
    ));

    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}
