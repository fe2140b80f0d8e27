//! Browser Launch Abstraction
//!
//! The OAuth handshake needs the host to show the authorization page. On
//! desktop this is the default browser; embedded hosts may use a web view.

use async_trait::async_trait;

use crate::error::Result;

/// Opens URLs outside the application.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::launcher::UrlLauncher;
///
/// async fn show_login(launcher: &dyn UrlLauncher, url: &str) -> Result<()> {
///     launcher.open_url(url).await
/// }
/// ```
#[async_trait]
pub trait UrlLauncher: Send + Sync {
    /// Open `url` in the user's browser.
    ///
    /// Returning `Ok` only means the request was handed to the platform;
    /// it does not mean the user saw or completed the page.
    async fn open_url(&self, url: &str) -> Result<()>;
}
