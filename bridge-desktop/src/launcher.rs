//! Browser launcher backed by the `open` crate

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    launcher::UrlLauncher,
};
use tracing::{debug, warn};

/// Opens URLs in the system default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowserLauncher;

impl SystemBrowserLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UrlLauncher for SystemBrowserLauncher {
    async fn open_url(&self, url: &str) -> Result<()> {
        let owned = url.to_string();

        // Blocks until the opener process has been spawned
        let result = tokio::task::spawn_blocking(move || open::that(owned))
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Launcher task failed: {}", e)))?;

        match result {
            Ok(()) => {
                debug!("Opened authorization page in default browser");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Could not open browser");
                Err(BridgeError::Io(e))
            }
        }
    }
}
