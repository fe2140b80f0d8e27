//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `SecureStore` using the `keyring` crate
//! - `UrlLauncher` using the `open` crate
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SystemBrowserLauncher};
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let launcher = SystemBrowserLauncher::new();
//! ```

mod http;
mod launcher;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use http::{ReqwestHttpClient, DEFAULT_USER_AGENT};
pub use launcher::SystemBrowserLauncher;

#[cfg(feature = "secure-store")]
pub use secure_store::{KeyringSecureStore, DEFAULT_SERVICE_NAME};
