//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host.
//!
//! ## Overview
//!
//! This crate defines the contract between the Crowdin client core and
//! platform-specific implementations. Each trait represents a capability the
//! core consumes but does not implement itself.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP transport for token exchange and API calls
//! - [`SecureStore`](storage::SecureStore) - Credential persistence (Keychain/Credential Manager/libsecret)
//! - [`UrlLauncher`](launcher::UrlLauncher) - Open the authorization page in a browser
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|----------------------|
//! | Desktop  | `bridge-desktop`     |
//!
//! Hosts that embed the client elsewhere inject their own adapters through
//! `core_runtime::config::ClientConfig`.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert platform-specific errors and never include secret values in
//! messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared across
//! async tasks.

pub mod error;
pub mod http;
pub mod launcher;
pub mod storage;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use launcher::UrlLauncher;
pub use storage::SecureStore;
