//! Crowdin client core.
//!
//! Thin facade over the workspace crates so hosts can depend on a single
//! package. With the default `desktop-shims` feature the client wires the
//! reqwest, keyring and system-browser bridges automatically.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
