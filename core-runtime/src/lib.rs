//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the Crowdin client core:
//! - Client configuration and bridge wiring
//! - Logging and tracing setup
//! - Auth event bus
//!
//! Every other crate in the workspace depends on these conventions.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, Result};
pub use events::{AuthEvent, EventBus};
