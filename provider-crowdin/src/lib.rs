//! # Crowdin Provider
//!
//! Typed access to the Crowdin API v2 for the signed-in user.
//!
//! ## Overview
//!
//! This module provides:
//! - User info and paginated project listing
//! - Project details with branch/directory paths resolved per file
//! - Translation download (streamed to disk) and upload (storage + import)
//! - Uniform handling of expired authorization and remote failures

pub mod connector;
pub mod error;
pub mod language;
pub mod models;
pub mod types;

pub use connector::CrowdinApi;
pub use error::{CrowdinError, Result};
pub use language::{InvalidLanguage, Language};
pub use models::{FileInfo, ProjectInfo, ProjectListing, UserInfo};
