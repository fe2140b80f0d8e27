//! Crowdin language identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Locale as identified by Crowdin (`fr`, `pt-BR`, `zh-TW`, `sr-Latn`).
///
/// Treated as opaque apart from accepting `_` as a separator, so
/// gettext-style codes (`pt_BR`) map to the Crowdin id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

/// Returned when parsing an empty or malformed language code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid language code '{0}'")]
pub struct InvalidLanguage(pub String);

impl Language {
    /// Crowdin language id, e.g. `pt-BR`.
    pub fn crowdin_id(&self) -> &str {
        &self.0
    }

    /// Language part without region or script, e.g. `pt`.
    pub fn lang(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// gettext-style code, e.g. `pt_BR`.
    pub fn to_posix(&self) -> String {
        self.0.replace('-', "_")
    }
}

impl FromStr for Language {
    type Err = InvalidLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let valid = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            && !trimmed.starts_with(['-', '_'])
            && !trimmed.ends_with(['-', '_']);

        if !valid {
            return Err(InvalidLanguage(s.to_string()));
        }

        Ok(Language(trimmed.replace('_', "-")))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
