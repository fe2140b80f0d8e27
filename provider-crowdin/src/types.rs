//! Crowdin API v2 response types
//!
//! Only the fields the client reads are modelled; everything else in the
//! payloads is ignored.
//!
//! See: https://developer.crowdin.com/api/v2/

use serde::{Deserialize, Serialize};

/// `{"data": {...}}` envelope used by every single-resource response.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// `{"data": [{"data": {...}}, ...], "pagination": {...}}` list envelope.
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<DataEnvelope<T>>,
}

impl<T> ListEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        self.data.into_iter().map(|item| item.data).collect()
    }
}

/// `GET user`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResource {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// `GET projects`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResource {
    pub id: u64,
    #[serde(default)]
    pub identifier: Option<String>,
    pub name: String,
    #[serde(default)]
    pub target_language_ids: Vec<String>,
}

/// `GET projects/{id}/files`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResource {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub directory_id: Option<u64>,
    #[serde(default)]
    pub branch_id: Option<u64>,
}

/// `GET projects/{id}/directories`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryResource {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub directory_id: Option<u64>,
    #[serde(default)]
    pub branch_id: Option<u64>,
}

/// `GET projects/{id}/branches`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchResource {
    pub id: u64,
    pub name: String,
}

/// Body of `POST projects/{id}/translations/builds/files/{fileId}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildFileRequest<'a> {
    pub target_language_id: &'a str,
    pub export_as_xliff: bool,
}

/// Signed download link returned by a file build
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub url: String,
    #[serde(default)]
    pub expire_in: Option<String>,
}

/// `POST storages`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageResource {
    pub id: u64,
}

/// Body of `POST projects/{id}/translations/{languageId}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTranslationRequest {
    pub storage_id: u64,
    pub file_id: u64,
    pub import_eq_suggestions: bool,
    pub auto_approve_imported: bool,
}

/// Error payloads: `{"error": {"code", "message"}}` or the validation form
/// `{"errors": [{"error": {"key", "errors": [{"code", "message"}]}}]}`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ErrorDetail>,
    #[serde(default)]
    pub errors: Vec<ValidationErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidationErrorEntry {
    pub error: ValidationError,
}

#[derive(Debug, Deserialize)]
pub struct ValidationError {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

impl ErrorEnvelope {
    /// Human-readable message, if the payload carried one.
    pub fn message(&self) -> Option<String> {
        if let Some(message) = self.error.as_ref().and_then(|e| e.message.clone()) {
            return Some(message);
        }

        let messages: Vec<String> = self
            .errors
            .iter()
            .flat_map(|entry| {
                let key = entry.error.key.clone();
                entry.error.errors.iter().filter_map(move |detail| {
                    detail.message.as_ref().map(|m| match &key {
                        Some(key) => format!("{}: {}", key, m),
                        None => m.clone(),
                    })
                })
            })
            .collect();

        if messages.is_empty() {
            None
        } else {
            Some(messages.join("; "))
        }
    }
}
