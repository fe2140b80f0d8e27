//! Domain results returned to the host.

use crate::language::Language;
use crate::types::{
    BranchResource, DirectoryResource, FileResource, ProjectResource, UserResource,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Display name (falls back to the login when no full name is set)
    pub name: String,
    pub login: String,
    /// Avatar image URL
    pub avatar: Option<String>,
}

impl From<UserResource> for UserInfo {
    fn from(user: UserResource) -> Self {
        let name = user
            .full_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| user.username.clone());

        Self {
            name,
            login: user.username,
            avatar: user.avatar_url,
        }
    }
}

/// One entry of the user's project list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectListing {
    pub id: u64,
    pub identifier: String,
    pub name: String,
}

impl From<ProjectResource> for ProjectListing {
    fn from(project: ProjectResource) -> Self {
        Self {
            id: project.id,
            identifier: project.identifier.unwrap_or_default(),
            name: project.name,
        }
    }
}

/// A source file inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: u64,
    pub title: String,
    pub file_name: String,
    pub dir_id: Option<u64>,
    pub dir_name: String,
    pub branch_id: Option<u64>,
    pub branch_name: String,
    /// `/branch/dir/.../file`, with absent components omitted
    pub full_path: String,
}

/// Project details needed to pick a file and a language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: u64,
    pub name: String,
    pub languages: Vec<Language>,
    pub files: Vec<FileInfo>,
}

impl ProjectInfo {
    /// Assemble project details, resolving each file's directory chain.
    pub(crate) fn assemble(
        project: ProjectResource,
        files: Vec<FileResource>,
        directories: Vec<DirectoryResource>,
        branches: Vec<BranchResource>,
    ) -> Self {
        let languages = project
            .target_language_ids
            .iter()
            .filter_map(|id| match id.parse::<Language>() {
                Ok(lang) => Some(lang),
                Err(e) => {
                    warn!(error = %e, "Skipping unknown target language");
                    None
                }
            })
            .collect();

        let directories: HashMap<u64, DirectoryResource> =
            directories.into_iter().map(|d| (d.id, d)).collect();
        let branches: HashMap<u64, String> =
            branches.into_iter().map(|b| (b.id, b.name)).collect();

        let files = files
            .into_iter()
            .map(|file| resolve_file(file, &directories, &branches))
            .collect();

        Self {
            id: project.id,
            name: project.name,
            languages,
            files,
        }
    }
}

fn resolve_file(
    file: FileResource,
    directories: &HashMap<u64, DirectoryResource>,
    branches: &HashMap<u64, String>,
) -> FileInfo {
    // Walk up the directory tree; the visited set guards against cycles
    let mut segments = Vec::new();
    let mut visited = HashSet::new();
    let mut next = file.directory_id;
    let mut branch_id = file.branch_id;

    while let Some(dir_id) = next {
        if !visited.insert(dir_id) {
            warn!(dir_id, "Directory cycle in project tree");
            break;
        }
        let Some(dir) = directories.get(&dir_id) else {
            break;
        };
        segments.push(dir.name.as_str());
        branch_id = branch_id.or(dir.branch_id);
        next = dir.directory_id;
    }

    let branch_name = branch_id
        .and_then(|id| branches.get(&id).cloned())
        .unwrap_or_default();
    let dir_name = file
        .directory_id
        .and_then(|id| directories.get(&id))
        .map(|d| d.name.clone())
        .unwrap_or_default();

    let mut full_path = String::new();
    if !branch_name.is_empty() {
        full_path.push('/');
        full_path.push_str(&branch_name);
    }
    for segment in segments.iter().rev() {
        full_path.push('/');
        full_path.push_str(segment);
    }
    full_path.push('/');
    full_path.push_str(&file.name);

    FileInfo {
        id: file.id,
        title: file
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| file.name.clone()),
        file_name: file.name,
        dir_id: file.directory_id,
        dir_name,
        branch_id,
        branch_name,
        full_path,
    }
}
