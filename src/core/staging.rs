//! Files staged for upload.
//!
//! The store owns each staged file together with its preview reference.
//! A preview reference stays resolvable only while its file is staged:
//! removing or clearing releases it.

use std::collections::HashMap;
use std::path::PathBuf;

/// Scheme prefix of session-local preview references.
pub const PREVIEW_SCHEME: &str = "preview:";

/// A file selected but not yet submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub id: String,
    pub name: String,
    pub preview_url: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl StagedFile {
    /// Stage `path` with a fresh id and preview reference.
    pub fn new(path: PathBuf, name: String, mime_type: String, size_bytes: u64) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let preview_url = format!("{PREVIEW_SCHEME}{}", uuid::Uuid::new_v4());
        Self {
            id,
            name,
            preview_url,
            mime_type,
            size_bytes,
            path,
        }
    }
}

#[derive(Debug, Default)]
pub struct FileStore {
    files: Vec<StagedFile>,
    /// preview reference -> backing path
    previews: HashMap<String, PathBuf>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append in order, keeping existing entries. Duplicates are accepted.
    pub fn add_files(&mut self, new_files: Vec<StagedFile>) {
        for file in new_files {
            self.previews
                .insert(file.preview_url.clone(), file.path.clone());
            self.files.push(file);
        }
    }

    /// Remove at most one file by id. Returns false for an unknown id.
    pub fn remove_file(&mut self, id: &str) -> bool {
        let Some(pos) = self.files.iter().position(|f| f.id == id) else {
            return false;
        };
        let file = self.files.remove(pos);
        self.previews.remove(&file.preview_url);
        log::debug!("Unstaged {} ({})", file.name, file.id);
        true
    }

    pub fn clear_files(&mut self) {
        self.files.clear();
        self.previews.clear();
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn first(&self) -> Option<&StagedFile> {
        self.files.first()
    }

    pub fn get(&self, id: &str) -> Option<&StagedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    /// Resolve a live preview reference to its file.
    pub fn resolve_preview(&self, preview_url: &str) -> Option<&PathBuf> {
        self.previews.get(preview_url)
    }

    /// Number of preview references currently held.
    pub fn live_previews(&self) -> usize {
        self.previews.len()
    }
}

/// Human-readable size, e.g. `1.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} Bytes")
    } else {
        let rounded = (value * 100.0).round() / 100.0;
        format!("{rounded} {}", UNITS[unit])
    }
}
