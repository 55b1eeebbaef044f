//! File picker: turns a typed path selection into staged files.
//!
//! Several paths may be entered at once, separated by `;`. The input is
//! cleared after every selection so the same file can be picked again.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::staging::{FileStore, StagedFile};
use crate::tui::widgets::input_buffer::InputBuffer;

/// Separator between paths in one selection.
pub const PATH_SEPARATOR: char = ';';

/// Extensions offered by the upload view.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "pptx", "txt", "png", "jpg", "jpeg", "gif", "webp", "mp4", "mp3",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PickerError {
    #[error("No file selected")]
    EmptySelection,

    #[error("{path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Result of one selection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Number of files appended to the store.
    pub staged: usize,
    /// Paths that could not be staged.
    pub skipped: Vec<PickerError>,
}

pub struct FilePicker {
    pub input: InputBuffer,
}

impl FilePicker {
    pub fn new() -> Self {
        Self {
            input: InputBuffer::new(),
        }
    }

    /// Stage every readable path in the input, in order, then reset the input.
    pub fn handle_selection(&mut self, store: &mut FileStore) -> Result<Selection, PickerError> {
        let raw = self.input.take();
        let paths: Vec<&str> = raw
            .split(PATH_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if paths.is_empty() {
            return Err(PickerError::EmptySelection);
        }

        let mut selection = Selection::default();
        let mut new_files = Vec::with_capacity(paths.len());

        for raw_path in paths {
            match stage_path(&expand_home(raw_path)) {
                Ok(file) => new_files.push(file),
                Err(e) => {
                    log::warn!("Skipping selection: {e}");
                    selection.skipped.push(e);
                }
            }
        }

        selection.staged = new_files.len();
        store.add_files(new_files);
        Ok(selection)
    }

    pub fn remove_file(&self, store: &mut FileStore, id: &str) -> bool {
        store.remove_file(id)
    }
}

impl Default for FilePicker {
    fn default() -> Self {
        Self::new()
    }
}

fn stage_path(path: &Path) -> Result<StagedFile, PickerError> {
    let unreadable = |reason: String| PickerError::Unreadable {
        path: path.display().to_string(),
        reason,
    };

    let metadata = std::fs::metadata(path).map_err(|e| unreadable(e.to_string()))?;
    if !metadata.is_file() {
        return Err(unreadable("not a regular file".to_string()));
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| unreadable("invalid file name".to_string()))?;

    Ok(StagedFile::new(
        path.to_path_buf(),
        name,
        mime_for_path(path).to_string(),
        metadata.len(),
    ))
}

fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

/// MIME type from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" | "md" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}
