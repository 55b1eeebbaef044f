//! Wire types for the Neura backend.
//!
//! The backend serializes MongoDB ids as `_id`; `id` is accepted as well.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Workspace as returned by `GET /api/workspaces`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Workspace with its study guides populated (`GET /api/workspaces/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub study_guides: Vec<StudyGuide>,
}

/// Body of `POST /api/workspaces`.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceCreate {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyGuide {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub original_pdf_gridfs_id: Option<String>,
    #[serde(default)]
    pub extracted_images: Vec<ExtractedImage>,
    #[serde(default, rename = "study_guide")]
    pub sections: Vec<StudyGuideSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedImage {
    pub filename: String,
    #[serde(default)]
    pub page_number: Option<u32>,
    /// Storage id for `GET /api/files/gridfs/{id}`; absent for images the
    /// backend filtered out before upload.
    #[serde(default)]
    pub gridfs_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyGuideSection {
    pub section_id: String,
    pub section_title: String,
    #[serde(default)]
    pub section_overview_description: String,
    #[serde(default)]
    pub subsection_titles: Vec<String>,
    #[serde(default)]
    pub subsections: Vec<StudyGuideSubsection>,
    /// Section-level images (older, flat study guides).
    #[serde(default)]
    pub associated_image_filenames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyGuideSubsection {
    pub subsection_title: String,
    /// Markdown.
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub associated_image_filenames: Vec<String>,
}

/// Format a backend timestamp (`2024-05-01T10:00:00` or RFC 3339) as a date.
pub fn display_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%b %d, %Y").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%b %d, %Y").to_string();
    }
    raw.to_string()
}
