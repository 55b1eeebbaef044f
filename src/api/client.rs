//! Typed HTTP client for the Neura backend.

use std::path::Path;
use std::time::Duration;

use reqwest::header::CACHE_CONTROL;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::error::{ApiError, Result};
use super::models::{StudyGuide, Workspace, WorkspaceCreate, WorkspaceSummary};
use crate::config::AppConfig;

/// Multipart field name the upload endpoint expects.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct NeuraClient {
    http: Client,
    base_url: Option<String>,
}

impl NeuraClient {
    /// Build a client from config.
    ///
    /// A missing base URL is not an error here; each operation fails fast with
    /// [`ApiError::Configuration`] instead. A malformed one is rejected.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let base_url = config.backend_url();
        if let Some(ref url) = base_url {
            url::Url::parse(url)
                .map_err(|e| ApiError::Configuration(format!("invalid backend URL {url}: {e}")))?;
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.backend.request_timeout_secs))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Client pointed at `base_url` with default settings.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let mut config = AppConfig::default();
        config.backend.base_url = Some(base_url.into());
        Self::new(&config)
    }

    pub fn base_url(&self) -> Result<&str> {
        self.base_url
            .as_deref()
            .ok_or_else(ApiError::missing_backend_url)
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    fn url(&self, path: &str) -> Result<String> {
        Ok(format!("{}{}", self.base_url()?, path))
    }

    // ── Workspaces ──────────────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn list_workspaces(&self) -> Result<Vec<WorkspaceSummary>> {
        let url = self.url("/api/workspaces")?;
        log::debug!("GET {url}");
        let response = self.http.get(&url).send().await?;
        read_json(response, "Workspaces").await
    }

    #[instrument(skip(self))]
    pub async fn create_workspace(&self, title: &str) -> Result<WorkspaceSummary> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ApiError::Validation("workspace title is empty".to_string()));
        }
        let url = self.url("/api/workspaces")?;
        log::info!("Creating workspace {title:?}");
        let response = self
            .http
            .post(&url)
            .json(&WorkspaceCreate {
                title: title.to_string(),
            })
            .send()
            .await?;
        read_json(response, "Workspace").await
    }

    /// Fetch a workspace with its study guides. Bypasses HTTP caches so a
    /// fresh upload is visible immediately.
    #[instrument(skip(self))]
    pub async fn get_workspace(&self, workspace_id: &str) -> Result<Workspace> {
        let workspace_id = require_workspace(workspace_id)?;
        let url = self.url(&format!("/api/workspaces/{workspace_id}"))?;
        log::debug!("GET {url}");
        let response = self
            .http
            .get(&url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        read_json(response, "Workspace").await
    }

    // ── Study guides ────────────────────────────────────────────────────

    /// Upload one document; the backend generates and returns a study guide.
    #[instrument(skip(self, path), fields(mime = %mime_type))]
    pub async fn upload_study_guide(
        &self,
        workspace_id: &str,
        path: &Path,
        file_name: &str,
        mime_type: &str,
    ) -> Result<StudyGuide> {
        let workspace_id = require_workspace(workspace_id)?;
        let url = self.url(&format!("/api/workspaces/{workspace_id}/study-guides"))?;

        let bytes = tokio::fs::read(path).await?;
        log::info!("Uploading {file_name} ({} bytes) to workspace {workspace_id}", bytes.len());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = self.http.post(&url).multipart(form).send().await?;
        // The upload view shows the backend's message for every failure, 404 included.
        if response.status() == StatusCode::NOT_FOUND {
            let body = response.text().await?;
            log::warn!("Upload target missing: {body}");
            return Err(ApiError::Http { status: 404, body });
        }
        read_json(response, "Workspace").await
    }

    #[instrument(skip(self))]
    pub async fn list_study_guides(&self, workspace_id: &str) -> Result<Vec<StudyGuide>> {
        let workspace_id = require_workspace(workspace_id)?;
        let url = self.url(&format!("/api/workspaces/{workspace_id}/study-guides/"))?;
        let response = self
            .http
            .get(&url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        read_json(response, "Workspace").await
    }

    // ── Files ───────────────────────────────────────────────────────────

    /// URL serving the raw bytes of a stored file.
    pub fn gridfs_url(&self, storage_id: &str) -> Result<String> {
        self.url(&format!("/api/files/gridfs/{storage_id}"))
    }

    /// GET an arbitrary JSON resource under the base URL.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, label: &str) -> Result<T> {
        let url = self.url(path)?;
        log::debug!("GET {url}");
        let response = self
            .http
            .get(&url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        read_json(response, label).await
    }
}

pub(crate) fn require_workspace(workspace_id: &str) -> Result<&str> {
    let id = workspace_id.trim();
    if id.is_empty() {
        Err(ApiError::missing_workspace())
    } else {
        Ok(id)
    }
}

/// Map status to the error taxonomy, then decode the body.
async fn read_json<T: DeserializeOwned>(response: Response, label: &str) -> Result<T> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(label.to_string()));
    }
    let body = response.text().await?;
    if !status.is_success() {
        log::warn!("Backend returned {status}: {body}");
        return Err(ApiError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_base_url_fails_fast() {
        let client = NeuraClient::new(&AppConfig::default()).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(client.base_url(), Err(ApiError::Configuration(_))));
        assert!(client.gridfs_url("abc").is_err());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            NeuraClient::with_base_url("not a url"),
            Err(ApiError::Configuration(_))
        ));
    }

    #[test]
    fn test_gridfs_url() {
        let client = NeuraClient::with_base_url("http://localhost:8000/").unwrap();
        assert_eq!(
            client.gridfs_url("64f0aa").unwrap(),
            "http://localhost:8000/api/files/gridfs/64f0aa"
        );
    }

    #[test]
    fn test_require_workspace() {
        assert!(require_workspace("  ").is_err());
        assert_eq!(require_workspace(" w1 ").unwrap(), "w1");
    }

    #[tokio::test]
    async fn test_blank_workspace_title_is_validation_error() {
        let client = NeuraClient::with_base_url("http://localhost:1").unwrap();
        let err = client.create_workspace("   ").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
