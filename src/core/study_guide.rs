//! Workspace overview loading and study-guide helpers.
//!
//! One study guide is shown per workspace: the first the backend returns.
//! Image filenames referenced by sections resolve through the guide's
//! `extracted_images`; anything unresolved is simply not shown.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::models::{StudyGuide, Workspace};
use crate::api::{ApiError, NeuraClient};

/// DOM-style anchor key for a section.
pub fn section_anchor(section_id: &str) -> String {
    format!("section-{section_id}")
}

/// The study guide to display for a workspace.
pub fn select_study_guide(workspace: &Workspace) -> Option<&StudyGuide> {
    workspace.study_guides.first()
}

/// `{base}/api/files/gridfs/{storage_id}` for `filename`, if it resolves.
pub fn resolve_image_url(base_url: &str, guide: &StudyGuide, filename: &str) -> Option<String> {
    guide
        .extracted_images
        .iter()
        .find(|img| img.filename == filename)
        .and_then(|img| img.gridfs_id.as_deref())
        .filter(|id| !id.is_empty())
        .map(|id| format!("{}/api/files/gridfs/{id}", base_url.trim_end_matches('/')))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub filename: String,
    pub url: String,
    pub page_number: Option<u32>,
}

/// Resolve every filename, dropping those without a storage id.
pub fn resolve_images(base_url: &str, guide: &StudyGuide, filenames: &[String]) -> Vec<ResolvedImage> {
    filenames
        .iter()
        .filter_map(|name| {
            let url = resolve_image_url(base_url, guide, name)?;
            let page_number = guide
                .extracted_images
                .iter()
                .find(|img| &img.filename == name)
                .and_then(|img| img.page_number);
            Some(ResolvedImage {
                filename: name.clone(),
                url,
                page_number,
            })
        })
        .collect()
}

/// Overview load state.
#[derive(Debug, Clone, PartialEq)]
pub enum OverviewPhase {
    /// No workspace selected yet.
    Idle,
    Loading,
    Error(String),
    /// Workspace exists but has no study guides.
    Empty { workspace_title: String },
    Loaded {
        workspace_title: String,
        guide: StudyGuide,
    },
}

impl OverviewPhase {
    pub fn from_result(result: Result<Workspace, ApiError>) -> Self {
        match result {
            Ok(mut workspace) => {
                if workspace.study_guides.is_empty() {
                    return Self::Empty {
                        workspace_title: workspace.title,
                    };
                }
                let guide = workspace.study_guides.swap_remove(0);
                Self::Loaded {
                    workspace_title: workspace.title,
                    guide,
                }
            }
            Err(ApiError::NotFound(_)) => Self::Error("Workspace not found".to_string()),
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

/// Fetches the workspace behind the overview, keyed by workspace id.
///
/// Changing the id cancels the in-flight request and discards any response
/// still queued for the previous id.
pub struct OverviewLoader {
    workspace_id: Option<String>,
    phase: OverviewPhase,
    generation: u64,
    cancel: Option<CancellationToken>,
    tx: mpsc::UnboundedSender<(u64, Result<Workspace, ApiError>)>,
    rx: mpsc::UnboundedReceiver<(u64, Result<Workspace, ApiError>)>,
}

impl OverviewLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            workspace_id: None,
            phase: OverviewPhase::Idle,
            generation: 0,
            cancel: None,
            tx,
            rx,
        }
    }

    pub fn phase(&self) -> &OverviewPhase {
        &self.phase
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, OverviewPhase::Loading)
    }

    /// Point at `workspace_id`, fetching if it differs from the current one.
    /// Returns whether a fetch was started.
    pub fn set_workspace(&mut self, client: &NeuraClient, workspace_id: &str) -> bool {
        if self.workspace_id.as_deref() == Some(workspace_id) {
            return false;
        }
        self.workspace_id = Some(workspace_id.to_string());
        self.refresh(client);
        true
    }

    /// Refetch the current workspace, replacing any in-flight request.
    pub fn refresh(&mut self, client: &NeuraClient) {
        let Some(workspace_id) = self.workspace_id.clone() else {
            return;
        };

        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.generation += 1;
        self.phase = OverviewPhase::Loading;

        let generation = self.generation;
        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());
        let client = client.clone();
        let tx = self.tx.clone();

        log::debug!("Loading overview for workspace {workspace_id} (gen {generation})");
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = client.get_workspace(&workspace_id) => {
                    let _ = tx.send((generation, result));
                }
            }
        });
    }

    /// Drain results. Call from on_tick. Returns true if the phase changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok((generation, result)) = self.rx.try_recv() {
            if generation != self.generation {
                log::debug!("Dropping stale overview response (gen {generation})");
                continue;
            }
            if let Err(ref e) = result {
                log::warn!("Overview load failed: {e}");
            }
            self.cancel = None;
            self.phase = OverviewPhase::from_result(result);
            changed = true;
        }
        changed
    }
}

impl Default for OverviewLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OverviewLoader {
    fn drop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ExtractedImage;

    fn guide_with_images(images: Vec<ExtractedImage>) -> StudyGuide {
        StudyGuide {
            id: "g1".into(),
            original_filename: "paper.pdf".into(),
            workspace_id: None,
            original_pdf_gridfs_id: None,
            extracted_images: images,
            sections: Vec::new(),
        }
    }

    fn image(name: &str, gridfs: Option<&str>) -> ExtractedImage {
        ExtractedImage {
            filename: name.into(),
            page_number: Some(3),
            gridfs_id: gridfs.map(String::from),
        }
    }

    #[test]
    fn test_resolve_image_url_found() {
        let guide = guide_with_images(vec![image("fig1.png", Some("64f0abc"))]);
        assert_eq!(
            resolve_image_url("http://api:8000/", &guide, "fig1.png").as_deref(),
            Some("http://api:8000/api/files/gridfs/64f0abc")
        );
    }

    #[test]
    fn test_resolve_image_url_missing_entry_or_id() {
        let guide = guide_with_images(vec![image("fig1.png", None)]);
        assert!(resolve_image_url("http://api", &guide, "fig1.png").is_none());
        assert!(resolve_image_url("http://api", &guide, "fig2.png").is_none());
    }

    #[test]
    fn test_resolve_images_drops_unresolved() {
        let guide = guide_with_images(vec![image("a.png", Some("1")), image("b.png", None)]);
        let names = vec!["a.png".to_string(), "b.png".to_string(), "c.png".to_string()];
        let resolved = resolve_images("http://api", &guide, &names);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].filename, "a.png");
        assert_eq!(resolved[0].page_number, Some(3));
    }

    #[test]
    fn test_phase_empty_workspace() {
        let ws = Workspace {
            id: "w1".into(),
            title: "Graphs".into(),
            description: None,
            created_at: None,
            study_guides: Vec::new(),
        };
        assert_eq!(
            OverviewPhase::from_result(Ok(ws)),
            OverviewPhase::Empty {
                workspace_title: "Graphs".into()
            }
        );
    }

    #[test]
    fn test_phase_selects_first_guide() {
        let mut second = guide_with_images(Vec::new());
        second.id = "g2".into();
        let ws = Workspace {
            id: "w1".into(),
            title: "Graphs".into(),
            description: None,
            created_at: None,
            study_guides: vec![guide_with_images(Vec::new()), second],
        };
        assert_eq!(select_study_guide(&ws).map(|g| g.id.as_str()), Some("g1"));
        match OverviewPhase::from_result(Ok(ws)) {
            OverviewPhase::Loaded { guide, .. } => assert_eq!(guide.id, "g1"),
            other => panic!("unexpected phase {other:?}"),
        }
    }

    #[test]
    fn test_phase_not_found_and_http() {
        assert_eq!(
            OverviewPhase::from_result(Err(ApiError::NotFound("Workspace".into()))),
            OverviewPhase::Error("Workspace not found".into())
        );
        assert_eq!(
            OverviewPhase::from_result(Err(ApiError::Http {
                status: 503,
                body: "db down".into()
            })),
            OverviewPhase::Error("HTTP 503: db down".into())
        );
    }

    #[test]
    fn test_section_anchor() {
        assert_eq!(section_anchor("abc"), "section-abc");
    }

    #[tokio::test]
    async fn test_same_workspace_does_not_refetch() {
        let client = NeuraClient::with_base_url("http://127.0.0.1:9").unwrap();
        let mut loader = OverviewLoader::new();
        assert!(loader.set_workspace(&client, "w1"));
        assert!(loader.is_loading());
        assert!(!loader.set_workspace(&client, "w1"));
        assert!(loader.set_workspace(&client, "w2"));
        assert_eq!(loader.workspace_id(), Some("w2"));
    }

    #[tokio::test]
    async fn test_stale_generation_dropped() {
        let client = NeuraClient::with_base_url("http://127.0.0.1:9").unwrap();
        let mut loader = OverviewLoader::new();
        loader.set_workspace(&client, "w1");
        let stale = loader.generation - 1;
        loader
            .tx
            .send((stale, Err(ApiError::NotFound("Workspace".into()))))
            .unwrap();
        assert!(!loader.poll());
        assert!(loader.is_loading());
    }
}
