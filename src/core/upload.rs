//! Upload flow: staged files -> backend study guides -> overview.
//!
//! ```text
//! Idle ──submit──▶ Submitting ──all uploaded + readiness──▶ Succeeded
//!   ▲                  │
//!   │ cancel           └──non-2xx / network──▶ Failed
//! ```
//!
//! Each staged file is posted separately, in order. A file leaves the store
//! as soon as its upload succeeds, so a failure mid-batch leaves exactly the
//! files that still need uploading. The background task never touches the
//! store; it reports through a channel drained by [`UploadFlow::poll`].

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::api::{ApiError, NeuraClient};
use crate::config::UploadConfig;
use crate::core::staging::FileStore;

/// Where the flow currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Submitting { total: usize, done: usize },
    Failed(String),
    Succeeded { study_guide_ids: Vec<String> },
}

/// One file of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub staged_id: String,
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub workspace_id: String,
    pub items: Vec<UploadItem>,
}

/// How long to wait for created study guides to become listable.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessPolicy {
    pub interval: Duration,
    /// Zero skips the check; the result is then reported as not ready.
    pub max_attempts: u32,
}

impl From<&UploadConfig> for ReadinessPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.max_readiness_attempts,
        }
    }
}

/// Progress reported by the background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    FileUploaded {
        staged_id: String,
        study_guide_id: String,
    },
    Failed {
        message: String,
    },
    Completed {
        workspace_id: String,
        study_guide_ids: Vec<String>,
        ready: bool,
    },
}

/// Navigation request produced when a submission completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFinished {
    pub workspace_id: String,
    pub study_guide_ids: Vec<String>,
    /// False when readiness polling gave up.
    pub ready: bool,
}

pub struct UploadFlow {
    phase: UploadPhase,
    /// Incremented per submission; events from older batches are dropped.
    batch: u64,
    cancel: Option<CancellationToken>,
    tx: mpsc::UnboundedSender<(u64, UploadEvent)>,
    rx: mpsc::UnboundedReceiver<(u64, UploadEvent)>,
}

impl UploadFlow {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            phase: UploadPhase::Idle,
            batch: 0,
            cancel: None,
            tx,
            rx,
        }
    }

    pub fn phase(&self) -> &UploadPhase {
        &self.phase
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, UploadPhase::Submitting { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            UploadPhase::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Check preconditions and build a plan covering every staged file.
    ///
    /// Fails without any network call when the backend URL or workspace id
    /// is missing, nothing is staged, or a submission is already running.
    pub fn begin(
        &mut self,
        client: &NeuraClient,
        workspace_id: Option<&str>,
        store: &FileStore,
    ) -> Result<UploadPlan, ApiError> {
        if self.is_submitting() {
            return Err(ApiError::Validation("upload already in progress".to_string()));
        }

        let result = Self::plan(client, workspace_id, store);
        if let Err(ref e) = result {
            log::warn!("Upload rejected: {e}");
            self.phase = UploadPhase::Failed(e.to_string());
        }
        result
    }

    fn plan(
        client: &NeuraClient,
        workspace_id: Option<&str>,
        store: &FileStore,
    ) -> Result<UploadPlan, ApiError> {
        client.base_url()?;
        let workspace_id = workspace_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(ApiError::missing_workspace)?;
        if store.is_empty() {
            return Err(ApiError::Validation(
                "select at least one file before generating".to_string(),
            ));
        }

        let items = store
            .files()
            .iter()
            .map(|f| UploadItem {
                staged_id: f.id.clone(),
                path: f.path.clone(),
                name: f.name.clone(),
                mime_type: f.mime_type.clone(),
            })
            .collect();

        Ok(UploadPlan {
            workspace_id: workspace_id.to_string(),
            items,
        })
    }

    /// Spawn the upload task for `plan`.
    pub fn start(&mut self, client: NeuraClient, plan: UploadPlan, readiness: ReadinessPolicy) {
        self.batch += 1;
        let batch = self.batch;
        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());
        self.phase = UploadPhase::Submitting {
            total: plan.items.len(),
            done: 0,
        };

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // Tag events with the batch they belong to.
            let forward = async {
                while let Some(event) = event_rx.recv().await {
                    let _ = tx.send((batch, event));
                }
            };
            let run = run_upload(client, plan, readiness, event_tx, cancel);
            tokio::join!(run, forward);
        });
    }

    /// Abort the running submission. Files not yet uploaded stay staged.
    pub fn cancel(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if self.is_submitting() {
            log::info!("Upload cancelled by user");
            self.phase = UploadPhase::Idle;
        }
    }

    /// Acknowledge a failure or success and return to idle.
    pub fn reset(&mut self) {
        if !self.is_submitting() {
            self.phase = UploadPhase::Idle;
        }
    }

    /// Drain task events, applying them to `store`. Call from on_tick.
    pub fn poll(&mut self, store: &mut FileStore) -> Option<UploadFinished> {
        let mut finished = None;
        while let Ok((batch, event)) = self.rx.try_recv() {
            if batch != self.batch || !self.is_submitting() {
                // A file the server accepted leaves the store even after a cancel.
                if let UploadEvent::FileUploaded { staged_id, .. } = event {
                    store.remove_file(&staged_id);
                }
                continue;
            }
            if let Some(done) = self.apply(event, store) {
                finished = Some(done);
            }
        }
        finished
    }

    fn apply(&mut self, event: UploadEvent, store: &mut FileStore) -> Option<UploadFinished> {
        match event {
            UploadEvent::FileUploaded { staged_id, .. } => {
                store.remove_file(&staged_id);
                if let UploadPhase::Submitting { ref mut done, .. } = self.phase {
                    *done += 1;
                }
                None
            }
            UploadEvent::Failed { message } => {
                self.cancel = None;
                self.phase = UploadPhase::Failed(message);
                None
            }
            UploadEvent::Completed {
                workspace_id,
                study_guide_ids,
                ready,
            } => {
                self.cancel = None;
                self.phase = UploadPhase::Succeeded {
                    study_guide_ids: study_guide_ids.clone(),
                };
                Some(UploadFinished {
                    workspace_id,
                    study_guide_ids,
                    ready,
                })
            }
        }
    }
}

impl Default for UploadFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for UploadFlow {
    fn drop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

/// Upload every item, then wait for readiness. Stops at the first failure.
///
/// Events go to `tx`; nothing is sent after `cancel` fires.
#[instrument(skip_all, fields(workspace = %plan.workspace_id, files = plan.items.len()))]
pub async fn run_upload(
    client: NeuraClient,
    plan: UploadPlan,
    readiness: ReadinessPolicy,
    tx: mpsc::UnboundedSender<UploadEvent>,
    cancel: CancellationToken,
) {
    tokio::select! {
        _ = cancel.cancelled() => {
            log::info!("Upload to workspace {} cancelled", plan.workspace_id);
        }
        _ = upload_all(&client, &plan, readiness, &tx) => {}
    }
}

async fn upload_all(
    client: &NeuraClient,
    plan: &UploadPlan,
    readiness: ReadinessPolicy,
    tx: &mpsc::UnboundedSender<UploadEvent>,
) {
    let mut created = Vec::with_capacity(plan.items.len());

    for item in &plan.items {
        let result = client
            .upload_study_guide(&plan.workspace_id, &item.path, &item.name, &item.mime_type)
            .await;

        match result {
            Ok(guide) => {
                log::info!("Uploaded {} -> study guide {}", item.name, guide.id);
                created.push(guide.id.clone());
                let _ = tx.send(UploadEvent::FileUploaded {
                    staged_id: item.staged_id.clone(),
                    study_guide_id: guide.id,
                });
            }
            Err(e) => {
                log::error!("Upload of {} failed: {e}", item.name);
                let message = match e {
                    ApiError::Http { body, .. } if !body.is_empty() => body,
                    other => other.to_string(),
                };
                let _ = tx.send(UploadEvent::Failed { message });
                return;
            }
        }
    }

    let ready = wait_until_ready(client, &plan.workspace_id, &created, readiness).await;
    if !ready {
        log::warn!("Study guides {created:?} not listed yet; navigating anyway");
    }

    let _ = tx.send(UploadEvent::Completed {
        workspace_id: plan.workspace_id.clone(),
        study_guide_ids: created,
        ready,
    });
}

/// Poll the workspace's study-guide list until every id in `ids` appears.
pub async fn wait_until_ready(
    client: &NeuraClient,
    workspace_id: &str,
    ids: &[String],
    policy: ReadinessPolicy,
) -> bool {
    for attempt in 1..=policy.max_attempts {
        match client.list_study_guides(workspace_id).await {
            Ok(guides) => {
                if ids.iter().all(|id| guides.iter().any(|g| &g.id == id)) {
                    log::debug!("Study guides ready after {attempt} check(s)");
                    return true;
                }
            }
            Err(e) => log::debug!("Readiness check {attempt} failed: {e}"),
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    false
}
