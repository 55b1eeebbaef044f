//! Quiz and FAQ content.
//!
//! The backend does not generate quiz or FAQ material yet, so the default
//! source is a bundled sample. `content.source = "remote"` switches to the
//! per-workspace endpoints.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::api::client::require_workspace;
use crate::api::{ApiError, NeuraClient, Result};
use crate::config::{AppConfig, ContentSourceKind};
use crate::core::quiz::QuizQuestion;

const SAMPLE_CONTENT: &str = include_str!("../../assets/sample_content.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Human-readable name for status lines.
    fn name(&self) -> &'static str;

    async fn quiz(&self, workspace_id: &str) -> Result<Vec<QuizQuestion>>;

    async fn faq(&self, workspace_id: &str) -> Result<Vec<FaqEntry>>;
}

/// Build the source selected by configuration.
pub fn from_config(config: &AppConfig, client: &NeuraClient) -> Result<Arc<dyn ContentSource>> {
    let source: Arc<dyn ContentSource> = match config.content.source {
        ContentSourceKind::Static => Arc::new(StaticContent::bundled()?),
        ContentSourceKind::Remote => Arc::new(RemoteContent::new(client.clone())),
    };
    log::info!("Using {} quiz/FAQ content", source.name());
    Ok(source)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ContentBundle {
    #[serde(default)]
    quiz: Vec<QuizQuestion>,
    #[serde(default)]
    faq: Vec<FaqEntry>,
}

/// Fixed content, identical for every workspace.
#[derive(Debug, Clone)]
pub struct StaticContent {
    bundle: ContentBundle,
}

impl StaticContent {
    pub fn bundled() -> Result<Self> {
        Self::from_json(SAMPLE_CONTENT)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let bundle: ContentBundle = serde_json::from_str(json)?;
        Ok(Self { bundle })
    }
}

#[async_trait]
impl ContentSource for StaticContent {
    fn name(&self) -> &'static str {
        "bundled"
    }

    async fn quiz(&self, _workspace_id: &str) -> Result<Vec<QuizQuestion>> {
        Ok(self.bundle.quiz.clone())
    }

    async fn faq(&self, _workspace_id: &str) -> Result<Vec<FaqEntry>> {
        Ok(self.bundle.faq.clone())
    }
}

/// `GET /api/workspaces/{id}/quiz` and `GET /api/workspaces/{id}/faq`.
#[derive(Debug, Clone)]
pub struct RemoteContent {
    client: NeuraClient,
}

impl RemoteContent {
    pub fn new(client: NeuraClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentSource for RemoteContent {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn quiz(&self, workspace_id: &str) -> Result<Vec<QuizQuestion>> {
        let id = require_workspace(workspace_id)?;
        self.client
            .get_json(&format!("/api/workspaces/{id}/quiz"), "Quiz")
            .await
    }

    async fn faq(&self, workspace_id: &str) -> Result<Vec<FaqEntry>> {
        let id = require_workspace(workspace_id)?;
        self.client
            .get_json(&format!("/api/workspaces/{id}/faq"), "FAQ")
            .await
    }
}

/// Tracks a single in-flight content request for a view.
pub enum ContentLoad<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> ContentLoad<T> {
    pub fn from_result(result: std::result::Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) => {
                log::warn!("Content load failed: {e}");
                Self::Failed(e.to_string())
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Owns the cancellation token of a view's background request.
///
/// Spawning through the slot cancels the request it spawned before, and
/// dropping the slot cancels the last one.
#[derive(Default)]
pub struct RequestSlot {
    cancel: Option<CancellationToken>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = request => {}
            }
        });
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.cancel.take() {
            log::debug!("Cancelling pending request");
            token.cancel();
        }
    }

    /// Forget the token once the response has been received.
    pub fn finish(&mut self) {
        self.cancel = None;
    }

    pub fn is_pending(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for RequestSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bundled_content_parses() {
        let content = StaticContent::bundled().unwrap();
        let quiz = content.quiz("any").await.unwrap();
        assert_eq!(quiz.len(), 5);
        assert!(quiz.iter().all(|q| q.correct_answer < q.options.len()));
        assert!(!content.faq("any").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_static_content_ignores_workspace() {
        let content = StaticContent::from_json(
            r#"{"faq":[{"question":"Q","answer":"A"}]}"#,
        )
        .unwrap();
        assert!(content.quiz("w1").await.unwrap().is_empty());
        assert_eq!(content.faq("w2").await.unwrap()[0].answer, "A");
    }

    #[test]
    fn test_malformed_bundle_is_parse_error() {
        assert!(matches!(
            StaticContent::from_json("{"),
            Err(ApiError::Parsing(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_requires_workspace() {
        let client = NeuraClient::with_base_url("http://127.0.0.1:9").unwrap();
        let remote = RemoteContent::new(client);
        assert!(matches!(remote.quiz("  ").await, Err(ApiError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_request_slot_cancels_previous_and_on_drop() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut slot = RequestSlot::new();

        let first = tx.clone();
        slot.spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            let _ = first.send("first");
        });
        let second = tx.clone();
        slot.spawn(async move {
            let _ = second.send("second");
        });
        assert!(slot.is_pending());

        let third = tx.clone();
        let mut dropped = RequestSlot::new();
        dropped.spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            let _ = third.send("third");
        });
        drop(dropped);
        drop(tx);

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        slot.finish();
        assert!(!slot.is_pending());
        let mut received = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            received.push(msg);
        }
        assert_eq!(received, vec!["second"]);
    }

    #[test]
    fn test_from_config_selects_source() {
        let client = NeuraClient::with_base_url("http://127.0.0.1:9").unwrap();
        let mut config = AppConfig::default();
        assert_eq!(from_config(&config, &client).unwrap().name(), "bundled");
        config.content.source = ContentSourceKind::Remote;
        assert_eq!(from_config(&config, &client).unwrap().name(), "remote");
    }
}
