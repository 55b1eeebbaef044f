use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::NeuraClient;
use crate::config::AppConfig;
use crate::core::content::{self, ContentSource};
use crate::core::upload::ReadinessPolicy;

use super::events::{AppEvent, Notification, NotificationLevel};

/// Centralized handle to backend services.
///
/// Created once at startup, then passed by ref to views that need backend
/// access. Everything here is cheap to clone into spawned tasks.
pub struct Services {
    pub config: AppConfig,
    pub client: NeuraClient,
    pub content: Arc<dyn ContentSource>,
    pub readiness: ReadinessPolicy,
    pub event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Services {
    /// Build services from config.
    ///
    /// A missing backend URL is not fatal: the views report it when a
    /// request is attempted. A malformed URL or unreadable content bundle is.
    pub fn init(
        config: AppConfig,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let client = NeuraClient::new(&config)?;
        match client.base_url() {
            Ok(url) => log::info!("Backend: {url}"),
            Err(e) => log::warn!("{e}"),
        }

        let content = content::from_config(&config, &client)?;
        let readiness = ReadinessPolicy::from(&config.upload);

        Ok(Self {
            config,
            client,
            content,
            readiness,
            event_tx,
        })
    }

    /// Queue a notification for the overlay.
    pub fn notify(&self, message: impl Into<String>, level: NotificationLevel) {
        let _ = self
            .event_tx
            .send(AppEvent::Notification(Notification::new(message, level)));
    }
}
