//! Logging setup and shared terminal rendering resources.
//!
//! - JSON file logging with daily rotation (tracing-appender)
//! - `log` macros bridged into `tracing`
//! - Lazily loaded syntect resources for markdown code blocks

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File name prefix for the rolling log.
pub const LOG_FILE_NAME: &str = "neura.log";

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

// ============================================================================
// Static Resources (Lazy Loaded)
// ============================================================================

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

pub fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

pub fn get_theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

// ============================================================================
// Logging Initialization
// ============================================================================

/// Logs directory under the application data directory.
pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn file_writer(log_dir: &Path) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    tracing_appender::non_blocking(file_appender)
}

/// Initialize JSON file logging for TUI mode.
///
/// ratatui owns the terminal in raw/alternate-screen mode, so logs go to the
/// file only. Keep the returned guard alive until shutdown so buffered
/// records are flushed.
pub fn init_tui(data_dir: &Path) -> WorkerGuard {
    let dir = log_dir(data_dir);
    let (non_blocking, guard) = file_writer(&dir);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_filter(env_filter());

    tracing_subscriber::registry().with(file_layer).init();

    bridge_log_crate();

    log::info!(
        "Logging initialized. Writing to: {:?} (daily rolling)",
        dir.join(LOG_FILE_NAME)
    );

    guard
}

/// Route `log` macros into `tracing`.
fn bridge_log_crate() {
    // The registry may already have installed the bridge via its default features.
    let _ = tracing_log::LogTracer::init();
}
