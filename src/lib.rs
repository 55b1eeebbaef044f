/// Neura - Study Guide Client (TUI Edition)
///
/// Core library providing workspace browsing, document upload, and
/// study-guide, quiz, and FAQ viewing against the Neura backend.

pub mod api;
pub mod config;
pub mod core;
pub mod tui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
