//! Neura backend REST API: client, wire models, and error taxonomy.

pub mod client;
pub mod error;
pub mod models;

pub use client::NeuraClient;
pub use error::{ApiError, Result};
