//! Labtrack laboratory equipment server
//!
//! Tracks each equipment unit through check-out, return, maintenance and loss,
//! recording every scan in an append-only ledger grouped by tracking code.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
