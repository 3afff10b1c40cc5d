//! Biblio library lending server
//!
//! REST JSON API for a network of libraries: borrowers, the media catalog
//! (books, magazines, DVDs, articles), authors, loans and late-return fines.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}
