//! Biblios Library Catalog and Lending Server
//!
//! A Rust backend for library catalog and lending administration, providing
//! a REST JSON API for books, users, and borrow transactions. Inventory
//! bookkeeping (book availability vs. outstanding borrow lines) is the
//! system's core responsibility.

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
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
