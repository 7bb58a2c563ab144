//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use mentor_core::ports::{FileStore, ProfileStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn ProfileStore>,
    pub files: Arc<dyn FileStore>,
    pub config: Arc<Config>,
}
