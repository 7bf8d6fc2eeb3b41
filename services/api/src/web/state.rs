//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use tutorlink_core::ports::StoreService;

/// The shared application state, created once at startup and passed to all
/// handlers. Handlers only see the store port, never the concrete adapter.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StoreService>,
    pub config: Arc<Config>,
}
