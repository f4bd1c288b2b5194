//! Shared application state for the Axum API server.

use std::sync::Arc;

use herald_engine::intake::IntakeCoordinator;
use herald_engine::queue::DispatchQueue;
use herald_engine::store::RecordStore;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub intake: IntakeCoordinator,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, queue: Arc<dyn DispatchQueue>) -> Self {
        Self {
            intake: IntakeCoordinator::new(store, queue),
        }
    }
}
