use std::sync::Arc;

use crate::facade::QueryFacade;

/// Build identifier reported by the health endpoint
pub const BUILD_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("GIT_HASH"));

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    /// Read-only view of the scanner
    pub facade: Arc<dyn QueryFacade>,
}

impl AppState {
    pub fn new(facade: Arc<dyn QueryFacade>) -> Self {
        Self { facade }
    }
}
