//! Shared handler state.

use std::sync::Arc;

use rpindex_core::{LookupService, SyncEngine};

#[derive(Clone)]
pub struct AppState {
    pub lookup: LookupService,
    /// Read-only here: handlers only ask for the cursor and whether a run is active.
    pub engine: Arc<SyncEngine>,
}

impl AppState {
    pub fn new(lookup: LookupService, engine: Arc<SyncEngine>) -> Self {
        Self { lookup, engine }
    }
}
