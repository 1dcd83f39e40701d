use quartz::{MetadataLedger, ObjectStore};
use std::sync::Arc;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ObjectStore>,
    pub ledger: Arc<MetadataLedger>,
}

impl AppState {
    pub fn new(store: Arc<ObjectStore>, ledger: Arc<MetadataLedger>) -> Self {
        Self { store, ledger }
    }
}
