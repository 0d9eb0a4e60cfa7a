use compmap_core::bulk::BulkActionExecutor;
use compmap_core::memory::MemoryStore;
use compmap_core::store::{Notifier, ProcessStore, SubprocessStore};
use compmap_core::workflow::WorkflowEngine;
use std::sync::Arc;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(store: Arc<MemoryStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Engines are cheap façades over the shared store; building one per
    /// request keeps the state struct free of derived handles.
    pub fn engine(&self) -> WorkflowEngine {
        WorkflowEngine::new(
            self.store.clone() as Arc<dyn ProcessStore>,
            self.store.clone() as Arc<dyn SubprocessStore>,
            self.notifier.clone(),
        )
    }

    pub fn executor(&self) -> BulkActionExecutor {
        BulkActionExecutor::new(
            self.store.clone() as Arc<dyn ProcessStore>,
            self.store.clone() as Arc<dyn SubprocessStore>,
            self.notifier.clone(),
        )
    }
}
