use crate::error::Result;
use crate::process::{ProcessContext, Subprocess};
use crate::unit::Unit;
use crate::workflow::{TransitionPayload, WorkflowAction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Store traits
// ---------------------------------------------------------------------------
//
// The core never talks to a backend directly; it goes through these
// collaborator traits so they can be swapped for test doubles or a remote
// client. `MemoryStore` (memory.rs) is the reference implementation.

#[async_trait]
pub trait ProcessStore: Send + Sync {
    /// Full context for one process: the process, every participating
    /// subprocess with its current situation, and the capability flags.
    async fn fetch_context(&self, process_code: i64) -> Result<ProcessContext>;

    /// Start a created process against the given units, creating one
    /// subprocess per unit.
    async fn start_process(&self, process_code: i64, unit_codes: &[i64]) -> Result<ProcessContext>;

    /// Mark the process finished. Eligibility is the workflow engine's job;
    /// the store only commits.
    async fn finalize_process(&self, process_code: i64) -> Result<()>;

    /// Make a map the one in force for a unit, archiving any prior map.
    async fn set_effective_map(&self, unit_code: i64, map_code: i64) -> Result<()>;
}

#[async_trait]
pub trait SubprocessStore: Send + Sync {
    async fn fetch(&self, subprocess_code: i64) -> Result<Subprocess>;

    /// Apply one workflow transition. The store is the authority on
    /// situation preconditions and either commits fully or fails with
    /// `InvalidTransition`; it never partially mutates.
    async fn transition(
        &self,
        subprocess_code: i64,
        action: WorkflowAction,
        payload: TransitionPayload,
    ) -> Result<Subprocess>;
}

#[async_trait]
pub trait UnitStore: Send + Sync {
    /// The unit forest under the given roots; all roots when empty.
    async fn fetch_tree(&self, root_codes: &[i64]) -> Result<Vec<Unit>>;
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Feedback collaborator. Delivery (toast, email) is out of scope; the core
/// only emits.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, kind: NotificationKind, title: &str, message: &str);
}

/// Notifier that forwards to the tracing subscriber. Good enough for the
/// server binary, where notifications surface as log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, kind: NotificationKind, title: &str, message: &str) {
        match kind {
            NotificationKind::Success => tracing::info!(title, message, "notification"),
            NotificationKind::Error => tracing::warn!(title, message, "notification"),
        }
    }
}
