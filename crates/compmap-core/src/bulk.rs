use crate::eligibility;
use crate::error::{CompmapError, Result};
use crate::process::ProcessContext;
use crate::store::{NotificationKind, Notifier, ProcessStore, SubprocessStore};
use crate::types::BulkAction;
use crate::workflow::{TransitionPayload, WorkflowAction};
use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// BulkActionRequest
// ---------------------------------------------------------------------------

/// One bulk submission: apply `action` to every unit in `unit_codes`.
/// Built at submit time from the admin's selection; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkActionRequest {
    pub action: BulkAction,
    pub unit_codes: BTreeSet<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

impl BulkActionRequest {
    pub fn new(action: BulkAction, unit_codes: impl IntoIterator<Item = i64>) -> Self {
        Self {
            action,
            unit_codes: unit_codes.into_iter().collect(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.unit_codes.is_empty() {
            return Err(CompmapError::Validation(
                "bulk action needs at least one unit".to_string(),
            ));
        }
        if self.action.requires_deadline() && self.deadline.is_none() {
            return Err(CompmapError::Validation(format!(
                "bulk {} requires a deadline",
                self.action
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BulkOutcome
// ---------------------------------------------------------------------------

/// Result of a fully successful bulk execution. The refreshed context is
/// included because the successful transitions made the caller's copy
/// stale.
#[derive(Debug, Clone)]
pub struct BulkOutcome {
    pub action: BulkAction,
    pub succeeded: Vec<i64>,
    pub context: ProcessContext,
}

// ---------------------------------------------------------------------------
// BulkActionExecutor
// ---------------------------------------------------------------------------

/// Applies one workflow transition across a set of units.
///
/// Eligibility is re-checked against the store at execution time, so a
/// selection that went stale between modal-open and submit is caught here.
/// Per-unit transitions are independent and run concurrently; a unit that
/// committed stays committed even when a sibling fails (the backend already
/// persisted it, and hiding that would desynchronize the caller from
/// truth). Retries are the caller's decision.
pub struct BulkActionExecutor {
    processes: Arc<dyn ProcessStore>,
    subprocesses: Arc<dyn SubprocessStore>,
    notifier: Arc<dyn Notifier>,
}

impl BulkActionExecutor {
    pub fn new(
        processes: Arc<dyn ProcessStore>,
        subprocesses: Arc<dyn SubprocessStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            processes,
            subprocesses,
            notifier,
        }
    }

    pub async fn execute(&self, process_code: i64, request: BulkActionRequest) -> Result<BulkOutcome> {
        request.validate()?;
        let context = self.processes.fetch_context(process_code).await?;

        // Re-validate every requested unit against current eligibility.
        let mut stale = Vec::new();
        let mut jobs = Vec::new();
        for &unit in &request.unit_codes {
            let Some(sp) = context.participant_for_unit(unit) else {
                stale.push(unit);
                continue;
            };
            if !eligibility::classify(sp.situation).contains(&request.action) {
                stale.push(unit);
                continue;
            }
            let Some(action) = WorkflowAction::for_bulk(request.action, sp.situation) else {
                stale.push(unit);
                continue;
            };
            jobs.push((unit, sp.code, action));
        }

        // Fan out; the aggregate waits for every unit.
        let results = join_all(jobs.into_iter().map(|(unit, code, action)| {
            let store = Arc::clone(&self.subprocesses);
            let payload = TransitionPayload {
                deadline: request.deadline,
                note: None,
            };
            async move { (unit, store.transition(code, action, payload).await) }
        }))
        .await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (unit, result) in results {
            match result {
                Ok(_) => succeeded.push(unit),
                Err(err) => failed.push((unit, err.to_string())),
            }
        }

        tracing::info!(
            process = process_code,
            action = %request.action,
            ok = succeeded.len(),
            failed = failed.len(),
            stale = stale.len(),
            "bulk action executed"
        );

        // The successful subset made any held context stale, so refresh
        // even when reporting an error.
        let refreshed = self.processes.fetch_context(process_code).await?;

        if failed.is_empty() && stale.is_empty() {
            self.notifier
                .notify(
                    NotificationKind::Success,
                    "Bulk action",
                    &format!(
                        "{} applied to {} unit(s)",
                        request.action,
                        succeeded.len()
                    ),
                )
                .await;
            return Ok(BulkOutcome {
                action: request.action,
                succeeded,
                context: refreshed,
            });
        }

        self.notifier
            .notify(
                NotificationKind::Error,
                "Bulk action",
                &format!(
                    "{}: {} unit(s) applied, {} failed, {} no longer eligible",
                    request.action,
                    succeeded.len(),
                    failed.len(),
                    stale.len()
                ),
            )
            .await;

        if !failed.is_empty() {
            // Fold stale units in so the caller sees every non-applied unit.
            failed.extend(
                stale
                    .into_iter()
                    .map(|u| (u, "no longer eligible".to_string())),
            );
            Err(CompmapError::PartialBulkFailure { succeeded, failed })
        } else {
            Err(CompmapError::StaleEligibility { units: stale })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
