use crate::error::{CompmapError, Result};
use crate::process::{Process, ProcessCapabilities, ProcessContext, Subprocess};
use crate::situation::Situation;
use crate::store::{NotificationKind, Notifier, ProcessStore, SubprocessStore, UnitStore};
use crate::types::{ProcessKind, ProcessStatus};
use crate::unit::{Unit, UnitTree};
use crate::workflow::{invalid_transition, next_situation, TransitionPayload, WorkflowAction};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::{Mutex, RwLock};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory implementation of every store collaborator. Backs the tests
/// and the server binary; a deployment against a real backend would swap in
/// remote implementations of the same traits.
///
/// The store is the transition authority: it enforces situation
/// preconditions through the pure transition table and commits atomically
/// per subprocess.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

struct Inner {
    tree: UnitTree,
    processes: BTreeMap<i64, StoredProcess>,
    subprocesses: BTreeMap<i64, Subprocess>,
    /// unit code → map currently in force
    effective_maps: BTreeMap<i64, i64>,
    /// unit code → maps previously in force, oldest first
    archived_maps: BTreeMap<i64, Vec<i64>>,
    next_subprocess_code: i64,
}

struct StoredProcess {
    process: Process,
    capabilities: ProcessCapabilities,
}

impl MemoryStore {
    pub fn new(tree: UnitTree) -> Self {
        Self {
            inner: RwLock::new(Inner {
                tree,
                processes: BTreeMap::new(),
                subprocesses: BTreeMap::new(),
                effective_maps: BTreeMap::new(),
                archived_maps: BTreeMap::new(),
                next_subprocess_code: 1,
            }),
        }
    }

    pub async fn insert_process(&self, process: Process, capabilities: ProcessCapabilities) {
        let mut inner = self.inner.write().await;
        inner.processes.insert(
            process.code,
            StoredProcess {
                process,
                capabilities,
            },
        );
    }

    /// Seed or overwrite a subprocess directly. Models mutations owned by
    /// external collaborators (and keeps test setup short).
    pub async fn put_subprocess(&self, subprocess: Subprocess) {
        let mut inner = self.inner.write().await;
        inner.next_subprocess_code = inner.next_subprocess_code.max(subprocess.code + 1);
        inner.subprocesses.insert(subprocess.code, subprocess);
    }

    /// The cataloguing collaborator's first write: a unit that starts
    /// recording activities moves out of `NotStarted`.
    pub async fn begin_registration(&self, subprocess_code: i64) -> Result<Subprocess> {
        let mut inner = self.inner.write().await;
        let kind = inner.process_kind_for(subprocess_code)?;
        let sp = inner.subprocess_mut(subprocess_code)?;
        if sp.situation != Situation::NotStarted {
            return Ok(sp.clone());
        }
        sp.situation = match kind {
            ProcessKind::Mapping => Situation::RegistrationInProgress,
            ProcessKind::Revision => Situation::RevisionRegistrationInProgress,
            ProcessKind::Diagnostic => {
                return Err(CompmapError::Validation(
                    "diagnostic subprocesses have no registration step".to_string(),
                ))
            }
        };
        Ok(sp.clone())
    }

    /// The map-authoring collaborator's edge: attaching the first authored
    /// competency map moves a homologated registration to `MapCreated`.
    pub async fn record_map(&self, subprocess_code: i64, map_code: i64) -> Result<Subprocess> {
        let mut inner = self.inner.write().await;
        let sp = inner.subprocess_mut(subprocess_code)?;
        sp.map_code = Some(map_code);
        if sp.situation == Situation::RegistrationHomologated {
            sp.situation = Situation::MapCreated;
        }
        Ok(sp.clone())
    }

    pub async fn effective_map(&self, unit_code: i64) -> Option<i64> {
        self.inner.read().await.effective_maps.get(&unit_code).copied()
    }

    pub async fn archived_maps(&self, unit_code: i64) -> Vec<i64> {
        self.inner
            .read()
            .await
            .archived_maps
            .get(&unit_code)
            .cloned()
            .unwrap_or_default()
    }
}

impl Inner {
    fn subprocess_mut(&mut self, code: i64) -> Result<&mut Subprocess> {
        self.subprocesses
            .get_mut(&code)
            .ok_or(CompmapError::SubprocessNotFound(code))
    }

    fn process_kind_for(&self, subprocess_code: i64) -> Result<ProcessKind> {
        let sp = self
            .subprocesses
            .get(&subprocess_code)
            .ok_or(CompmapError::SubprocessNotFound(subprocess_code))?;
        let stored = self
            .processes
            .get(&sp.process_code)
            .ok_or(CompmapError::ProcessNotFound(sp.process_code))?;
        Ok(stored.process.kind)
    }

    fn context(&self, process_code: i64) -> Result<ProcessContext> {
        let stored = self
            .processes
            .get(&process_code)
            .ok_or(CompmapError::ProcessNotFound(process_code))?;
        let participants = self
            .subprocesses
            .values()
            .filter(|sp| sp.process_code == process_code)
            .cloned()
            .collect();
        Ok(ProcessContext {
            process: stored.process.clone(),
            participants,
            capabilities: stored.capabilities,
        })
    }
}

// ---------------------------------------------------------------------------
// Store implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl ProcessStore for MemoryStore {
    async fn fetch_context(&self, process_code: i64) -> Result<ProcessContext> {
        self.inner.read().await.context(process_code)
    }

    async fn start_process(&self, process_code: i64, unit_codes: &[i64]) -> Result<ProcessContext> {
        let mut inner = self.inner.write().await;

        for &unit in unit_codes {
            if !inner.tree.contains(unit) {
                return Err(CompmapError::UnitNotFound(unit));
            }
        }
        let stored = inner
            .processes
            .get_mut(&process_code)
            .ok_or(CompmapError::ProcessNotFound(process_code))?;
        if stored.process.status != ProcessStatus::Created {
            return Err(CompmapError::Validation(format!(
                "process {} already started",
                process_code
            )));
        }
        stored.process.status = ProcessStatus::InProgress;
        let deadline = stored.process.deadline;

        for &unit in unit_codes {
            let code = inner.next_subprocess_code;
            inner.next_subprocess_code += 1;
            inner.subprocesses.insert(
                code,
                Subprocess {
                    code,
                    process_code,
                    unit_code: unit,
                    situation: Situation::NotStarted,
                    location_code: unit,
                    map_code: None,
                    deadline,
                },
            );
        }
        inner.context(process_code)
    }

    async fn finalize_process(&self, process_code: i64) -> Result<()> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .processes
            .get_mut(&process_code)
            .ok_or(CompmapError::ProcessNotFound(process_code))?;
        if stored.process.status != ProcessStatus::InProgress {
            return Err(CompmapError::Validation(format!(
                "process {} is not in progress",
                process_code
            )));
        }
        stored.process.status = ProcessStatus::Finished;
        Ok(())
    }

    async fn set_effective_map(&self, unit_code: i64, map_code: i64) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.tree.contains(unit_code) {
            return Err(CompmapError::UnitNotFound(unit_code));
        }
        if let Some(previous) = inner.effective_maps.insert(unit_code, map_code) {
            inner.archived_maps.entry(unit_code).or_default().push(previous);
        }
        Ok(())
    }
}

#[async_trait]
impl SubprocessStore for MemoryStore {
    async fn fetch(&self, subprocess_code: i64) -> Result<Subprocess> {
        self.inner
            .read()
            .await
            .subprocesses
            .get(&subprocess_code)
            .cloned()
            .ok_or(CompmapError::SubprocessNotFound(subprocess_code))
    }

    async fn transition(
        &self,
        subprocess_code: i64,
        action: WorkflowAction,
        payload: TransitionPayload,
    ) -> Result<Subprocess> {
        let mut inner = self.inner.write().await;
        let kind = inner.process_kind_for(subprocess_code)?;
        let sp = inner
            .subprocesses
            .get(&subprocess_code)
            .cloned()
            .ok_or(CompmapError::SubprocessNotFound(subprocess_code))?;

        payload.validate_for(action)?;
        let at_top = inner.tree.parent_of(sp.location_code).is_none();
        let next = next_situation(kind, action, sp.situation, at_top)
            .ok_or_else(|| invalid_transition(&sp, action))?;

        // Compute the new review location before committing anything.
        let unit = sp.unit_code;
        let up_from_unit = inner.tree.parent_of(unit).unwrap_or(unit);
        let up_from_location = inner.tree.parent_of(sp.location_code).unwrap_or(sp.location_code);
        let top = inner
            .tree
            .ancestors_of(unit)
            .last()
            .copied()
            .unwrap_or(unit);

        let committed = {
            let stored = inner.subprocess_mut(subprocess_code)?;
            use WorkflowAction::*;
            match action {
                MakeRegistrationAvailable | ValidateMap | SuggestMapChanges => {
                    stored.location_code = up_from_unit;
                }
                AcceptRegistration => {
                    stored.location_code = up_from_location;
                }
                AcceptMapValidation => {
                    if !at_top {
                        stored.location_code = up_from_location;
                    }
                }
                HomologateRegistration | HomologateMap => {
                    stored.location_code = top;
                }
                ReturnRegistration | ReturnValidation | ReopenRegistration | AdjustMap => {
                    stored.location_code = unit;
                }
                MakeMapAvailable => {
                    stored.location_code = unit;
                    if let Some(deadline) = payload.deadline {
                        stored.deadline = deadline;
                    }
                }
                ChangeDeadline => {
                    if let Some(deadline) = payload.deadline {
                        stored.deadline = deadline;
                    }
                }
            }
            stored.situation = next;
            stored.clone()
        };
        Ok(committed)
    }
}

#[async_trait]
impl UnitStore for MemoryStore {
    async fn fetch_tree(&self, root_codes: &[i64]) -> Result<Vec<Unit>> {
        let inner = self.inner.read().await;
        if root_codes.is_empty() {
            return Ok(inner.tree.roots().to_vec());
        }
        let mut out = Vec::new();
        for &code in root_codes {
            let unit = inner
                .tree
                .find(code)
                .ok_or(CompmapError::UnitNotFound(code))?;
            out.push(unit.clone());
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Notifier test double that records every notification.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(NotificationKind, String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<(NotificationKind, String, String)> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, kind: NotificationKind, title: &str, message: &str) {
        self.events
            .lock()
            .await
            .push((kind, title.to_string(), message.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnitKind;
    use chrono::NaiveDate;

    fn unit(code: i64, kind: UnitKind, children: Vec<Unit>) -> Unit {
        Unit {
            code,
            acronym: format!("U{code}"),
            name: format!("Unit {code}"),
            kind,
            titular_user: None,
            children,
        }
    }

    fn org_tree() -> UnitTree {
        UnitTree::new(vec![unit(
            1,
            UnitKind::Intermediate,
            vec![unit(
                5,
                UnitKind::Intermediate,
                vec![
                    unit(8, UnitKind::Operational, vec![]),
                    unit(9, UnitKind::Operational, vec![]),
                ],
            )],
        )])
    }

    fn process(code: i64, kind: ProcessKind) -> Process {
        Process {
            code,
            kind,
            description: "test campaign".to_string(),
            deadline: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            status: ProcessStatus::Created,
        }
    }

    async fn store_with_started_process(kind: ProcessKind) -> MemoryStore {
        let store = MemoryStore::new(org_tree());
        store
            .insert_process(process(1, kind), ProcessCapabilities::all_enabled())
            .await;
        store.start_process(1, &[8, 9]).await.unwrap();
        store
    }

    #[tokio::test]
    async fn start_creates_one_subprocess_per_unit() {
        let store = store_with_started_process(ProcessKind::Mapping).await;
        let ctx = store.fetch_context(1).await.unwrap();
        assert_eq!(ctx.process.status, ProcessStatus::InProgress);
        assert_eq!(ctx.participants.len(), 2);
        assert!(ctx
            .participants
            .iter()
            .all(|sp| sp.situation == Situation::NotStarted));
        assert!(store.start_process(1, &[8]).await.is_err());
    }

    #[tokio::test]
    async fn start_rejects_unknown_units() {
        let store = MemoryStore::new(org_tree());
        store
            .insert_process(process(1, ProcessKind::Mapping), Default::default())
            .await;
        let err = store.start_process(1, &[999]).await.unwrap_err();
        assert!(matches!(err, CompmapError::UnitNotFound(999)));
    }

    #[tokio::test]
    async fn registration_flow_moves_situation_and_location() {
        let store = store_with_started_process(ProcessKind::Mapping).await;
        let ctx = store.fetch_context(1).await.unwrap();
        let sp = ctx.participant_for_unit(8).unwrap().clone();

        store.begin_registration(sp.code).await.unwrap();
        let sp = store
            .transition(
                sp.code,
                WorkflowAction::MakeRegistrationAvailable,
                TransitionPayload::default(),
            )
            .await
            .unwrap();
        assert_eq!(sp.situation, Situation::RegistrationMadeAvailable);
        assert_eq!(sp.location_code, 5);

        let sp = store
            .transition(
                sp.code,
                WorkflowAction::AcceptRegistration,
                TransitionPayload::default(),
            )
            .await
            .unwrap();
        assert_eq!(sp.situation, Situation::RegistrationAccepted);
        assert_eq!(sp.location_code, 1);

        let sp = store
            .transition(
                sp.code,
                WorkflowAction::HomologateRegistration,
                TransitionPayload::default(),
            )
            .await
            .unwrap();
        assert_eq!(sp.situation, Situation::RegistrationHomologated);
        assert_eq!(sp.location_code, 1);
    }

    #[tokio::test]
    async fn invalid_transition_names_unit_and_situation() {
        let store = store_with_started_process(ProcessKind::Mapping).await;
        let ctx = store.fetch_context(1).await.unwrap();
        let sp = ctx.participant_for_unit(8).unwrap();

        let err = store
            .transition(
                sp.code,
                WorkflowAction::HomologateMap,
                TransitionPayload::default(),
            )
            .await
            .unwrap_err();
        match err {
            CompmapError::InvalidTransition {
                unit, situation, ..
            } => {
                assert_eq!(unit, 8);
                assert_eq!(situation, "not_started");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Nothing moved.
        let ctx = store.fetch_context(1).await.unwrap();
        assert_eq!(
            ctx.participant_for_unit(8).unwrap().situation,
            Situation::NotStarted
        );
    }

    #[tokio::test]
    async fn map_validation_chain_homologates_at_the_top() {
        let store = store_with_started_process(ProcessKind::Mapping).await;
        let ctx = store.fetch_context(1).await.unwrap();
        let code = ctx.participant_for_unit(8).unwrap().code;

        // External collaborators walk the subprocess to a created map.
        store.begin_registration(code).await.unwrap();
        for action in [
            WorkflowAction::MakeRegistrationAvailable,
            WorkflowAction::HomologateRegistration,
        ] {
            store
                .transition(code, action, TransitionPayload::default())
                .await
                .unwrap();
        }
        store.record_map(code, 700).await.unwrap();

        let deadline = NaiveDate::from_ymd_opt(2026, 11, 30).unwrap();
        let sp = store
            .transition(
                code,
                WorkflowAction::MakeMapAvailable,
                TransitionPayload::with_deadline(deadline),
            )
            .await
            .unwrap();
        assert_eq!(sp.situation, Situation::MapMadeAvailable);
        assert_eq!(sp.deadline, deadline);

        let sp = store
            .transition(code, WorkflowAction::ValidateMap, TransitionPayload::default())
            .await
            .unwrap();
        assert_eq!(sp.situation, Situation::MapValidated);
        assert_eq!(sp.location_code, 5);

        // First acceptance climbs to the root, second one tops out.
        let sp = store
            .transition(
                code,
                WorkflowAction::AcceptMapValidation,
                TransitionPayload::default(),
            )
            .await
            .unwrap();
        assert_eq!(sp.situation, Situation::MapValidated);
        assert_eq!(sp.location_code, 1);

        let sp = store
            .transition(
                code,
                WorkflowAction::AcceptMapValidation,
                TransitionPayload::default(),
            )
            .await
            .unwrap();
        assert_eq!(sp.situation, Situation::MapHomologated);
    }

    #[tokio::test]
    async fn effective_map_archives_the_previous_one() {
        let store = MemoryStore::new(org_tree());
        store.set_effective_map(8, 100).await.unwrap();
        store.set_effective_map(8, 200).await.unwrap();

        assert_eq!(store.effective_map(8).await, Some(200));
        assert_eq!(store.archived_maps(8).await, vec![100]);
        assert!(store.set_effective_map(999, 1).await.is_err());
    }

    #[tokio::test]
    async fn revision_starts_straight_from_an_effective_map() {
        let store = MemoryStore::new(org_tree());
        store
            .insert_process(process(2, ProcessKind::Revision), Default::default())
            .await;
        store.start_process(2, &[8]).await.unwrap();
        let ctx = store.fetch_context(2).await.unwrap();
        let code = ctx.participant_for_unit(8).unwrap().code;

        let deadline = NaiveDate::from_ymd_opt(2026, 9, 15).unwrap();
        let sp = store
            .transition(
                code,
                WorkflowAction::MakeMapAvailable,
                TransitionPayload::with_deadline(deadline),
            )
            .await
            .unwrap();
        assert_eq!(sp.situation, Situation::RevisionMapMadeAvailable);
    }

    #[tokio::test]
    async fn diagnostic_subprocesses_reject_workflow_actions() {
        let store = store_with_started_process(ProcessKind::Diagnostic).await;
        let ctx = store.fetch_context(1).await.unwrap();
        let code = ctx.participant_for_unit(8).unwrap().code;

        let err = store
            .transition(
                code,
                WorkflowAction::MakeRegistrationAvailable,
                TransitionPayload::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CompmapError::InvalidTransition { .. }));
        assert!(store.begin_registration(code).await.is_err());
    }
}
