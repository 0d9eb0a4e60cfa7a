use crate::error::{CompmapError, Result};
use crate::process::Subprocess;
use crate::situation::{Situation, SituationPhase};
use crate::store::{NotificationKind, Notifier, ProcessStore, SubprocessStore};
use crate::types::{BulkAction, ProcessKind, Role};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// WorkflowAction
// ---------------------------------------------------------------------------

/// The closed set of workflow transitions. There is deliberately no way to
/// extend this at runtime; anything not listed here is CRUD owned by an
/// external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    MakeRegistrationAvailable,
    ReturnRegistration,
    AcceptRegistration,
    HomologateRegistration,
    MakeMapAvailable,
    ValidateMap,
    SuggestMapChanges,
    ReturnValidation,
    AcceptMapValidation,
    HomologateMap,
    AdjustMap,
    ReopenRegistration,
    ChangeDeadline,
}

impl WorkflowAction {
    pub fn all() -> &'static [WorkflowAction] {
        use WorkflowAction::*;
        &[
            MakeRegistrationAvailable,
            ReturnRegistration,
            AcceptRegistration,
            HomologateRegistration,
            MakeMapAvailable,
            ValidateMap,
            SuggestMapChanges,
            ReturnValidation,
            AcceptMapValidation,
            HomologateMap,
            AdjustMap,
            ReopenRegistration,
            ChangeDeadline,
        ]
    }

    pub fn as_str(self) -> &'static str {
        use WorkflowAction::*;
        match self {
            MakeRegistrationAvailable => "make_registration_available",
            ReturnRegistration => "return_registration",
            AcceptRegistration => "accept_registration",
            HomologateRegistration => "homologate_registration",
            MakeMapAvailable => "make_map_available",
            ValidateMap => "validate_map",
            SuggestMapChanges => "suggest_map_changes",
            ReturnValidation => "return_validation",
            AcceptMapValidation => "accept_map_validation",
            HomologateMap => "homologate_map",
            AdjustMap => "adjust_map",
            ReopenRegistration => "reopen_registration",
            ChangeDeadline => "change_deadline",
        }
    }

    /// Which roles may trigger this transition. Making maps available is
    /// admin-only for mapping processes but also open to the unit chief in
    /// revision (resubmitting an adjusted map).
    pub fn allowed_roles(self, kind: ProcessKind) -> &'static [Role] {
        use WorkflowAction::*;
        match self {
            MakeRegistrationAvailable | ValidateMap | SuggestMapChanges | AdjustMap => {
                &[Role::Chefe]
            }
            AcceptRegistration | AcceptMapValidation => &[Role::Gestor],
            ReturnRegistration | ReturnValidation => &[Role::Gestor, Role::Admin],
            MakeMapAvailable => match kind {
                ProcessKind::Revision => &[Role::Admin, Role::Chefe],
                _ => &[Role::Admin],
            },
            HomologateRegistration | HomologateMap | ReopenRegistration | ChangeDeadline => {
                &[Role::Admin]
            }
        }
    }

    /// The concrete transition a bulk action resolves to for a subprocess in
    /// the given situation, if any.
    pub fn for_bulk(action: BulkAction, situation: Situation) -> Option<WorkflowAction> {
        match (action, situation.phase()) {
            (BulkAction::Accept, SituationPhase::Registration) => {
                Some(WorkflowAction::AcceptRegistration)
            }
            (BulkAction::Accept, SituationPhase::Map) => Some(WorkflowAction::AcceptMapValidation),
            (BulkAction::Homologate, SituationPhase::Registration) => {
                Some(WorkflowAction::HomologateRegistration)
            }
            (BulkAction::Homologate, SituationPhase::Map) => Some(WorkflowAction::HomologateMap),
            (BulkAction::MakeAvailable, _) => Some(WorkflowAction::MakeMapAvailable),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowAction {
    type Err = CompmapError;

    fn from_str(s: &str) -> Result<Self> {
        WorkflowAction::all()
            .iter()
            .find(|a| a.as_str() == s)
            .copied()
            .ok_or_else(|| CompmapError::Validation(format!("unknown workflow action: {s}")))
    }
}

// ---------------------------------------------------------------------------
// TransitionPayload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionPayload {
    /// Validation deadline; mandatory when making a map available or
    /// changing a deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    /// Free-text observations or suggestions; mandatory when presenting
    /// suggestions on a map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TransitionPayload {
    pub fn with_deadline(deadline: NaiveDate) -> Self {
        Self {
            deadline: Some(deadline),
            note: None,
        }
    }

    pub fn with_note(note: impl Into<String>) -> Self {
        Self {
            deadline: None,
            note: Some(note.into()),
        }
    }

    pub fn validate_for(&self, action: WorkflowAction) -> Result<()> {
        match action {
            WorkflowAction::MakeMapAvailable | WorkflowAction::ChangeDeadline
                if self.deadline.is_none() =>
            {
                Err(CompmapError::Validation(format!(
                    "{action} requires a deadline"
                )))
            }
            WorkflowAction::SuggestMapChanges if self.note.as_deref().unwrap_or("").is_empty() => {
                Err(CompmapError::Validation(
                    "suggest_map_changes requires the suggestion text".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Actor {
    pub role: Role,
    pub unit_code: i64,
}

impl Actor {
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            unit_code: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Pure transition table: where `action` takes a subprocess of a process of
/// `kind` that currently sits in `current`. `at_top` is true when the
/// review location has no higher unit left (the acceptance chain is
/// exhausted). `None` means the transition is illegal.
pub fn next_situation(
    kind: ProcessKind,
    action: WorkflowAction,
    current: Situation,
    at_top: bool,
) -> Option<Situation> {
    use Situation::*;
    use WorkflowAction as A;

    match kind {
        // Diagnostic subprocesses carry no cataloguing/map workflow.
        ProcessKind::Diagnostic => None,

        ProcessKind::Mapping => match (action, current) {
            (A::MakeRegistrationAvailable, RegistrationInProgress) => {
                Some(RegistrationMadeAvailable)
            }
            (A::ReturnRegistration, RegistrationMadeAvailable | RegistrationAccepted) => {
                Some(RegistrationInProgress)
            }
            (A::AcceptRegistration, RegistrationMadeAvailable) => Some(RegistrationAccepted),
            (A::HomologateRegistration, RegistrationMadeAvailable | RegistrationAccepted) => {
                Some(RegistrationHomologated)
            }
            (A::MakeMapAvailable, MapCreated) => Some(MapMadeAvailable),
            (A::ValidateMap, MapMadeAvailable) => Some(MapValidated),
            (A::SuggestMapChanges, MapMadeAvailable) => Some(MapWithSuggestions),
            (A::ReturnValidation, MapValidated | MapWithSuggestions) => Some(MapMadeAvailable),
            (A::AcceptMapValidation, MapValidated) => Some(if at_top {
                MapHomologated
            } else {
                MapValidated
            }),
            (A::HomologateMap, MapValidated) => Some(MapHomologated),
            (
                A::ReopenRegistration,
                RegistrationMadeAvailable | RegistrationAccepted | RegistrationHomologated
                | MapCreated | MapMadeAvailable | MapWithSuggestions | MapValidated,
            ) => Some(RegistrationInProgress),
            (A::ChangeDeadline, s)
                if s != MapHomologated
                    && (s == NotStarted || s.track() == Some(ProcessKind::Mapping)) =>
            {
                Some(s)
            }
            _ => None,
        },

        ProcessKind::Revision => match (action, current) {
            (A::MakeRegistrationAvailable, RevisionRegistrationInProgress) => {
                Some(RevisionRegistrationMadeAvailable)
            }
            (
                A::ReturnRegistration,
                RevisionRegistrationMadeAvailable | RevisionRegistrationAccepted,
            ) => Some(RevisionRegistrationInProgress),
            (A::AcceptRegistration, RevisionRegistrationMadeAvailable) => {
                Some(RevisionRegistrationAccepted)
            }
            (
                A::HomologateRegistration,
                RevisionRegistrationMadeAvailable | RevisionRegistrationAccepted,
            ) => Some(RevisionRegistrationHomologated),
            // NotStarted: revising a map already in force, no re-cataloguing.
            (A::MakeMapAvailable, RevisionMapAdjusted | NotStarted) => {
                Some(RevisionMapMadeAvailable)
            }
            (A::ValidateMap, RevisionMapMadeAvailable) => Some(RevisionMapValidated),
            (A::SuggestMapChanges, RevisionMapMadeAvailable) => Some(RevisionMapWithSuggestions),
            (A::ReturnValidation, RevisionMapValidated | RevisionMapWithSuggestions) => {
                Some(RevisionMapMadeAvailable)
            }
            (A::AcceptMapValidation, RevisionMapValidated) => Some(if at_top {
                RevisionMapHomologated
            } else {
                RevisionMapValidated
            }),
            (A::HomologateMap, RevisionMapValidated) => Some(RevisionMapHomologated),
            (A::AdjustMap, RevisionMapWithSuggestions | RevisionRegistrationHomologated) => {
                Some(RevisionMapAdjusted)
            }
            (
                A::ReopenRegistration,
                RevisionRegistrationMadeAvailable
                | RevisionRegistrationAccepted
                | RevisionRegistrationHomologated
                | RevisionMapAdjusted
                | RevisionMapMadeAvailable
                | RevisionMapWithSuggestions
                | RevisionMapValidated,
            ) => Some(RevisionRegistrationInProgress),
            (A::ChangeDeadline, s)
                if s != RevisionMapHomologated
                    && (s == NotStarted || s.track() == Some(ProcessKind::Revision)) =>
            {
                Some(s)
            }
            _ => None,
        },
    }
}

/// Role gate for a transition.
pub fn check_role(action: WorkflowAction, kind: ProcessKind, role: Role) -> Result<()> {
    if action.allowed_roles(kind).contains(&role) {
        Ok(())
    } else {
        Err(CompmapError::RoleNotAllowed {
            role: role.to_string(),
            action: action.to_string(),
        })
    }
}

pub(crate) fn invalid_transition(sp: &Subprocess, action: WorkflowAction) -> CompmapError {
    CompmapError::InvalidTransition {
        unit: sp.unit_code,
        situation: sp.situation.to_string(),
        action: action.to_string(),
    }
}

// ---------------------------------------------------------------------------
// WorkflowEngine
// ---------------------------------------------------------------------------

/// Applies role-gated transitions through the store collaborators and
/// finalizes processes. Holds no state of its own; every read goes back to
/// the stores so nothing here can go stale.
pub struct WorkflowEngine {
    processes: Arc<dyn ProcessStore>,
    subprocesses: Arc<dyn SubprocessStore>,
    notifier: Arc<dyn Notifier>,
}

impl WorkflowEngine {
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

    /// Apply one transition on behalf of an actor. The store enforces the
    /// situation precondition; the engine enforces the role gate and emits
    /// the feedback notification.
    pub async fn apply(
        &self,
        subprocess_code: i64,
        action: WorkflowAction,
        actor: Actor,
        payload: TransitionPayload,
    ) -> Result<Subprocess> {
        let sp = self.subprocesses.fetch(subprocess_code).await?;
        let context = self.processes.fetch_context(sp.process_code).await?;
        check_role(action, context.process.kind, actor.role)?;
        payload.validate_for(action)?;

        let updated = self
            .subprocesses
            .transition(subprocess_code, action, payload)
            .await?;

        tracing::info!(
            subprocess = subprocess_code,
            unit = updated.unit_code,
            %action,
            from = %sp.situation,
            to = %updated.situation,
            "workflow transition applied"
        );
        self.notifier
            .notify(
                NotificationKind::Success,
                "Workflow",
                &format!(
                    "unit {} moved to '{}' via {action}",
                    updated.unit_code, updated.situation
                ),
            )
            .await;
        Ok(updated)
    }

    /// Finalize a process: every participant must have a homologated map.
    /// All checks run before any mutation, so a blocked finalization is a
    /// no-op that names the full blocking unit set.
    pub async fn finalize(&self, process_code: i64) -> Result<()> {
        let context = self.processes.fetch_context(process_code).await?;

        if context.process.status != crate::types::ProcessStatus::InProgress {
            return Err(CompmapError::Validation(format!(
                "only in-progress processes can be finalized (process {} is {})",
                process_code, context.process.status
            )));
        }

        let blocking = context.units_blocking_finalization();
        if !blocking.is_empty() {
            tracing::warn!(
                process = process_code,
                pending = blocking.len(),
                "finalization blocked"
            );
            return Err(CompmapError::FinalizationBlocked {
                process: process_code,
                units: blocking,
            });
        }

        // Every participant needs a map to put in force; verify before
        // touching anything so failure stays a no-op.
        let mut maps = Vec::with_capacity(context.participants.len());
        for sp in &context.participants {
            let map_code = sp.map_code.ok_or_else(|| {
                CompmapError::Validation(format!(
                    "subprocess {} has a homologated situation but no map",
                    sp.code
                ))
            })?;
            maps.push((sp.unit_code, map_code));
        }

        for (unit_code, map_code) in maps {
            self.processes.set_effective_map(unit_code, map_code).await?;
        }
        self.processes.finalize_process(process_code).await?;

        tracing::info!(process = process_code, "process finalized");
        self.notifier
            .notify(
                NotificationKind::Success,
                "Process finalized",
                &format!(
                    "process {} finished; {} map(s) now in force",
                    process_code,
                    context.participants.len()
                ),
            )
            .await;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
