use crate::situation::Situation;
use crate::types::{ProcessKind, ProcessStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// One campaign. Created by the admin against a subtree of units; mutated
/// only by explicit admin actions (start, bulk actions, finalize).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub code: i64,
    pub kind: ProcessKind,
    pub description: String,
    pub deadline: NaiveDate,
    pub status: ProcessStatus,
}

// ---------------------------------------------------------------------------
// Subprocess
// ---------------------------------------------------------------------------

/// One unit's instance of a process. Exactly one per (process, unit) pair
/// for the lifetime of the process; mutated exclusively through workflow
/// transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subprocess {
    pub code: i64,
    pub process_code: i64,
    pub unit_code: i64,
    pub situation: Situation,
    /// Unit currently holding the subprocess for review. Starts at the
    /// owning unit and climbs one level per acceptance.
    pub location_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_code: Option<i64>,
    pub deadline: NaiveDate,
}

// ---------------------------------------------------------------------------
// ProcessCapabilities
// ---------------------------------------------------------------------------

/// Process-level affordance flags supplied by the process collaborator.
/// A bulk action is offered only when its candidate pool is non-empty AND
/// the matching flag is set; absence of either hides the affordance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProcessCapabilities {
    #[serde(default)]
    pub can_accept: bool,
    #[serde(default)]
    pub can_homologate_registration: bool,
    #[serde(default)]
    pub can_homologate_map: bool,
    #[serde(default)]
    pub can_make_maps_available: bool,
    #[serde(default)]
    pub can_finalize: bool,
}

impl ProcessCapabilities {
    pub fn all_enabled() -> Self {
        Self {
            can_accept: true,
            can_homologate_registration: true,
            can_homologate_map: true,
            can_make_maps_available: true,
            can_finalize: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ProcessContext
// ---------------------------------------------------------------------------

/// Everything a caller needs to render and act on one process: the process
/// itself, every participating subprocess with its current situation, and
/// the capability flags. Refetched after every mutation that could have
/// moved a participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessContext {
    pub process: Process,
    pub participants: Vec<Subprocess>,
    pub capabilities: ProcessCapabilities,
}

impl ProcessContext {
    pub fn participant_for_unit(&self, unit_code: i64) -> Option<&Subprocess> {
        self.participants.iter().find(|sp| sp.unit_code == unit_code)
    }

    /// Units whose subprocess has not reached a homologated map. Empty means
    /// the process can be finalized.
    pub fn units_blocking_finalization(&self) -> Vec<i64> {
        self.participants
            .iter()
            .filter(|sp| !sp.situation.is_map_homologated())
            .map(|sp| sp.unit_code)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
