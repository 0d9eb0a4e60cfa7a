use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ProcessKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    Mapping,
    Revision,
    Diagnostic,
}

impl ProcessKind {
    pub fn all() -> &'static [ProcessKind] {
        &[
            ProcessKind::Mapping,
            ProcessKind::Revision,
            ProcessKind::Diagnostic,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessKind::Mapping => "mapping",
            ProcessKind::Revision => "revision",
            ProcessKind::Diagnostic => "diagnostic",
        }
    }
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProcessKind {
    type Err = crate::error::CompmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mapping" => Ok(ProcessKind::Mapping),
            "revision" => Ok(ProcessKind::Revision),
            "diagnostic" => Ok(ProcessKind::Diagnostic),
            _ => Err(crate::error::CompmapError::Validation(format!(
                "unknown process kind: {s}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ProcessStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Created,
    InProgress,
    Finished,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessStatus::Created => "created",
            ProcessStatus::InProgress => "in_progress",
            ProcessStatus::Finished => "finished",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Actor roles. `Admin` is the central process office; `Gestor` manages an
/// intermediate unit; `Chefe` owns an operational unit; `Servidor` is staff
/// with read-only access to the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Gestor,
    Chefe,
    Servidor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Gestor => "gestor",
            Role::Chefe => "chefe",
            Role::Servidor => "servidor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::CompmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "gestor" => Ok(Role::Gestor),
            "chefe" => Ok(Role::Chefe),
            "servidor" => Ok(Role::Servidor),
            _ => Err(crate::error::CompmapError::Validation(format!(
                "unknown role: {s}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// UnitKind
// ---------------------------------------------------------------------------

/// Interoperational units both supervise subordinates and run their own
/// subprocess; they are exempt from hierarchical selection propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Operational,
    Intermediate,
    Interoperational,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitKind::Operational => "operational",
            UnitKind::Intermediate => "intermediate",
            UnitKind::Interoperational => "interoperational",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// BulkAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Accept,
    Homologate,
    MakeAvailable,
}

impl BulkAction {
    pub fn all() -> &'static [BulkAction] {
        &[
            BulkAction::Accept,
            BulkAction::Homologate,
            BulkAction::MakeAvailable,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BulkAction::Accept => "accept",
            BulkAction::Homologate => "homologate",
            BulkAction::MakeAvailable => "make_available",
        }
    }

    /// Only making maps available carries a mandatory validation deadline.
    pub fn requires_deadline(self) -> bool {
        matches!(self, BulkAction::MakeAvailable)
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BulkAction {
    type Err = crate::error::CompmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(BulkAction::Accept),
            "homologate" => Ok(BulkAction::Homologate),
            "make_available" => Ok(BulkAction::MakeAvailable),
            _ => Err(crate::error::CompmapError::Validation(format!(
                "unknown bulk action: {s}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
