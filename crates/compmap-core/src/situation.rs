use crate::types::ProcessKind;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Situation
// ---------------------------------------------------------------------------

/// Workflow state of one unit's subprocess.
///
/// Two parallel tracks share the terminal vocabulary: the plain variants
/// belong to mapping processes (a map is authored from scratch), the
/// `Revision*` variants to revision processes (an effective map already
/// exists and is being revised). `NotStarted` is shared by both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Situation {
    NotStarted,

    // Mapping track
    RegistrationInProgress,
    RegistrationMadeAvailable,
    RegistrationAccepted,
    RegistrationHomologated,
    MapCreated,
    MapMadeAvailable,
    MapWithSuggestions,
    MapValidated,
    MapHomologated,

    // Revision track
    RevisionRegistrationInProgress,
    RevisionRegistrationMadeAvailable,
    RevisionRegistrationAccepted,
    RevisionRegistrationHomologated,
    RevisionMapAdjusted,
    RevisionMapMadeAvailable,
    RevisionMapWithSuggestions,
    RevisionMapValidated,
    RevisionMapHomologated,
}

/// Coarse position of a situation within its track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SituationPhase {
    NotStarted,
    Registration,
    Map,
}

impl Situation {
    pub fn all() -> &'static [Situation] {
        &[
            Situation::NotStarted,
            Situation::RegistrationInProgress,
            Situation::RegistrationMadeAvailable,
            Situation::RegistrationAccepted,
            Situation::RegistrationHomologated,
            Situation::MapCreated,
            Situation::MapMadeAvailable,
            Situation::MapWithSuggestions,
            Situation::MapValidated,
            Situation::MapHomologated,
            Situation::RevisionRegistrationInProgress,
            Situation::RevisionRegistrationMadeAvailable,
            Situation::RevisionRegistrationAccepted,
            Situation::RevisionRegistrationHomologated,
            Situation::RevisionMapAdjusted,
            Situation::RevisionMapMadeAvailable,
            Situation::RevisionMapWithSuggestions,
            Situation::RevisionMapValidated,
            Situation::RevisionMapHomologated,
        ]
    }

    /// Which process kind this situation belongs to. `NotStarted` is shared
    /// and returns `None`.
    pub fn track(self) -> Option<ProcessKind> {
        use Situation::*;
        match self {
            NotStarted => None,
            RegistrationInProgress | RegistrationMadeAvailable | RegistrationAccepted
            | RegistrationHomologated | MapCreated | MapMadeAvailable | MapWithSuggestions
            | MapValidated | MapHomologated => Some(ProcessKind::Mapping),
            RevisionRegistrationInProgress
            | RevisionRegistrationMadeAvailable
            | RevisionRegistrationAccepted
            | RevisionRegistrationHomologated
            | RevisionMapAdjusted
            | RevisionMapMadeAvailable
            | RevisionMapWithSuggestions
            | RevisionMapValidated
            | RevisionMapHomologated => Some(ProcessKind::Revision),
        }
    }

    pub fn phase(self) -> SituationPhase {
        use Situation::*;
        match self {
            NotStarted => SituationPhase::NotStarted,
            RegistrationInProgress
            | RegistrationMadeAvailable
            | RegistrationAccepted
            | RegistrationHomologated
            | RevisionRegistrationInProgress
            | RevisionRegistrationMadeAvailable
            | RevisionRegistrationAccepted
            | RevisionRegistrationHomologated => SituationPhase::Registration,
            MapCreated | MapMadeAvailable | MapWithSuggestions | MapValidated | MapHomologated
            | RevisionMapAdjusted | RevisionMapMadeAvailable | RevisionMapWithSuggestions
            | RevisionMapValidated | RevisionMapHomologated => SituationPhase::Map,
        }
    }

    /// Terminal situation: the unit's map is homologated and only process
    /// finalization remains.
    pub fn is_map_homologated(self) -> bool {
        matches!(
            self,
            Situation::MapHomologated | Situation::RevisionMapHomologated
        )
    }

    pub fn as_str(self) -> &'static str {
        use Situation::*;
        match self {
            NotStarted => "not_started",
            RegistrationInProgress => "registration_in_progress",
            RegistrationMadeAvailable => "registration_made_available",
            RegistrationAccepted => "registration_accepted",
            RegistrationHomologated => "registration_homologated",
            MapCreated => "map_created",
            MapMadeAvailable => "map_made_available",
            MapWithSuggestions => "map_with_suggestions",
            MapValidated => "map_validated",
            MapHomologated => "map_homologated",
            RevisionRegistrationInProgress => "revision_registration_in_progress",
            RevisionRegistrationMadeAvailable => "revision_registration_made_available",
            RevisionRegistrationAccepted => "revision_registration_accepted",
            RevisionRegistrationHomologated => "revision_registration_homologated",
            RevisionMapAdjusted => "revision_map_adjusted",
            RevisionMapMadeAvailable => "revision_map_made_available",
            RevisionMapWithSuggestions => "revision_map_with_suggestions",
            RevisionMapValidated => "revision_map_validated",
            RevisionMapHomologated => "revision_map_homologated",
        }
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Situation {
    type Err = crate::error::CompmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Situation::all()
            .iter()
            .find(|sit| sit.as_str() == s)
            .copied()
            .ok_or_else(|| {
                crate::error::CompmapError::Validation(format!("unknown situation: {s}"))
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
