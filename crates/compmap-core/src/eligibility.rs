use crate::process::{ProcessCapabilities, Subprocess};
use crate::situation::{Situation, SituationPhase};
use crate::types::BulkAction;
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Which bulk actions a subprocess in `situation` qualifies for.
///
/// Accept and homologate share one pool on purpose: both registration
/// made-available and map validated mean "awaiting an admin-side decision",
/// and the observed policy offers either button over the same candidates.
/// Whether the pools should ever diverge per track is an open product
/// question; until it is answered this matches the observed behavior
/// exactly.
pub fn classify(situation: Situation) -> BTreeSet<BulkAction> {
    use Situation::*;
    let mut out = BTreeSet::new();
    match situation {
        RegistrationMadeAvailable
        | RevisionRegistrationMadeAvailable
        | MapValidated
        | RevisionMapValidated => {
            out.insert(BulkAction::Accept);
            out.insert(BulkAction::Homologate);
        }
        MapCreated | RevisionMapAdjusted | NotStarted => {
            out.insert(BulkAction::MakeAvailable);
        }
        _ => {}
    }
    out
}

/// Candidate pools across a process's participants: for each bulk action,
/// the unit codes currently eligible, in participant order.
pub fn candidate_pools(participants: &[Subprocess]) -> BTreeMap<BulkAction, Vec<i64>> {
    let mut pools: BTreeMap<BulkAction, Vec<i64>> = BTreeMap::new();
    for sp in participants {
        for action in classify(sp.situation) {
            pools.entry(action).or_default().push(sp.unit_code);
        }
    }
    pools
}

// ---------------------------------------------------------------------------
// Affordance visibility
// ---------------------------------------------------------------------------

/// Bulk actions that should be offered at all: the pool must be non-empty
/// AND the process-level capability flag must be set. Missing either just
/// hides the affordance; it is not an error.
pub fn offered_actions(
    participants: &[Subprocess],
    capabilities: &ProcessCapabilities,
) -> BTreeSet<BulkAction> {
    let pools = candidate_pools(participants);
    let mut offered = BTreeSet::new();

    for (action, units) in &pools {
        if units.is_empty() {
            continue;
        }
        let enabled = match action {
            BulkAction::Accept => capabilities.can_accept,
            BulkAction::Homologate => {
                // Gate per track phase: registration and map homologation
                // are separate capabilities.
                let phases: BTreeSet<SituationPhase> = participants
                    .iter()
                    .filter(|sp| units.contains(&sp.unit_code))
                    .map(|sp| sp.situation.phase())
                    .collect();
                (phases.contains(&SituationPhase::Registration)
                    && capabilities.can_homologate_registration)
                    || (phases.contains(&SituationPhase::Map) && capabilities.can_homologate_map)
            }
            BulkAction::MakeAvailable => capabilities.can_make_maps_available,
        };
        if enabled {
            offered.insert(*action);
        }
    }
    offered
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
