use chrono::NaiveDate;
use compmap_core::memory::MemoryStore;
use compmap_core::process::{Process, ProcessCapabilities, Subprocess};
use compmap_core::situation::Situation;
use compmap_core::types::{ProcessKind, ProcessStatus};
use compmap_core::unit::{Unit, UnitTree};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Seed file
// ---------------------------------------------------------------------------

/// Startup data for the in-memory store: the org-unit forest plus any
/// processes already underway. Lets the server come up with a populated
/// world instead of an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub processes: Vec<SeedProcess>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedProcess {
    pub code: i64,
    pub kind: ProcessKind,
    pub description: String,
    pub deadline: NaiveDate,
    pub status: ProcessStatus,
    #[serde(default)]
    pub capabilities: ProcessCapabilities,
    #[serde(default)]
    pub participants: Vec<SeedSubprocess>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSubprocess {
    pub code: i64,
    pub unit_code: i64,
    #[serde(default = "default_situation")]
    pub situation: Situation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

fn default_situation() -> Situation {
    Situation::NotStarted
}

impl Seed {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let seed: Seed = serde_yaml::from_str(&data)?;
        Ok(seed)
    }

    /// Build a populated store. Subprocess defaults fall back to the owning
    /// process (deadline) and unit (review location).
    pub async fn into_store(self) -> MemoryStore {
        let store = MemoryStore::new(UnitTree::new(self.units));
        for sp in self.processes {
            let process = Process {
                code: sp.code,
                kind: sp.kind,
                description: sp.description,
                deadline: sp.deadline,
                status: sp.status,
            };
            store.insert_process(process, sp.capabilities).await;
            for p in sp.participants {
                store
                    .put_subprocess(Subprocess {
                        code: p.code,
                        process_code: sp.code,
                        unit_code: p.unit_code,
                        situation: p.situation,
                        location_code: p.location_code.unwrap_or(p.unit_code),
                        map_code: p.map_code,
                        deadline: p.deadline.unwrap_or(sp.deadline),
                    })
                    .await;
            }
        }
        store
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use compmap_core::store::ProcessStore;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
units:
  - code: 1
    acronym: DIR
    name: Directorate
    kind: intermediate
    children:
      - code: 8
        acronym: DEV
        name: Development
        kind: operational
processes:
  - code: 1
    kind: mapping
    description: 2026 mapping
    deadline: 2026-12-31
    status: in_progress
    capabilities:
      can_accept: true
      can_homologate_registration: true
    participants:
      - code: 11
        unit_code: 8
        situation: registration_made_available
"#;

    #[tokio::test]
    async fn seed_roundtrip_builds_a_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seed.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let seed = Seed::load(&path).unwrap();
        let store = seed.into_store().await;

        let ctx = store.fetch_context(1).await.unwrap();
        assert_eq!(ctx.process.kind, ProcessKind::Mapping);
        assert_eq!(ctx.participants.len(), 1);
        let sp = &ctx.participants[0];
        assert_eq!(sp.situation, Situation::RegistrationMadeAvailable);
        // Defaults fall back to the process deadline and owning unit.
        assert_eq!(sp.deadline, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        assert_eq!(sp.location_code, 8);
        assert!(ctx.capabilities.can_accept);
        assert!(!ctx.capabilities.can_finalize);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(Seed::load(&dir.path().join("nope.yaml")).is_err());
    }
}
