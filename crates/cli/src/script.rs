//! Session scripts: a YAML list of store actions and drag outcomes replayed in order.
//!
//! ```yaml
//! steps:
//!   - createPlan:
//!       patient: { id: patient-1, name: Jane Doe }
//!       author: { id: doctor-1, name: Dr Smith }
//!   - addPhase: { title: Rehabilitation }
//!   - drop:
//!       sourceContainerId: procedures
//!       sourceIndex: 0
//!       destinationContainerId: "#1"
//!       destinationIndex: 0
//!       draggedElementId: proc-consultation
//!   - save
//! ```
//!
//! Phases may be referenced by identity or by display position (`#1` is the first phase).
//! Items may be referenced as `#<phase>.<item>` (`#2.1` is the first item of the second phase).
//! References are resolved against the current plan immediately before each step runs.

use anyhow::Context;
use careplan_core::{
    DropOutcome, Identifier, NewPhase, NonEmptyText, PersonRef, PhasePatch, PlanDetailsPatch,
    PlanStore, TreatmentPlan,
};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Steps are written as single-key maps (`- addPhase: {...}`) or bare names (`- save`).
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    CreatePlan {
        patient: PersonRef,
        author: PersonRef,
    },
    UpdateDetails(PlanDetailsPatch),
    AddPhase(NewPhase),
    UpdatePhase {
        phase: String,
        #[serde(default)]
        title: Option<NonEmptyText>,
        #[serde(default)]
        description: Option<String>,
    },
    RemovePhase {
        phase: String,
    },
    ReorderPhases {
        from: usize,
        to: usize,
    },
    AddItem {
        phase: String,
        template: Identifier,
        #[serde(default)]
        at: Option<usize>,
    },
    RemoveItem {
        phase: String,
        item: String,
    },
    Drop(DropOutcome),
    Save,
}

impl Step {
    fn label(&self) -> &'static str {
        match self {
            Step::CreatePlan { .. } => "createPlan",
            Step::UpdateDetails(_) => "updateDetails",
            Step::AddPhase(_) => "addPhase",
            Step::UpdatePhase { .. } => "updatePhase",
            Step::RemovePhase { .. } => "removePhase",
            Step::ReorderPhases { .. } => "reorderPhases",
            Step::AddItem { .. } => "addItem",
            Step::RemoveItem { .. } => "removeItem",
            Step::Drop(_) => "drop",
            Step::Save => "save",
        }
    }
}

impl Script {
    /// Parse a script from YAML text, naming the failing field on schema mismatch.
    pub fn parse(yaml_text: &str) -> anyhow::Result<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        serde_path_to_error::deserialize(deserializer).map_err(|err| {
            let path = err.path().to_string();
            anyhow::anyhow!("script schema mismatch at {}: {}", path, err.into_inner())
        })
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid script {}", path.display()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepStatus {
    Applied,
    /// A drop that classified to no mutation.
    Ignored,
    Rejected(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    pub index: usize,
    pub label: &'static str,
    pub status: StepStatus,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            StepStatus::Applied => write!(f, "#{:<3} {:<14} applied", self.index + 1, self.label),
            StepStatus::Ignored => write!(f, "#{:<3} {:<14} ignored", self.index + 1, self.label),
            StepStatus::Rejected(reason) => write!(
                f,
                "#{:<3} {:<14} rejected: {}",
                self.index + 1,
                self.label,
                reason
            ),
        }
    }
}

/// Replays every step against `store`. A rejected step is reported and the replay continues.
pub fn replay(store: &mut PlanStore, script: Script) -> Vec<StepReport> {
    script
        .steps
        .into_iter()
        .enumerate()
        .map(|(index, step)| {
            let label = step.label();
            let status = match run_step(store, step) {
                Ok(true) => StepStatus::Applied,
                Ok(false) => StepStatus::Ignored,
                Err(err) => StepStatus::Rejected(err.to_string()),
            };
            tracing::debug!("step {} ({}) -> {:?}", index + 1, label, status);
            StepReport {
                index,
                label,
                status,
            }
        })
        .collect()
}

fn run_step(store: &mut PlanStore, step: Step) -> anyhow::Result<bool> {
    match step {
        Step::CreatePlan { patient, author } => {
            store.create_plan(patient, author);
        }
        Step::UpdateDetails(patch) => {
            store.update_plan_details(patch)?;
        }
        Step::AddPhase(phase) => {
            store.add_phase(phase)?;
        }
        Step::UpdatePhase {
            phase,
            title,
            description,
        } => {
            let phase_id = phase_ref(store, &phase)?;
            let patch = PhasePatch {
                title,
                description,
                items: None,
            };
            store.update_phase(&phase_id, patch)?;
        }
        Step::RemovePhase { phase } => {
            let phase_id = phase_ref(store, &phase)?;
            store.remove_phase(&phase_id)?;
        }
        Step::ReorderPhases { from, to } => {
            store.reorder_phases(from, to)?;
        }
        Step::AddItem {
            phase,
            template,
            at,
        } => {
            let phase_id = phase_ref(store, &phase)?;
            store.add_catalog_item(&phase_id, &template, at)?;
        }
        Step::RemoveItem { phase, item } => {
            let phase_id = phase_ref(store, &phase)?;
            let item_id = Identifier::new(resolve_ref(store.current(), &item))?;
            store.remove_item_from_phase(&phase_id, &item_id)?;
        }
        Step::Drop(outcome) => {
            let outcome = resolve_drop(store.current(), outcome);
            return Ok(store.apply_drop(&outcome));
        }
        Step::Save => {
            store.save()?;
        }
    }
    Ok(true)
}

fn phase_ref(store: &PlanStore, raw: &str) -> anyhow::Result<Identifier> {
    Ok(Identifier::new(resolve_ref(store.current(), raw))?)
}

fn resolve_drop(plan: Option<&TreatmentPlan>, outcome: DropOutcome) -> DropOutcome {
    DropOutcome {
        source_container_id: resolve_ref(plan, &outcome.source_container_id),
        destination_container_id: outcome
            .destination_container_id
            .as_deref()
            .map(|raw| resolve_ref(plan, raw)),
        dragged_element_id: resolve_ref(plan, &outcome.dragged_element_id),
        ..outcome
    }
}

/// Resolves `#N` (phase) and `#N.M` (item) position references; anything else passes through.
fn resolve_ref(plan: Option<&TreatmentPlan>, raw: &str) -> String {
    let resolved = plan.zip(raw.strip_prefix('#')).and_then(|(plan, position)| {
        let (phase_pos, item_pos) = match position.split_once('.') {
            Some((phase, item)) => (phase, Some(item)),
            None => (position, None),
        };
        let phase = plan
            .phases()
            .get(phase_pos.parse::<usize>().ok()?.checked_sub(1)?)?;
        match item_pos {
            None => Some(phase.id().to_string()),
            Some(item_pos) => {
                let item = phase
                    .items()
                    .get(item_pos.parse::<usize>().ok()?.checked_sub(1)?)?;
                Some(item.id.to_string())
            }
        }
    });
    resolved.unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use careplan_core::{CoreConfig, FixedClock, ItemCatalog, SequentialIdGenerator};
    use std::sync::Arc;

    fn setup_store() -> PlanStore {
        let now = "2025-06-01T09:00:00Z".parse().unwrap();
        PlanStore::new(
            Arc::new(CoreConfig::default()),
            Arc::new(ItemCatalog::builtin().unwrap()),
            Arc::new(SequentialIdGenerator::new("id").unwrap()),
            Arc::new(FixedClock(now)),
        )
    }

    const SCRIPT: &str = r##"
steps:
  - createPlan:
      patient: { id: patient-1, name: Jane Doe }
      author: { id: doctor-1, name: Dr Smith }
  - addPhase: { title: Recovery, description: Weeks 2-6 }
  - drop:
      sourceContainerId: procedures
      sourceIndex: 0
      destinationContainerId: "#1"
      destinationIndex: 0
      draggedElementId: proc-consultation
  - addItem: { phase: "#1", template: med-ibuprofen }
  - drop:
      sourceContainerId: "#1"
      sourceIndex: 1
      destinationContainerId: "#2"
      destinationIndex: 0
      draggedElementId: "#1.2"
  - drop:
      sourceContainerId: "#1"
      sourceIndex: 0
      destinationContainerId: null
      draggedElementId: "#1.1"
  - removeItem: { phase: "#9", item: whatever }
  - updateDetails: { title: Knee rehabilitation }
  - save
"##;

    #[test]
    fn replay_reports_each_step() {
        let mut store = setup_store();
        let script = Script::parse(SCRIPT).unwrap();

        let reports = replay(&mut store, script);
        let statuses: Vec<_> = reports.iter().map(|r| r.status.clone()).collect();

        assert_eq!(statuses.len(), 9);
        assert_eq!(statuses[2], StepStatus::Applied);
        assert_eq!(statuses[4], StepStatus::Applied);
        assert_eq!(statuses[5], StepStatus::Ignored);
        assert!(matches!(&statuses[6], StepStatus::Rejected(msg) if msg.contains("#9")));
        assert_eq!(statuses[8], StepStatus::Applied);

        let plan = store.current().unwrap();
        assert_eq!(plan.title().as_str(), "Knee rehabilitation");
        assert_eq!(plan.phases()[0].items().len(), 1);
        assert_eq!(plan.phases()[1].items().len(), 1);
        assert_eq!(
            plan.phases()[1].items()[0].title.as_str(),
            "Ibuprofen 400mg"
        );
        assert_eq!(store.saved_plans().len(), 1);
    }

    #[test]
    fn parse_reads_map_form_steps() {
        let script = Script::parse("steps:\n  - addPhase: { title: Recovery }\n").unwrap();
        match script.steps.as_slice() {
            [Step::AddPhase(phase)] => {
                assert_eq!(phase.title.as_str(), "Recovery");
                assert_eq!(phase.description, "");
            }
            other => panic!("unexpected steps {other:?}"),
        }
    }

    #[test]
    fn parse_reports_field_path() {
        let err = Script::parse("steps:\n  - save\n  - addPhase: { title: '' }\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("steps[1]"), "{message}");
        assert!(message.contains("title"), "{message}");
    }

    #[test]
    fn parse_rejects_unknown_step() {
        let err = Script::parse("steps:\n  - launch: {}\n").unwrap_err();
        assert!(err.to_string().contains("steps[0]"), "{err}");
    }

    #[test]
    fn every_step_parses_from_documented_form() {
        let yaml = r##"
steps:
  - createPlan:
      patient: { id: patient-1, name: Jane Doe }
      author: { id: doctor-1, name: Dr Smith }
  - updateDetails: { title: Knee rehabilitation, description: Post-op }
  - addPhase: { title: Recovery, description: Weeks 2-6 }
  - updatePhase: { phase: "#2", title: Strength }
  - removePhase: { phase: "#2" }
  - reorderPhases: { from: 1, to: 0 }
  - addItem: { phase: "#1", template: med-ibuprofen, at: 0 }
  - removeItem: { phase: "#1", item: "#1.1" }
  - drop:
      sourceContainerId: procedures
      sourceIndex: 0
      destinationContainerId: null
      draggedElementId: proc-consultation
  - save
"##;
        let steps = Script::parse(yaml).unwrap().steps;
        let labels: Vec<_> = steps.iter().map(Step::label).collect();
        assert_eq!(
            labels,
            [
                "createPlan",
                "updateDetails",
                "addPhase",
                "updatePhase",
                "removePhase",
                "reorderPhases",
                "addItem",
                "removeItem",
                "drop",
                "save",
            ]
        );

        match &steps[0] {
            Step::CreatePlan { patient, author } => {
                assert_eq!(patient.id.as_str(), "patient-1");
                assert_eq!(author.name.as_str(), "Dr Smith");
            }
            other => panic!("unexpected step {other:?}"),
        }
        match &steps[3] {
            Step::UpdatePhase {
                phase,
                title,
                description,
            } => {
                assert_eq!(phase, "#2");
                assert_eq!(title.as_ref().map(|t| t.as_str()), Some("Strength"));
                assert_eq!(description, &None);
            }
            other => panic!("unexpected step {other:?}"),
        }
        match &steps[5] {
            Step::ReorderPhases { from, to } => assert_eq!((*from, *to), (1, 0)),
            other => panic!("unexpected step {other:?}"),
        }
        match &steps[6] {
            Step::AddItem {
                phase,
                template,
                at,
            } => {
                assert_eq!(phase, "#1");
                assert_eq!(template.as_str(), "med-ibuprofen");
                assert_eq!(*at, Some(0));
            }
            other => panic!("unexpected step {other:?}"),
        }
        match &steps[8] {
            Step::Drop(outcome) => {
                assert_eq!(outcome.destination_container_id, None);
                assert_eq!(outcome.dragged_element_id, "proc-consultation");
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn resolve_ref_passes_through_unknown_positions() {
        assert_eq!(resolve_ref(None, "#1"), "#1");
        assert_eq!(resolve_ref(None, "phase-a"), "phase-a");
    }

    #[test]
    fn from_file_reads_script() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("session.yaml");
        std::fs::write(&path, "steps:\n  - save\n").unwrap();

        let script = Script::from_file(&path).unwrap();
        assert_eq!(script.steps.len(), 1);
        assert!(Script::from_file(&dir.path().join("missing.yaml")).is_err());
    }
}
