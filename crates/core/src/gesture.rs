//! Translation of completed drag-and-drop interactions into plan moves.
//!
//! The presentation layer reports each finished drag as a [`DropOutcome`]: raw container keys
//! plus indices. [`GestureAdapter::classify`] turns that into exactly one [`PlanMove`], or an
//! [`PlanError::InvalidGesture`] when the drop does not describe a valid change. Classification
//! only reads the plan and catalog, so a rejected gesture cannot leave a partial mutation behind.
//!
//! Rules, in order:
//! 1. No destination container: rejected.
//! 2. Catalog palette to phase: place a clone of the catalog template.
//! 3. Phase to a different phase: move the item.
//! 4. Phase to the same phase at a different index: reorder within the phase.
//! 5. Phase list to phase list: reorder phases.
//! 6. Anything else: rejected.

use crate::catalog::ItemCatalog;
use crate::config::ContainerKeys;
use crate::model::{Category, TreatmentItem, TreatmentPlan};
use crate::{PlanError, PlanResult};
use careplan_types::Identifier;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A completed drag interaction as reported by the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropOutcome {
    pub source_container_id: String,
    pub source_index: usize,
    /// `None` when the drag was released outside every drop target or was cancelled.
    #[serde(default)]
    pub destination_container_id: Option<String>,
    #[serde(default)]
    pub destination_index: usize,
    pub dragged_element_id: String,
}

/// A drop container after resolution against the plan and configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Container {
    Catalog(Category),
    Phase(Identifier),
    PhaseList,
}

/// A single mutation the store should apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanMove {
    PlaceFromCatalog {
        phase_id: Identifier,
        template: Arc<TreatmentItem>,
        at: usize,
    },
    MoveBetweenPhases {
        from_phase_id: Identifier,
        to_phase_id: Identifier,
        item_id: Identifier,
        to_index: usize,
    },
    ReorderWithinPhase {
        phase_id: Identifier,
        from_index: usize,
        to_index: usize,
    },
    ReorderPhases {
        from_index: usize,
        to_index: usize,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct GestureAdapter<'a> {
    keys: &'a ContainerKeys,
    catalog: &'a ItemCatalog,
}

impl<'a> GestureAdapter<'a> {
    pub fn new(keys: &'a ContainerKeys, catalog: &'a ItemCatalog) -> Self {
        Self { keys, catalog }
    }

    /// Resolves a raw container key. Palette and phase-list keys take precedence over phase ids.
    pub fn resolve(&self, plan: &TreatmentPlan, raw: &str) -> Option<Container> {
        if raw == self.keys.phase_list() {
            return Some(Container::PhaseList);
        }
        if let Some(category) = self.keys.catalog_category(raw) {
            return Some(Container::Catalog(category));
        }
        plan.phases()
            .iter()
            .find(|phase| phase.id().as_str() == raw)
            .map(|phase| Container::Phase(phase.id().clone()))
    }

    /// Classifies a drop outcome into exactly one move.
    ///
    /// # Errors
    ///
    /// [`PlanError::InvalidGesture`] for every drop that should not mutate the plan. Callers are
    /// expected to drop these silently; they are ordinary UI noise.
    pub fn classify(&self, plan: &TreatmentPlan, outcome: &DropOutcome) -> PlanResult<PlanMove> {
        let Some(destination_key) = outcome.destination_container_id.as_deref() else {
            return Err(invalid("dropped outside any target"));
        };

        let source = self
            .resolve(plan, &outcome.source_container_id)
            .ok_or_else(|| {
                invalid(format!(
                    "unknown source container '{}'",
                    outcome.source_container_id
                ))
            })?;
        let destination = self
            .resolve(plan, destination_key)
            .ok_or_else(|| invalid(format!("unknown destination container '{}'", destination_key)))?;

        match (source, destination) {
            (Container::Catalog(category), Container::Phase(phase_id)) => {
                let template_id = parse_dragged_id(outcome)?;
                let template = self.catalog.get_in(category, &template_id).ok_or_else(|| {
                    invalid(format!(
                        "'{}' is not a {} in the catalog",
                        template_id, category
                    ))
                })?;
                Ok(PlanMove::PlaceFromCatalog {
                    phase_id,
                    template: Arc::clone(template),
                    at: outcome.destination_index,
                })
            }
            (Container::Phase(from_phase_id), Container::Phase(to_phase_id))
                if from_phase_id != to_phase_id =>
            {
                Ok(PlanMove::MoveBetweenPhases {
                    from_phase_id,
                    to_phase_id,
                    item_id: parse_dragged_id(outcome)?,
                    to_index: outcome.destination_index,
                })
            }
            (Container::Phase(phase_id), Container::Phase(_)) => {
                if outcome.source_index == outcome.destination_index {
                    return Err(invalid("item dropped at its own position"));
                }
                let dragged = parse_dragged_id(outcome)?;
                let at_source = plan
                    .phase(&phase_id)
                    .and_then(|phase| phase.items().get(outcome.source_index))
                    .map(|item| &item.id);
                if at_source != Some(&dragged) {
                    return Err(invalid(format!(
                        "'{}' is not at index {} of phase '{}'",
                        dragged, outcome.source_index, phase_id
                    )));
                }
                Ok(PlanMove::ReorderWithinPhase {
                    phase_id,
                    from_index: outcome.source_index,
                    to_index: outcome.destination_index,
                })
            }
            (Container::PhaseList, Container::PhaseList) => {
                if outcome.source_index == outcome.destination_index {
                    return Err(invalid("phase dropped at its own position"));
                }
                let dragged = parse_dragged_id(outcome)?;
                let at_source = plan.phases().get(outcome.source_index).map(|p| p.id());
                if at_source != Some(&dragged) {
                    return Err(invalid(format!(
                        "phase '{}' is not at index {}",
                        dragged, outcome.source_index
                    )));
                }
                Ok(PlanMove::ReorderPhases {
                    from_index: outcome.source_index,
                    to_index: outcome.destination_index,
                })
            }
            (source, destination) => Err(invalid(format!(
                "no move from {:?} to {:?}",
                source, destination
            ))),
        }
    }
}

fn invalid(reason: impl Into<String>) -> PlanError {
    PlanError::InvalidGesture(reason.into())
}

fn parse_dragged_id(outcome: &DropOutcome) -> PlanResult<Identifier> {
    Identifier::new(outcome.dragged_element_id.as_str()).map_err(|e| {
        invalid(format!(
            "dragged element id '{}': {}",
            outcome.dragged_element_id, e
        ))
    })
}
