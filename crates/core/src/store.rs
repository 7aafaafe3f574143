//! Stateful plan store wrapping the mutation engine.
//!
//! The store owns the plan currently being edited and the collection of saved plans. Every
//! action applies one engine operation to the current plan and commits the result; a rejected
//! action is logged and leaves the current plan exactly as it was.
//!
//! ## Session state
//! - [`SessionState::Uninitialised`]: no plan has been created or opened.
//! - [`SessionState::Editing`]: the current plan differs from its saved copy (or has none).
//! - [`SessionState::Saved`]: the current plan equals its saved copy. Any further change moves
//!   the session back to `Editing`; there is no terminal state.

use crate::catalog::ItemCatalog;
use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::engine::MutationEngine;
use crate::error::EntityKind;
use crate::gesture::{DropOutcome, GestureAdapter, PlanMove};
use crate::model::{
    renumber_phases, NewPhase, PersonRef, PhasePatch, PlanDetailsPatch, TreatmentItem,
    TreatmentPhase, TreatmentPlan,
};
use crate::{PlanError, PlanResult};
use careplan_types::Identifier;
use careplan_uuid::IdGenerator;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialised,
    Editing,
    Saved,
}

/// Log level for a rejected action. Drag misfires are routine and stay at debug.
#[derive(Clone, Copy, Debug)]
enum Rejection {
    Warn,
    Debug,
}

pub struct PlanStore {
    cfg: Arc<CoreConfig>,
    catalog: Arc<ItemCatalog>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    engine: MutationEngine,
    current: Option<TreatmentPlan>,
    saved: Vec<TreatmentPlan>,
}

impl std::fmt::Debug for PlanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanStore")
            .field("current", &self.current.as_ref().map(|p| p.id()))
            .field("saved", &self.saved.len())
            .finish_non_exhaustive()
    }
}

impl PlanStore {
    pub fn new(
        cfg: Arc<CoreConfig>,
        catalog: Arc<ItemCatalog>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cfg,
            catalog,
            engine: MutationEngine::new(Arc::clone(&ids)),
            ids,
            clock,
            current: None,
            saved: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn current(&self) -> Option<&TreatmentPlan> {
        self.current.as_ref()
    }

    pub fn saved_plans(&self) -> &[TreatmentPlan] {
        &self.saved
    }

    pub fn state(&self) -> SessionState {
        match &self.current {
            None => SessionState::Uninitialised,
            Some(plan) if self.saved.iter().any(|saved| saved == plan) => SessionState::Saved,
            Some(_) => SessionState::Editing,
        }
    }

    /// Starts a new plan with one empty default phase and makes it current.
    ///
    /// Any unsaved changes to the previous current plan are discarded.
    pub fn create_plan(&mut self, patient: PersonRef, author: PersonRef) -> &TreatmentPlan {
        let now = self.clock.now();
        let first_phase = TreatmentPhase::new(
            self.ids.next_id(),
            self.cfg.default_phase_title().clone(),
            self.cfg.default_phase_description(),
        );
        let mut plan = TreatmentPlan::new(
            self.ids.next_id(),
            patient,
            author,
            self.cfg.default_plan_title().clone(),
            "",
            now,
        );
        plan.phases.push(Arc::new(first_phase));
        renumber_phases(&mut plan.phases);

        tracing::info!("created treatment plan {} for patient {}", plan.id(), plan.patient().id);
        self.current.insert(plan)
    }

    /// Copies the current plan into the saved collection, replacing a saved plan with the same
    /// identity or appending. The current plan stays open for editing.
    pub fn save(&mut self) -> PlanResult<()> {
        let Some(plan) = self.current.as_ref() else {
            tracing::warn!("save rejected: no current plan");
            return Err(PlanError::NoCurrentPlan);
        };

        match self.saved.iter_mut().find(|saved| saved.id() == plan.id()) {
            Some(existing) => *existing = plan.clone(),
            None => self.saved.push(plan.clone()),
        }
        tracing::info!("saved treatment plan {}", plan.id());
        Ok(())
    }

    /// Makes a copy of a saved plan the current plan.
    pub fn open_saved(&mut self, plan_id: &Identifier) -> PlanResult<&TreatmentPlan> {
        let Some(plan) = self.saved.iter().find(|saved| saved.id() == plan_id) else {
            tracing::warn!("open rejected: no saved plan {}", plan_id);
            return Err(PlanError::NotFound {
                kind: EntityKind::Plan,
                id: plan_id.clone(),
            });
        };
        let plan = plan.clone();
        Ok(&*self.current.insert(plan))
    }

    /// Merges plan-level details into the current plan.
    pub fn update_plan_details(&mut self, patch: PlanDetailsPatch) -> PlanResult<&TreatmentPlan> {
        self.commit("update plan details", Rejection::Warn, |_, plan, now| {
            let changes = patch.title.as_ref().is_some_and(|t| t != plan.title())
                || patch
                    .description
                    .as_ref()
                    .is_some_and(|d| d != plan.description())
                || patch.patient.as_ref().is_some_and(|p| p != plan.patient());
            let mut next = plan.clone();
            if !changes {
                return Ok(next);
            }
            if let Some(title) = patch.title {
                next.title = title;
            }
            if let Some(description) = patch.description {
                next.description = description;
            }
            if let Some(patient) = patch.patient {
                next.patient = patient;
            }
            next.touch(now);
            Ok(next)
        })
    }

    pub fn add_phase(&mut self, phase: NewPhase) -> PlanResult<&TreatmentPlan> {
        self.commit("add phase", Rejection::Warn, |engine, plan, now| {
            Ok(engine.add_phase(plan, phase, now))
        })
    }

    pub fn update_phase(
        &mut self,
        phase_id: &Identifier,
        patch: PhasePatch,
    ) -> PlanResult<&TreatmentPlan> {
        self.commit("update phase", Rejection::Warn, |engine, plan, now| {
            engine.update_phase(plan, phase_id, patch, now)
        })
    }

    pub fn remove_phase(&mut self, phase_id: &Identifier) -> PlanResult<&TreatmentPlan> {
        self.commit("remove phase", Rejection::Warn, |engine, plan, now| {
            Ok(engine.remove_phase(plan, phase_id, now))
        })
    }

    pub fn reorder_phases(&mut self, from: usize, to: usize) -> PlanResult<&TreatmentPlan> {
        self.commit("reorder phases", Rejection::Warn, |engine, plan, now| {
            engine.reorder_phases(plan, from, to, now)
        })
    }

    pub fn add_item_to_phase(
        &mut self,
        phase_id: &Identifier,
        item: &TreatmentItem,
        at: Option<usize>,
    ) -> PlanResult<&TreatmentPlan> {
        self.commit("add item", Rejection::Warn, |engine, plan, now| {
            engine.add_item_to_phase(plan, phase_id, item, at, now)
        })
    }

    /// Places a clone of the catalog template `template_id` into a phase.
    pub fn add_catalog_item(
        &mut self,
        phase_id: &Identifier,
        template_id: &Identifier,
        at: Option<usize>,
    ) -> PlanResult<&TreatmentPlan> {
        let template = match self.catalog.require(template_id) {
            Ok(template) => Arc::clone(template),
            Err(err) => {
                tracing::warn!("add catalog item rejected: {}", err);
                return Err(err);
            }
        };
        self.add_item_to_phase(phase_id, &template, at)
    }

    pub fn remove_item_from_phase(
        &mut self,
        phase_id: &Identifier,
        item_id: &Identifier,
    ) -> PlanResult<&TreatmentPlan> {
        self.commit("remove item", Rejection::Warn, |engine, plan, now| {
            engine.remove_item_from_phase(plan, phase_id, item_id, now)
        })
    }

    pub fn move_item_between_phases(
        &mut self,
        from_phase_id: &Identifier,
        to_phase_id: &Identifier,
        item_id: &Identifier,
        to_index: usize,
    ) -> PlanResult<&TreatmentPlan> {
        self.commit("move item", Rejection::Warn, |engine, plan, now| {
            engine.move_item_between_phases(plan, from_phase_id, to_phase_id, item_id, to_index, now)
        })
    }

    pub fn reorder_item_within_phase(
        &mut self,
        phase_id: &Identifier,
        from: usize,
        to: usize,
    ) -> PlanResult<&TreatmentPlan> {
        self.commit("reorder items", Rejection::Warn, |engine, plan, now| {
            engine.reorder_item_within_phase(plan, phase_id, from, to, now)
        })
    }

    /// Applies one classified move.
    pub fn apply_move(&mut self, plan_move: PlanMove) -> PlanResult<&TreatmentPlan> {
        self.run_move(plan_move, Rejection::Warn)
    }

    /// Applies a completed drag to the current plan.
    ///
    /// Returns `true` if the plan changed. Unclassifiable drops and rejected moves are logged at
    /// debug level and otherwise ignored; they never surface as errors.
    pub fn apply_drop(&mut self, outcome: &DropOutcome) -> bool {
        let Some(plan) = self.current.as_ref() else {
            tracing::debug!("drop ignored: no current plan");
            return false;
        };

        let adapter = GestureAdapter::new(self.cfg.container_keys(), &self.catalog);
        let plan_move = match adapter.classify(plan, outcome) {
            Ok(plan_move) => plan_move,
            Err(err) => {
                tracing::debug!("drop ignored: {}", err);
                return false;
            }
        };
        tracing::debug!("drop classified as {:?}", plan_move);

        let previous = plan.clone();
        match self.run_move(plan_move, Rejection::Debug) {
            Ok(next) => next != &previous,
            Err(_) => false,
        }
    }

    fn run_move(
        &mut self,
        plan_move: PlanMove,
        rejection: Rejection,
    ) -> PlanResult<&TreatmentPlan> {
        match plan_move {
            PlanMove::PlaceFromCatalog {
                phase_id,
                template,
                at,
            } => self.commit("add item", rejection, |engine, plan, now| {
                engine.add_item_to_phase(plan, &phase_id, &template, Some(at), now)
            }),
            PlanMove::MoveBetweenPhases {
                from_phase_id,
                to_phase_id,
                item_id,
                to_index,
            } => self.commit("move item", rejection, |engine, plan, now| {
                engine.move_item_between_phases(
                    plan,
                    &from_phase_id,
                    &to_phase_id,
                    &item_id,
                    to_index,
                    now,
                )
            }),
            PlanMove::ReorderWithinPhase {
                phase_id,
                from_index,
                to_index,
            } => self.commit("reorder items", rejection, |engine, plan, now| {
                engine.reorder_item_within_phase(plan, &phase_id, from_index, to_index, now)
            }),
            PlanMove::ReorderPhases {
                from_index,
                to_index,
            } => self.commit("reorder phases", rejection, |engine, plan, now| {
                engine.reorder_phases(plan, from_index, to_index, now)
            }),
        }
    }

    /// Runs one engine operation against the current plan and commits the result.
    fn commit<F>(
        &mut self,
        action: &str,
        rejection: Rejection,
        op: F,
    ) -> PlanResult<&TreatmentPlan>
    where
        F: FnOnce(&MutationEngine, &TreatmentPlan, DateTime<Utc>) -> PlanResult<TreatmentPlan>,
    {
        let Some(plan) = self.current.as_ref() else {
            tracing::warn!("{} rejected: no current plan", action);
            return Err(PlanError::NoCurrentPlan);
        };

        let now = self.clock.now();
        match op(&self.engine, plan, now) {
            Ok(next) => {
                tracing::debug!("{} applied to plan {}", action, next.id());
                Ok(&*self.current.insert(next))
            }
            Err(err) => {
                match rejection {
                    Rejection::Warn => tracing::warn!("{} rejected: {}", action, err),
                    Rejection::Debug => tracing::debug!("{} rejected: {}", action, err),
                }
                Err(err)
            }
        }
    }
}
