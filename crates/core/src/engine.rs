//! Mutation engine for treatment plans.
//!
//! Every operation takes the current plan by reference and returns a brand-new plan; the input
//! is never modified. Untouched phases and items are shared with the input through their `Arc`s,
//! and anything that changes is copied first (`Arc::make_mut`), so a reader holding the old
//! snapshot never observes a torn update.
//!
//! ## Timestamps
//! Operations receive `now` from the caller instead of reading the clock, which keeps them
//! deterministic. A successful change stamps `updated_at = now`. Operations that turn out to
//! change nothing (removing an absent id, a patch equal to the current values, moving an entry
//! onto its own position) return an identical copy with `updated_at` untouched.
//!
//! ## Indices
//! Reorders use the "remove, then insert into the shortened list" convention: moving index 0 to
//! index 2 in `[a, b, c]` yields `[b, c, a]`.

use crate::model::{
    ensure_unique_items, renumber_phases, NewPhase, PhasePatch, TreatmentItem, TreatmentPhase,
    TreatmentPlan,
};
use crate::{PlanError, PlanResult};
use careplan_types::Identifier;
use careplan_uuid::IdGenerator;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Computes new plans from old plans plus a move description.
///
/// The only dependency is the identity generator used for new phases and placed item clones.
#[derive(Clone)]
pub struct MutationEngine {
    ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for MutationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationEngine").finish_non_exhaustive()
    }
}

impl MutationEngine {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    /// Appends a phase with a fresh identity and `order = len + 1`.
    pub fn add_phase(
        &self,
        plan: &TreatmentPlan,
        phase: NewPhase,
        now: DateTime<Utc>,
    ) -> TreatmentPlan {
        let mut next = plan.clone();
        let new_phase = TreatmentPhase::new(self.ids.next_id(), phase.title, phase.description);
        next.phases.push(Arc::new(new_phase));
        renumber_phases(&mut next.phases);
        next.touch(now);
        next
    }

    /// Merges `patch` into the identified phase.
    ///
    /// # Errors
    ///
    /// - [`PlanError::NotFound`] if no phase has `phase_id`.
    /// - [`PlanError::DuplicateItem`] if the patched item list repeats an identity.
    pub fn update_phase(
        &self,
        plan: &TreatmentPlan,
        phase_id: &Identifier,
        patch: PhasePatch,
        now: DateTime<Utc>,
    ) -> PlanResult<TreatmentPlan> {
        let index = locate_phase(plan, phase_id)?;
        if let Some(items) = &patch.items {
            ensure_unique_items(items)?;
        }

        let current = &plan.phases[index];
        let changes_title = patch.title.as_ref().is_some_and(|t| t != &current.title);
        let changes_description = patch
            .description
            .as_ref()
            .is_some_and(|d| d != &current.description);
        let changes_items = patch.items.as_ref().is_some_and(|i| i != &current.items);
        if !(changes_title || changes_description || changes_items) {
            return Ok(plan.clone());
        }

        let mut next = plan.clone();
        let phase = Arc::make_mut(&mut next.phases[index]);
        if let Some(title) = patch.title {
            phase.title = title;
        }
        if let Some(description) = patch.description {
            phase.description = description;
        }
        if let Some(items) = patch.items {
            phase.items = items;
        }
        next.touch(now);
        Ok(next)
    }

    /// Deletes a phase and all of its items, then renumbers the remaining phases.
    ///
    /// Removing an absent phase is a no-op.
    pub fn remove_phase(
        &self,
        plan: &TreatmentPlan,
        phase_id: &Identifier,
        now: DateTime<Utc>,
    ) -> TreatmentPlan {
        let Some(index) = plan.phase_index(phase_id) else {
            return plan.clone();
        };

        let mut next = plan.clone();
        next.phases.remove(index);
        renumber_phases(&mut next.phases);
        next.touch(now);
        next
    }

    /// Moves the phase at `from` to `to`; every phase's order becomes its new list position.
    ///
    /// # Errors
    ///
    /// [`PlanError::IndexOutOfRange`] if either index is outside `[0, len)`.
    pub fn reorder_phases(
        &self,
        plan: &TreatmentPlan,
        from: usize,
        to: usize,
        now: DateTime<Utc>,
    ) -> PlanResult<TreatmentPlan> {
        let len = plan.phases.len();
        check_index(from, len)?;
        check_index(to, len)?;
        if from == to {
            return Ok(plan.clone());
        }

        let mut next = plan.clone();
        relocate(&mut next.phases, from, to);
        renumber_phases(&mut next.phases);
        next.touch(now);
        Ok(next)
    }

    /// Places a clone of `item` with a fresh identity into the phase.
    ///
    /// `at` is clamped to `[0, len]`; `None` appends.
    ///
    /// # Errors
    ///
    /// [`PlanError::NotFound`] if no phase has `phase_id`.
    pub fn add_item_to_phase(
        &self,
        plan: &TreatmentPlan,
        phase_id: &Identifier,
        item: &TreatmentItem,
        at: Option<usize>,
        now: DateTime<Utc>,
    ) -> PlanResult<TreatmentPlan> {
        let index = locate_phase(plan, phase_id)?;
        let placed = Arc::new(item.placed_copy(self.ids.next_id()));

        let mut next = plan.clone();
        let phase = Arc::make_mut(&mut next.phases[index]);
        if phase.item_index(&placed.id).is_some() {
            return Err(PlanError::DuplicateItem(placed.id.clone()));
        }
        let position = at.map_or(phase.items.len(), |i| i.min(phase.items.len()));
        phase.items.insert(position, placed);
        next.touch(now);
        Ok(next)
    }

    /// Removes an item by identity. Removing an absent item is a no-op.
    ///
    /// # Errors
    ///
    /// [`PlanError::NotFound`] if no phase has `phase_id`.
    pub fn remove_item_from_phase(
        &self,
        plan: &TreatmentPlan,
        phase_id: &Identifier,
        item_id: &Identifier,
        now: DateTime<Utc>,
    ) -> PlanResult<TreatmentPlan> {
        let index = locate_phase(plan, phase_id)?;
        let Some(position) = plan.phases[index].item_index(item_id) else {
            return Ok(plan.clone());
        };

        let mut next = plan.clone();
        Arc::make_mut(&mut next.phases[index]).items.remove(position);
        next.touch(now);
        Ok(next)
    }

    /// Moves an item, identity preserved, from one phase into another at `to_index`.
    ///
    /// `to_index` is clamped to the destination length. When both phase ids are equal this is
    /// an in-phase reorder to `min(to_index, len - 1)`.
    ///
    /// # Errors
    ///
    /// - [`PlanError::NotFound`] if either phase is absent or the item is not in the source.
    /// - [`PlanError::DuplicateItem`] if the destination already holds the identity.
    pub fn move_item_between_phases(
        &self,
        plan: &TreatmentPlan,
        from_phase_id: &Identifier,
        to_phase_id: &Identifier,
        item_id: &Identifier,
        to_index: usize,
        now: DateTime<Utc>,
    ) -> PlanResult<TreatmentPlan> {
        let source = locate_phase(plan, from_phase_id)?;
        let destination = locate_phase(plan, to_phase_id)?;
        let position = plan.phases[source]
            .item_index(item_id)
            .ok_or_else(|| PlanError::item_not_found(item_id))?;

        if source == destination {
            let last = plan.phases[source].items.len() - 1;
            return self.reorder_item_within_phase(
                plan,
                from_phase_id,
                position,
                to_index.min(last),
                now,
            );
        }

        if plan.phases[destination].item_index(item_id).is_some() {
            return Err(PlanError::DuplicateItem(item_id.clone()));
        }

        let mut next = plan.clone();
        let item = Arc::make_mut(&mut next.phases[source]).items.remove(position);
        let target = Arc::make_mut(&mut next.phases[destination]);
        let insert_at = to_index.min(target.items.len());
        target.items.insert(insert_at, item);
        next.touch(now);
        Ok(next)
    }

    /// Moves the item at `from` to `to` within one phase.
    ///
    /// # Errors
    ///
    /// - [`PlanError::NotFound`] if no phase has `phase_id`.
    /// - [`PlanError::IndexOutOfRange`] if either index is outside `[0, len)`.
    pub fn reorder_item_within_phase(
        &self,
        plan: &TreatmentPlan,
        phase_id: &Identifier,
        from: usize,
        to: usize,
        now: DateTime<Utc>,
    ) -> PlanResult<TreatmentPlan> {
        let index = locate_phase(plan, phase_id)?;
        let len = plan.phases[index].items.len();
        check_index(from, len)?;
        check_index(to, len)?;
        if from == to {
            return Ok(plan.clone());
        }

        let mut next = plan.clone();
        relocate(&mut Arc::make_mut(&mut next.phases[index]).items, from, to);
        next.touch(now);
        Ok(next)
    }
}

fn locate_phase(plan: &TreatmentPlan, phase_id: &Identifier) -> PlanResult<usize> {
    plan.phase_index(phase_id)
        .ok_or_else(|| PlanError::phase_not_found(phase_id))
}

fn check_index(index: usize, len: usize) -> PlanResult<()> {
    if index >= len {
        return Err(PlanError::IndexOutOfRange { index, len });
    }
    Ok(())
}

/// Remove at `from`, then insert at `to` into the shortened list.
fn relocate<T>(list: &mut Vec<T>, from: usize, to: usize) {
    let entry = list.remove(from);
    list.insert(to, entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Cost, PersonRef};
    use careplan_types::NonEmptyText;
    use careplan_uuid::SequentialIdGenerator;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn setup_engine() -> MutationEngine {
        MutationEngine::new(Arc::new(SequentialIdGenerator::new("gen").unwrap()))
    }

    fn sample_item(item_id: &str) -> Arc<TreatmentItem> {
        Arc::new(TreatmentItem {
            id: id(item_id),
            title: text(&format!("Item {item_id}")),
            description: String::new(),
            duration_minutes: 30,
            cost: Cost::from_minor_units(1000),
            category: Category::Procedure,
            color: None,
        })
    }

    fn sample_phase(phase_id: &str, items: &[&str]) -> TreatmentPhase {
        TreatmentPhase::new(id(phase_id), text(phase_id), "")
            .with_items(items.iter().map(|i| sample_item(i)).collect())
            .unwrap()
    }

    fn sample_plan(phases: Vec<TreatmentPhase>) -> TreatmentPlan {
        TreatmentPlan::new(
            id("plan-1"),
            PersonRef::new(id("patient-1"), text("Jane Doe")),
            PersonRef::new(id("doctor-1"), text("Dr Smith")),
            text("Knee rehabilitation"),
            "",
            t0(),
        )
        .with_phases(phases)
        .unwrap()
    }

    fn item_ids(plan: &TreatmentPlan, phase_id: &str) -> Vec<String> {
        plan.phase(&id(phase_id))
            .unwrap()
            .items()
            .iter()
            .map(|i| i.id.to_string())
            .collect()
    }

    fn phase_ids(plan: &TreatmentPlan) -> Vec<String> {
        plan.phases().iter().map(|p| p.id().to_string()).collect()
    }

    fn orders(plan: &TreatmentPlan) -> Vec<u32> {
        plan.phases().iter().map(|p| p.order()).collect()
    }

    #[test]
    fn move_between_phases_inserts_at_index() {
        let engine = setup_engine();
        let plan = sample_plan(vec![
            sample_phase("P1", &["a", "b"]),
            sample_phase("P2", &["c"]),
        ]);
        let later = t0() + Duration::minutes(1);

        let next = engine
            .move_item_between_phases(&plan, &id("P1"), &id("P2"), &id("b"), 0, later)
            .unwrap();

        assert_eq!(item_ids(&next, "P1"), vec!["a"]);
        assert_eq!(item_ids(&next, "P2"), vec!["b", "c"]);
        assert_eq!(next.updated_at(), later);
        // Identity and instance are preserved.
        assert!(Arc::ptr_eq(
            next.phase(&id("P2")).unwrap().item(&id("b")).unwrap(),
            plan.phase(&id("P1")).unwrap().item(&id("b")).unwrap(),
        ));
    }

    #[test]
    fn reorder_within_phase_moves_first_to_last() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &["a", "b", "c"])]);

        let next = engine
            .reorder_item_within_phase(&plan, &id("P1"), 0, 2, t0())
            .unwrap();

        assert_eq!(item_ids(&next, "P1"), vec!["b", "c", "a"]);
    }

    #[test]
    fn reorder_within_phase_moves_last_to_first() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &["a", "b", "c"])]);

        let next = engine
            .reorder_item_within_phase(&plan, &id("P1"), 2, 0, t0())
            .unwrap();

        assert_eq!(item_ids(&next, "P1"), vec!["c", "a", "b"]);
    }

    #[test]
    fn reorder_within_phase_rejects_out_of_range() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &["a", "b"])]);

        let err = engine
            .reorder_item_within_phase(&plan, &id("P1"), 0, 2, t0())
            .unwrap_err();
        assert!(matches!(err, PlanError::IndexOutOfRange { index: 2, len: 2 }));

        let err = engine
            .reorder_item_within_phase(&plan, &id("P1"), 5, 0, t0())
            .unwrap_err();
        assert!(matches!(err, PlanError::IndexOutOfRange { index: 5, len: 2 }));
    }

    #[test]
    fn add_item_twice_yields_distinct_identities() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &[])]);
        let template = sample_item("cat-1");

        let once = engine
            .add_item_to_phase(&plan, &id("P1"), &template, None, t0())
            .unwrap();
        let twice = engine
            .add_item_to_phase(&once, &id("P1"), &template, None, t0())
            .unwrap();

        let items = twice.phase(&id("P1")).unwrap().items();
        assert_eq!(items.len(), 2);
        assert_ne!(items[0].id, items[1].id);
        for item in items {
            assert_ne!(item.id, template.id);
            assert_eq!(item.title, template.title);
            assert_eq!(item.category, template.category);
        }
        // The template itself is untouched.
        assert_eq!(template.id.as_str(), "cat-1");
    }

    #[test]
    fn add_item_clamps_index() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &["a", "b"])]);
        let template = sample_item("cat-1");

        let front = engine
            .add_item_to_phase(&plan, &id("P1"), &template, Some(0), t0())
            .unwrap();
        assert_eq!(item_ids(&front, "P1"), vec!["gen-1", "a", "b"]);

        let clamped = engine
            .add_item_to_phase(&plan, &id("P1"), &template, Some(99), t0())
            .unwrap();
        assert_eq!(item_ids(&clamped, "P1"), vec!["a", "b", "gen-2"]);
    }

    #[test]
    fn add_item_to_missing_phase_is_not_found() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &[])]);

        let err = engine
            .add_item_to_phase(&plan, &id("P9"), &sample_item("cat-1"), None, t0())
            .unwrap_err();
        assert!(matches!(err, PlanError::NotFound { id, .. } if id.as_str() == "P9"));
    }

    #[test]
    fn reorder_phases_moves_last_to_front_and_renumbers() {
        let engine = setup_engine();
        let plan = sample_plan(vec![
            sample_phase("P1", &[]),
            sample_phase("P2", &[]),
            sample_phase("P3", &[]),
        ]);

        let next = engine.reorder_phases(&plan, 2, 0, t0()).unwrap();

        assert_eq!(phase_ids(&next), vec!["P3", "P1", "P2"]);
        assert_eq!(orders(&next), vec![1, 2, 3]);
        let effective: Vec<u32> = next.effective_order().map(|(o, _)| o).collect();
        assert_eq!(effective, vec![1, 2, 3]);
    }

    #[test]
    fn reorder_phases_rejects_out_of_range() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &[])]);

        let err = engine.reorder_phases(&plan, 0, 1, t0()).unwrap_err();
        assert!(matches!(err, PlanError::IndexOutOfRange { index: 1, len: 1 }));
    }

    #[test]
    fn add_phase_appends_with_dense_order() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &[])]);

        let next = engine.add_phase(
            &plan,
            NewPhase::new(text("Maintenance"), "Long-term care"),
            t0() + Duration::hours(1),
        );

        assert_eq!(next.phases().len(), 2);
        let added = &next.phases()[1];
        assert_eq!(added.id().as_str(), "gen-1");
        assert_eq!(added.title().as_str(), "Maintenance");
        assert_eq!(orders(&next), vec![1, 2]);
        assert!(added.items().is_empty());
    }

    #[test]
    fn remove_phase_renumbers_and_is_idempotent() {
        let engine = setup_engine();
        let plan = sample_plan(vec![
            sample_phase("P1", &["a"]),
            sample_phase("P2", &["b"]),
            sample_phase("P3", &["c"]),
        ]);
        let later = t0() + Duration::minutes(5);

        let next = engine.remove_phase(&plan, &id("P2"), later);
        assert_eq!(phase_ids(&next), vec!["P1", "P3"]);
        assert_eq!(orders(&next), vec![1, 2]);
        assert_eq!(next.item_count(), 2);

        let again = engine.remove_phase(&next, &id("P2"), later + Duration::minutes(1));
        assert_eq!(again, next);
    }

    #[test]
    fn update_phase_merges_fields() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &["a", "b"])]);
        let later = t0() + Duration::minutes(2);

        let patch = PhasePatch {
            description: Some("Weeks 1-4".into()),
            ..PhasePatch::default()
        };
        let next = engine.update_phase(&plan, &id("P1"), patch, later).unwrap();

        let phase = next.phase(&id("P1")).unwrap();
        assert_eq!(phase.description(), "Weeks 1-4");
        assert_eq!(phase.title().as_str(), "P1");
        assert_eq!(item_ids(&next, "P1"), vec!["a", "b"]);
        assert_eq!(next.updated_at(), later);
    }

    #[test]
    fn update_phase_without_changes_keeps_timestamp() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &[])]);

        let patch = PhasePatch {
            title: Some(text("P1")),
            ..PhasePatch::default()
        };
        let next = engine
            .update_phase(&plan, &id("P1"), patch, t0() + Duration::days(1))
            .unwrap();
        assert_eq!(next.updated_at(), t0());
    }

    #[test]
    fn update_phase_missing_is_not_found() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &[])]);

        let err = engine
            .update_phase(&plan, &id("nope"), PhasePatch::default(), t0())
            .unwrap_err();
        assert!(matches!(err, PlanError::NotFound { .. }));
    }

    #[test]
    fn update_phase_rejects_duplicate_items() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &[])]);

        let patch = PhasePatch {
            items: Some(vec![sample_item("x"), sample_item("x")]),
            ..PhasePatch::default()
        };
        let err = engine.update_phase(&plan, &id("P1"), patch, t0()).unwrap_err();
        assert!(matches!(err, PlanError::DuplicateItem(_)));
    }

    #[test]
    fn remove_item_twice_equals_once() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &["a", "b"])]);

        let once = engine
            .remove_item_from_phase(&plan, &id("P1"), &id("a"), t0() + Duration::minutes(1))
            .unwrap();
        let twice = engine
            .remove_item_from_phase(&once, &id("P1"), &id("a"), t0() + Duration::minutes(2))
            .unwrap();

        assert_eq!(item_ids(&once, "P1"), vec!["b"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn remove_item_from_missing_phase_is_not_found() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &["a"])]);

        let err = engine
            .remove_item_from_phase(&plan, &id("P2"), &id("a"), t0())
            .unwrap_err();
        assert!(matches!(err, PlanError::NotFound { .. }));
    }

    #[test]
    fn move_within_same_phase_degenerates_to_reorder() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &["a", "b", "c"])]);

        let next = engine
            .move_item_between_phases(&plan, &id("P1"), &id("P1"), &id("a"), 2, t0())
            .unwrap();
        assert_eq!(item_ids(&next, "P1"), vec!["b", "c", "a"]);

        // Past-the-end clamps to the last slot without duplicating.
        let clamped = engine
            .move_item_between_phases(&plan, &id("P1"), &id("P1"), &id("b"), 10, t0())
            .unwrap();
        assert_eq!(item_ids(&clamped, "P1"), vec!["a", "c", "b"]);
    }

    #[test]
    fn move_missing_item_is_not_found_and_plan_unchanged() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &["a"]), sample_phase("P2", &[])]);
        let before = plan.clone();

        let err = engine
            .move_item_between_phases(&plan, &id("P2"), &id("P1"), &id("a"), 0, t0())
            .unwrap_err();
        assert!(matches!(err, PlanError::NotFound { id, .. } if id.as_str() == "a"));
        assert_eq!(plan, before);

        let err = engine
            .move_item_between_phases(&plan, &id("P1"), &id("P9"), &id("a"), 0, t0())
            .unwrap_err();
        assert!(matches!(err, PlanError::NotFound { id, .. } if id.as_str() == "P9"));
    }

    #[test]
    fn moves_conserve_every_item_exactly_once() {
        let engine = setup_engine();
        let mut plan = sample_plan(vec![
            sample_phase("P1", &["a", "b", "c"]),
            sample_phase("P2", &["d"]),
            sample_phase("P3", &[]),
        ]);
        let before: Vec<String> = {
            let mut ids: Vec<String> = plan
                .phases()
                .iter()
                .flat_map(|p| p.items().iter().map(|i| i.id.to_string()))
                .collect();
            ids.sort();
            ids
        };

        let moves: &[(&str, &str, &str, usize)] = &[
            ("P1", "P3", "b", 0),
            ("P2", "P1", "d", 1),
            ("P1", "P1", "a", 5),
            ("P3", "P2", "b", 3),
            ("P1", "P3", "c", 0),
            ("P1", "P2", "d", 0),
        ];
        for (i, (from, to, item, at)) in moves.iter().enumerate() {
            plan = engine
                .move_item_between_phases(&plan, &id(from), &id(to), &id(item), *at, t0())
                .unwrap_or_else(|e| panic!("move {i} failed: {e}"));
        }
        plan = engine
            .reorder_item_within_phase(&plan, &id("P2"), 0, 1, t0())
            .unwrap();
        assert_eq!(item_ids(&plan, "P2"), vec!["b", "d"]);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for phase in plan.phases() {
            for item in phase.items() {
                *counts.entry(item.id.to_string()).or_default() += 1;
            }
        }
        let mut after: Vec<String> = counts.keys().cloned().collect();
        after.sort();
        assert_eq!(after, before);
        assert!(counts.values().all(|&n| n == 1));
        assert_eq!(plan.item_count(), 4);
    }

    #[test]
    fn returned_plan_does_not_alias_input() {
        let engine = setup_engine();
        let plan = sample_plan(vec![
            sample_phase("P1", &["a", "b"]),
            sample_phase("P2", &["c"]),
        ]);
        let snapshot = plan.clone();

        let mut next = engine
            .reorder_item_within_phase(&plan, &id("P1"), 0, 1, t0())
            .unwrap();

        // Untouched phases are shared, touched ones are copies.
        assert!(Arc::ptr_eq(&next.phases()[1], &plan.phases()[1]));
        assert!(!Arc::ptr_eq(&next.phases()[0], &plan.phases()[0]));

        next.phases.clear();
        assert_eq!(plan, snapshot);
        assert_eq!(item_ids(&plan, "P1"), vec!["a", "b"]);
    }

    #[test]
    fn duplicate_identity_in_destination_is_rejected() {
        let engine = setup_engine();
        let plan = sample_plan(vec![sample_phase("P1", &["a"]), sample_phase("P2", &["a"])]);

        let err = engine
            .move_item_between_phases(&plan, &id("P1"), &id("P2"), &id("a"), 0, t0())
            .unwrap_err();
        assert!(matches!(err, PlanError::DuplicateItem(_)));
    }
}
