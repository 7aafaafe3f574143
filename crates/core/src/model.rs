//! Treatment plan model.
//!
//! A [`TreatmentPlan`] is an ordered list of [`TreatmentPhase`]s, each an ordered list of
//! [`TreatmentItem`]s. Phases and items are held behind `Arc` so the mutation engine can return
//! a new plan that shares every untouched phase and item with the previous snapshot.
//!
//! ## Ordering
//! List position is authoritative. Each phase also carries an `order` field for display, which
//! the engine keeps equal to `position + 1` after every structural change.
//!
//! ## Identity
//! Items are keyed by identity only. Two placed items cloned from the same catalog template have
//! the same title and category but different identities.

use crate::{PlanError, PlanResult};
use careplan_types::{Identifier, NonEmptyText};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::sync::Arc;

/// The three disjoint kinds of treatment item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Procedure,
    Medication,
    FollowUp,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Procedure, Category::Medication, Category::FollowUp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Procedure => "procedure",
            Category::Medication => "medication",
            Category::FollowUp => "followUp",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PlanError::InvalidInput(format!("unknown category '{}'", s)))
    }
}

/// A non-negative monetary amount held in minor units (hundredths).
///
/// Read and written as a decimal number, e.g. `150.5` is 15050 minor units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cost(u64);

impl Cost {
    pub const ZERO: Cost = Cost(0);

    pub fn from_minor_units(minor: u64) -> Self {
        Self(minor)
    }

    /// Converts a decimal amount, rounding to the nearest minor unit.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidInput`] for negative, NaN or infinite amounts.
    pub fn from_decimal(amount: f64) -> PlanResult<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PlanError::InvalidInput(format!(
                "cost must be a non-negative number, got {}",
                amount
            )));
        }
        let minor = (amount * 100.0).round();
        if minor > u64::MAX as f64 {
            return Err(PlanError::InvalidInput(format!("cost {} is too large", amount)));
        }
        Ok(Self(minor as u64))
    }

    pub fn minor_units(&self) -> u64 {
        self.0
    }

    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::ZERO, Add::add)
    }
}

impl Serialize for Cost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Cost {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Cost::from_decimal(amount).map_err(serde::de::Error::custom)
    }
}

/// A procedure, medication or follow-up.
///
/// Catalog templates and placed instances share this shape; a placed instance is a template
/// clone carrying its own identity (see [`TreatmentItem::placed_copy`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentItem {
    pub id: Identifier,
    pub title: NonEmptyText,
    #[serde(default)]
    pub description: String,
    /// Duration in minutes.
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub cost: Cost,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TreatmentItem {
    /// Returns a copy of this item with identity `id` and every other field unchanged.
    pub fn placed_copy(&self, id: Identifier) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }
}

/// A reference to a person (patient or author) by id plus display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Identifier,
    pub name: NonEmptyText,
}

impl PersonRef {
    pub fn new(id: Identifier, name: NonEmptyText) -> Self {
        Self { id, name }
    }
}

/// An ordered stage of a treatment plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentPhase {
    pub(crate) id: Identifier,
    pub(crate) title: NonEmptyText,
    pub(crate) description: String,
    pub(crate) order: u32,
    pub(crate) items: Vec<Arc<TreatmentItem>>,
}

impl TreatmentPhase {
    /// Creates an empty phase. `order` is assigned when the phase joins a plan.
    pub fn new(id: Identifier, title: NonEmptyText, description: impl Into<String>) -> Self {
        Self {
            id,
            title,
            description: description.into(),
            order: 0,
            items: Vec::new(),
        }
    }

    /// Replaces the phase items.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::DuplicateItem`] if two items share an identity.
    pub fn with_items(mut self, items: Vec<Arc<TreatmentItem>>) -> PlanResult<Self> {
        ensure_unique_items(&items)?;
        self.items = items;
        Ok(self)
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn title(&self) -> &NonEmptyText {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Display order, 1-based.
    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn items(&self) -> &[Arc<TreatmentItem>] {
        &self.items
    }

    pub fn item(&self, item_id: &Identifier) -> Option<&Arc<TreatmentItem>> {
        self.items.iter().find(|item| &item.id == item_id)
    }

    pub(crate) fn item_index(&self, item_id: &Identifier) -> Option<usize> {
        self.items.iter().position(|item| &item.id == item_id)
    }

    pub fn total_duration_minutes(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.duration_minutes))
            .sum()
    }

    pub fn total_cost(&self) -> Cost {
        self.items.iter().map(|item| item.cost).sum()
    }
}

/// The full treatment plan: patient/author metadata plus an ordered list of phases.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentPlan {
    pub(crate) id: Identifier,
    pub(crate) patient: PersonRef,
    pub(crate) author: PersonRef,
    pub(crate) title: NonEmptyText,
    pub(crate) description: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) phases: Vec<Arc<TreatmentPhase>>,
}

impl TreatmentPlan {
    /// Creates a plan with no phases, stamped `created_at == updated_at == now`.
    pub fn new(
        id: Identifier,
        patient: PersonRef,
        author: PersonRef,
        title: NonEmptyText,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            patient,
            author,
            title,
            description: description.into(),
            created_at: now,
            updated_at: now,
            phases: Vec::new(),
        }
    }

    /// Replaces the phase list, renumbering `order` from list position.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidInput`] if two phases share an identity.
    pub fn with_phases(mut self, phases: Vec<TreatmentPhase>) -> PlanResult<Self> {
        let mut seen = HashSet::new();
        for phase in &phases {
            if !seen.insert(&phase.id) {
                return Err(PlanError::InvalidInput(format!(
                    "duplicate phase identity: {}",
                    phase.id
                )));
            }
        }
        self.phases = phases.into_iter().map(Arc::new).collect();
        renumber_phases(&mut self.phases);
        Ok(self)
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn patient(&self) -> &PersonRef {
        &self.patient
    }

    pub fn author(&self) -> &PersonRef {
        &self.author
    }

    pub fn title(&self) -> &NonEmptyText {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn phases(&self) -> &[Arc<TreatmentPhase>] {
        &self.phases
    }

    pub fn phase(&self, phase_id: &Identifier) -> Option<&Arc<TreatmentPhase>> {
        self.phases.iter().find(|phase| &phase.id == phase_id)
    }

    pub fn phase_index(&self, phase_id: &Identifier) -> Option<usize> {
        self.phases.iter().position(|phase| &phase.id == phase_id)
    }

    /// Phases paired with their 1-based order derived from list position.
    pub fn effective_order(&self) -> impl Iterator<Item = (u32, &Arc<TreatmentPhase>)> {
        self.phases
            .iter()
            .enumerate()
            .map(|(i, phase)| (position_to_order(i), phase))
    }

    pub fn item_count(&self) -> usize {
        self.phases.iter().map(|phase| phase.items.len()).sum()
    }

    pub fn total_duration_minutes(&self) -> u64 {
        self.phases
            .iter()
            .map(|phase| phase.total_duration_minutes())
            .sum()
    }

    pub fn total_cost(&self) -> Cost {
        self.phases.iter().map(|phase| phase.total_cost()).sum()
    }

    /// Sets `updated_at`, never letting it fall behind `created_at`.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

/// Fields supplied by the caller when appending a phase.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewPhase {
    pub title: NonEmptyText,
    #[serde(default)]
    pub description: String,
}

impl NewPhase {
    pub fn new(title: NonEmptyText, description: impl Into<String>) -> Self {
        Self {
            title,
            description: description.into(),
        }
    }
}

/// Partial update of a phase. `None` leaves the field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhasePatch {
    pub title: Option<NonEmptyText>,
    pub description: Option<String>,
    pub items: Option<Vec<Arc<TreatmentItem>>>,
}

/// Partial update of the plan-level details. `None` leaves the field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetailsPatch {
    #[serde(default)]
    pub title: Option<NonEmptyText>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub patient: Option<PersonRef>,
}

pub(crate) fn position_to_order(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

/// Rewrites `order` to `position + 1`, copying only the phases whose order actually changes.
pub(crate) fn renumber_phases(phases: &mut [Arc<TreatmentPhase>]) {
    for (i, phase) in phases.iter_mut().enumerate() {
        let order = position_to_order(i);
        if phase.order != order {
            Arc::make_mut(phase).order = order;
        }
    }
}

pub(crate) fn ensure_unique_items(items: &[Arc<TreatmentItem>]) -> PlanResult<()> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(&item.id) {
            return Err(PlanError::DuplicateItem(item.id.clone()));
        }
    }
    Ok(())
}
