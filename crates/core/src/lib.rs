//! # Careplan Core
//!
//! Core business logic for the treatment-plan builder.
//!
//! A treatment plan is an ordered list of phases, each an ordered list of treatment items
//! (procedures, medications, follow-ups). Plans are edited through drag-and-drop gestures that
//! reorder items within a phase, move items between phases, place new items from a read-only
//! catalog, or reorder the phases themselves.
//!
//! Components, leaves first:
//! - [`ItemCatalog`]: immutable palette of item templates, keyed by category.
//! - [`model`]: plans, phases and items as immutable snapshots with structural sharing.
//! - [`MutationEngine`]: pure functions from an old plan plus a move to a new plan.
//! - [`GestureAdapter`]: maps a completed drag ([`DropOutcome`]) to at most one move.
//! - [`PlanStore`]: holds the current and saved plans and commits engine results.
//!
//! **No presentation or persistence concerns**: rendering, routing and storage belong to the
//! caller. Everything here is in-memory and single-user.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod model;
pub mod store;

pub use catalog::ItemCatalog;
pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use config::{ContainerKeys, CoreConfig};
pub use engine::MutationEngine;
pub use error::{EntityKind, PlanError, PlanResult};
pub use gesture::{Container, DropOutcome, GestureAdapter, PlanMove};
pub use model::{
    Category, Cost, NewPhase, PersonRef, PhasePatch, PlanDetailsPatch, TreatmentItem,
    TreatmentPhase, TreatmentPlan,
};
pub use store::{PlanStore, SessionState};

// Re-export the identity primitives so callers need only this crate.
pub use careplan_types::{Identifier, NonEmptyText, TextError};
pub use careplan_uuid::{IdGenerator, SequentialIdGenerator, UuidGenerator};
