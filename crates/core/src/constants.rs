//! Constants used throughout the careplan core crate.
//!
//! Default titles for freshly created plans and the container keys the presentation layer uses
//! for its drop targets.

/// Title given to a plan created by [`crate::PlanStore::create_plan`].
pub const DEFAULT_PLAN_TITLE: &str = "New Treatment Plan";

/// Title of the single phase every new plan starts with.
pub const DEFAULT_PHASE_TITLE: &str = "Phase 1";

/// Description of the single phase every new plan starts with.
pub const DEFAULT_PHASE_DESCRIPTION: &str = "Initial treatment phase";

/// Container key of the procedure palette.
pub const PROCEDURES_CONTAINER_KEY: &str = "procedures";

/// Container key of the medication palette.
pub const MEDICATIONS_CONTAINER_KEY: &str = "medications";

/// Container key of the follow-up palette.
pub const FOLLOW_UPS_CONTAINER_KEY: &str = "followUps";

/// Container key of the phase list itself (dragging whole phases).
pub const PHASE_LIST_CONTAINER_KEY: &str = "phases";

/// The standard palette shipped with the crate.
pub const BUILTIN_CATALOG_YAML: &str = include_str!("../catalog/builtin.yaml");
