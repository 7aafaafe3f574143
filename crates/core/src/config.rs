//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the plan store behind
//! an `Arc`. Nothing in the core reads environment variables.

use crate::constants::{
    DEFAULT_PHASE_DESCRIPTION, DEFAULT_PHASE_TITLE, DEFAULT_PLAN_TITLE, FOLLOW_UPS_CONTAINER_KEY,
    MEDICATIONS_CONTAINER_KEY, PHASE_LIST_CONTAINER_KEY, PROCEDURES_CONTAINER_KEY,
};
use crate::model::Category;
use crate::{PlanError, PlanResult};
use careplan_types::NonEmptyText;

/// Keys identifying the non-phase drop containers of the builder.
///
/// Phase containers are keyed by the phase identity; everything else is one of these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerKeys {
    procedures: String,
    medications: String,
    follow_ups: String,
    phase_list: String,
}

impl ContainerKeys {
    /// Create a new set of container keys.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidInput`] if any key is blank or two keys are equal, since the
    /// gesture adapter could then not tell the containers apart.
    pub fn new(
        procedures: impl Into<String>,
        medications: impl Into<String>,
        follow_ups: impl Into<String>,
        phase_list: impl Into<String>,
    ) -> PlanResult<Self> {
        let keys = Self {
            procedures: procedures.into(),
            medications: medications.into(),
            follow_ups: follow_ups.into(),
            phase_list: phase_list.into(),
        };

        let all = keys.all();
        if all.iter().any(|k| k.trim().is_empty()) {
            return Err(PlanError::InvalidInput(
                "container keys cannot be empty".into(),
            ));
        }
        for (i, key) in all.iter().enumerate() {
            if all[i + 1..].contains(key) {
                return Err(PlanError::InvalidInput(format!(
                    "container key '{}' is used more than once",
                    key
                )));
            }
        }

        Ok(keys)
    }

    fn all(&self) -> [&str; 4] {
        [
            &self.procedures,
            &self.medications,
            &self.follow_ups,
            &self.phase_list,
        ]
    }

    /// Key of the palette holding templates of `category`.
    pub fn catalog_key(&self, category: Category) -> &str {
        match category {
            Category::Procedure => &self.procedures,
            Category::Medication => &self.medications,
            Category::FollowUp => &self.follow_ups,
        }
    }

    /// Returns the palette category a container key denotes, if any.
    pub fn catalog_category(&self, key: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| self.catalog_key(*category) == key)
    }

    pub fn phase_list(&self) -> &str {
        &self.phase_list
    }
}

impl Default for ContainerKeys {
    fn default() -> Self {
        Self {
            procedures: PROCEDURES_CONTAINER_KEY.into(),
            medications: MEDICATIONS_CONTAINER_KEY.into(),
            follow_ups: FOLLOW_UPS_CONTAINER_KEY.into(),
            phase_list: PHASE_LIST_CONTAINER_KEY.into(),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    default_plan_title: NonEmptyText,
    default_phase_title: NonEmptyText,
    default_phase_description: String,
    container_keys: ContainerKeys,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        default_plan_title: NonEmptyText,
        default_phase_title: NonEmptyText,
        default_phase_description: String,
        container_keys: ContainerKeys,
    ) -> Self {
        Self {
            default_plan_title,
            default_phase_title,
            default_phase_description,
            container_keys,
        }
    }

    pub fn default_plan_title(&self) -> &NonEmptyText {
        &self.default_plan_title
    }

    pub fn default_phase_title(&self) -> &NonEmptyText {
        &self.default_phase_title
    }

    pub fn default_phase_description(&self) -> &str {
        &self.default_phase_description
    }

    pub fn container_keys(&self) -> &ContainerKeys {
        &self.container_keys
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        const PLAN_TITLE: NonEmptyText = NonEmptyText::from_static(DEFAULT_PLAN_TITLE);
        const PHASE_TITLE: NonEmptyText = NonEmptyText::from_static(DEFAULT_PHASE_TITLE);
        Self {
            default_plan_title: PLAN_TITLE,
            default_phase_title: PHASE_TITLE,
            default_phase_description: DEFAULT_PHASE_DESCRIPTION.into(),
            container_keys: ContainerKeys::default(),
        }
    }
}
