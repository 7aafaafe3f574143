//! Read-only palette of treatment item templates.
//!
//! The catalog holds three disjoint lists (procedures, medications, follow-ups). It is built once,
//! shared behind an `Arc`, and never mutated: placing a template into a phase clones it.
//!
//! Catalog files are YAML with one list per category:
//!
//! ```yaml
//! procedures:
//!   - id: proc-consultation
//!     title: Initial Consultation
//!     duration: 60
//!     cost: 150
//! medications: []
//! followUps: []
//! ```
//!
//! The category of each template is implied by the list it appears in.

use crate::constants::BUILTIN_CATALOG_YAML;
use crate::error::EntityKind;
use crate::model::{Category, Cost, TreatmentItem};
use crate::{PlanError, PlanResult};
use careplan_types::{Identifier, NonEmptyText};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CatalogWire {
    #[serde(default)]
    procedures: Vec<TemplateWire>,
    #[serde(default)]
    medications: Vec<TemplateWire>,
    #[serde(default)]
    follow_ups: Vec<TemplateWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateWire {
    id: Identifier,
    title: NonEmptyText,
    #[serde(default)]
    description: String,
    duration: u32,
    cost: Cost,
    #[serde(default)]
    color: Option<String>,
}

impl TemplateWire {
    fn into_item(self, category: Category) -> TreatmentItem {
        TreatmentItem {
            id: self.id,
            title: self.title,
            description: self.description,
            duration_minutes: self.duration,
            cost: self.cost,
            category,
            color: self.color,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ItemCatalog {
    procedures: Vec<Arc<TreatmentItem>>,
    medications: Vec<Arc<TreatmentItem>>,
    follow_ups: Vec<Arc<TreatmentItem>>,
    index: HashMap<Identifier, (Category, usize)>,
}

impl ItemCatalog {
    /// Builds a catalog from the three template lists.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidInput`] if a template sits in the list of another category,
    /// or if an identity appears more than once across all lists.
    pub fn new(
        procedures: Vec<TreatmentItem>,
        medications: Vec<TreatmentItem>,
        follow_ups: Vec<TreatmentItem>,
    ) -> PlanResult<Self> {
        let mut catalog = Self {
            procedures: Vec::with_capacity(procedures.len()),
            medications: Vec::with_capacity(medications.len()),
            follow_ups: Vec::with_capacity(follow_ups.len()),
            index: HashMap::new(),
        };

        for (category, templates) in [
            (Category::Procedure, procedures),
            (Category::Medication, medications),
            (Category::FollowUp, follow_ups),
        ] {
            for template in templates {
                catalog.insert(category, template)?;
            }
        }

        Ok(catalog)
    }

    fn insert(&mut self, category: Category, template: TreatmentItem) -> PlanResult<()> {
        if template.category != category {
            return Err(PlanError::InvalidInput(format!(
                "template '{}' has category {} but is listed under {}",
                template.id, template.category, category
            )));
        }
        if self.index.contains_key(&template.id) {
            return Err(PlanError::InvalidInput(format!(
                "duplicate catalog identity: {}",
                template.id
            )));
        }

        let list = self.list_mut(category);
        list.push(Arc::new(template));
        let position = list.len() - 1;
        let id = list[position].id.clone();
        self.index.insert(id, (category, position));
        Ok(())
    }

    /// The standard palette shipped with the crate.
    pub fn builtin() -> PlanResult<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG_YAML)
    }

    /// Parse a catalog from YAML text.
    ///
    /// Uses `serde_path_to_error` so a schema mismatch names the failing field
    /// (e.g. `procedures[2].cost`).
    pub fn from_yaml_str(yaml_text: &str) -> PlanResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, CatalogWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(PlanError::CatalogParse(format!("at {path}: {source}")));
            }
        };

        let into_items = |templates: Vec<TemplateWire>, category: Category| {
            templates
                .into_iter()
                .map(|t| t.into_item(category))
                .collect::<Vec<_>>()
        };

        Self::new(
            into_items(wire.procedures, Category::Procedure),
            into_items(wire.medications, Category::Medication),
            into_items(wire.follow_ups, Category::FollowUp),
        )
    }

    /// Read and parse a YAML catalog file.
    pub fn from_yaml_file(path: &Path) -> PlanResult<Self> {
        let text = std::fs::read_to_string(path).map_err(PlanError::FileRead)?;
        let catalog = Self::from_yaml_str(&text)?;
        tracing::debug!(
            "loaded {} catalog templates from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<Arc<TreatmentItem>> {
        match category {
            Category::Procedure => &mut self.procedures,
            Category::Medication => &mut self.medications,
            Category::FollowUp => &mut self.follow_ups,
        }
    }

    /// Templates of one category, in catalog order.
    pub fn list(&self, category: Category) -> &[Arc<TreatmentItem>] {
        match category {
            Category::Procedure => &self.procedures,
            Category::Medication => &self.medications,
            Category::FollowUp => &self.follow_ups,
        }
    }

    /// Looks up a template by identity in any category.
    pub fn get(&self, id: &Identifier) -> Option<&Arc<TreatmentItem>> {
        self.index
            .get(id)
            .and_then(|(category, position)| self.list(*category).get(*position))
    }

    /// Looks up a template by identity, only if it belongs to `category`.
    pub fn get_in(&self, category: Category, id: &Identifier) -> Option<&Arc<TreatmentItem>> {
        self.get(id).filter(|template| template.category == category)
    }

    /// Like [`ItemCatalog::get`] but with a `NotFound` error for absent identities.
    pub fn require(&self, id: &Identifier) -> PlanResult<&Arc<TreatmentItem>> {
        self.get(id).ok_or_else(|| PlanError::NotFound {
            kind: EntityKind::CatalogItem,
            id: id.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
