use careplan_types::{Identifier, TextError};
use std::fmt;

/// The kind of entity a [`PlanError::NotFound`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Plan,
    Phase,
    Item,
    CatalogItem,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Plan => "plan",
            EntityKind::Phase => "phase",
            EntityKind::Item => "item",
            EntityKind::CatalogItem => "catalog item",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: Identifier },
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("invalid gesture: {0}")]
    InvalidGesture(String),
    #[error("no current plan")]
    NoCurrentPlan,
    #[error("duplicate item identity within phase: {0}")]
    DuplicateItem(Identifier),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("catalog schema mismatch: {0}")]
    CatalogParse(String),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("invalid text: {0}")]
    Text(#[from] TextError),
}

impl PlanError {
    pub(crate) fn phase_not_found(id: &Identifier) -> Self {
        PlanError::NotFound {
            kind: EntityKind::Phase,
            id: id.clone(),
        }
    }

    pub(crate) fn item_not_found(id: &Identifier) -> Self {
        PlanError::NotFound {
            kind: EntityKind::Item,
            id: id.clone(),
        }
    }
}

pub type PlanResult<T> = std::result::Result<T, PlanError>;
