//! Identity generation for placed treatment items, phases and plans.
//!
//! Every item placed from the catalog is a clone carrying a *fresh* identity, and identity is
//! the only key used for moves and removals. The mutation engine therefore never mints ids
//! itself; it asks an injected [`IdGenerator`].
//!
//! Two generators are provided:
//! - [`UuidGenerator`] produces canonical UUIDs (see below) and is what a running session uses.
//! - [`SequentialIdGenerator`] produces `prefix-1`, `prefix-2`, ... and exists so fixtures and
//!   tests can predict identities.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! This is the same value you would get from `Uuid::new_v4().simple().to_string()`.

mod service;

pub use service::{IdGenerator, SequentialIdGenerator, UuidGenerator, UuidService};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
