//! Internal implementation of the identity generators.

use crate::{UuidError, UuidResult};
use careplan_types::Identifier;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Canonical UUID representation (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained UUID is guaranteed to render in canonical form, which makes
/// it safe to embed in container keys handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UuidService(Uuid);

impl Default for UuidService {
    fn default() -> Self {
        Self::new()
    }
}

impl UuidService {
    /// Generates a new random (version 4) UUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns true if `input` is in canonical UUID form.
    ///
    /// Purely syntactic: exactly 32 bytes, all of them `0-9` or `a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Converts this UUID into an opaque [`Identifier`] in canonical form.
    pub fn to_identifier(&self) -> Identifier {
        Identifier::from_hex128(self.0.as_u128())
    }
}

/// Source of fresh identities.
///
/// The only contract is uniqueness for the lifetime of the process: no two calls on the same
/// generator may return equal identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Identifier;
}

/// Generates canonical random UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> Identifier {
        UuidService::new().to_identifier()
    }
}

/// Generates `<prefix>-<n>` identities with `n` counting up from 1.
///
/// Intended for fixtures and tests, where generated ids must be predictable.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: Identifier,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator emitting `<prefix>-1`, `<prefix>-2`, ...
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if the prefix is empty or contains whitespace, since
    /// the generated values would not be valid identifiers.
    pub fn new(prefix: impl Into<String>) -> UuidResult<Self> {
        let prefix = prefix.into();
        let prefix = Identifier::new(prefix.as_str())
            .map_err(|e| UuidError::InvalidInput(format!("id prefix '{}': {}", prefix, e)))?;
        Ok(Self {
            prefix,
            counter: AtomicU64::new(0),
        })
    }

    /// Number of identities issued so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> Identifier {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        self.prefix.numbered(n)
    }
}
