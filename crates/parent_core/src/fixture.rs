//! Ordered supply of sample entities decoded from JSON.
//!
//! # Responsibility
//! - Hand out fixture records one at a time or in batches, in file order.
//! - Carry the canonical parent fixtures used by tests and the smoke CLI.
//!
//! # Invariants
//! - Each record is handed out at most once per supply.
//! - Decoding applies serde defaults only; no range validation happens here.

use crate::model::parent::Parent;
use serde::de::DeserializeOwned;

/// Canonical parent fixtures. Three entries (ages 97, 138, 63) sit outside
/// the declared age range and are rejected on save.
pub const PARENT_FIXTURES_JSON: &str = include_str!("../fixtures/parents.json");

/// A consumable, ordered supply of `T` decoded from a JSON array.
#[derive(Debug, Clone)]
pub struct Supply<T> {
    all: Vec<T>,
    next: usize,
}

impl<T: DeserializeOwned + Clone> Supply<T> {
    /// Decodes `raw` as a JSON array of `T`.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let all = serde_json::from_str(raw)?;
        Ok(Self { all, next: 0 })
    }

    /// Returns the next record, or `None` once the supply is exhausted.
    pub fn next_one(&mut self) -> Option<T> {
        let item = self.all.get(self.next).cloned()?;
        self.next += 1;
        Some(item)
    }

    /// Returns up to `n` next records; fewer when the supply runs out.
    pub fn next(&mut self, n: usize) -> Vec<T> {
        let end = self.next.saturating_add(n).min(self.all.len());
        let batch = self.all[self.next..end].to_vec();
        self.next = end;
        batch
    }

    /// Number of records not yet handed out.
    pub fn remaining(&self) -> usize {
        self.all.len() - self.next
    }
}

/// Returns a fresh supply over `PARENT_FIXTURES_JSON`.
pub fn parent_supply() -> Result<Supply<Parent>, serde_json::Error> {
    Supply::from_json(PARENT_FIXTURES_JSON)
}
