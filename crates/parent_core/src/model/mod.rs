//! Domain model for persisted parent records.
//!
//! # Responsibility
//! - Define canonical data structures used by the repository layer.
//!
//! # Invariants
//! - Every persisted record is identified by a store-assigned `ParentId`.
//! - Deletion is a hard delete; identities are never reused.

pub mod parent;
