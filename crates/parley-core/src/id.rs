//! Unique identifier generation.
//!
//! Session and message identifiers flow through an injectable generator so
//! tests can substitute deterministic sequences.

use uuid::Uuid;

/// An abstract source of opaque unique identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produces a new identifier, unique for the lifetime of the store.
    fn generate(&self) -> String;
}

/// Production identifier source backed by UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
