//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract the message aggregator depends on.
//! - Provide interchangeable backends: in-memory fixtures and SQLite.
//!
//! # Invariants
//! - Backends validate records before persisting them.
//! - Backends return semantic errors (`NotFound`, `NotMarkedForDeletion`)
//!   in addition to storage transport errors.

pub mod fixture_repo;
pub mod message_repo;
