//! Domain model for the message collection.
//!
//! # Responsibility
//! - Define the `Message` record and the named views over a collection.
//!
//! # Invariants
//! - Every persisted message is identified by a backend-assigned `MessageId`.
//! - Deletion is a two-step protocol: mark in memory, then persist.

pub mod message;
