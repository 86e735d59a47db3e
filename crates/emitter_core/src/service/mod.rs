//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and notifier calls into use-case level APIs.
//! - Keep front ends decoupled from storage and transport details.

pub mod message_service;
