//! Core domain logic for the message emitter.
//! This crate owns the message collection rules; front ends only call in.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use config::{ConfigError, EmitterConfig, LoggingConfig, NotifierConfig, StorageBackend};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::message::{
    fixture_messages, Message, MessageFilter, MessageId, MessageValidationError, NewMessage,
};
pub use notify::{DisabledNotifier, HttpNotifier, Notifier, NotifyError};
pub use repo::fixture_repo::FixtureMessageRepository;
pub use repo::message_repo::{MessageRepository, RepoError, RepoResult, SqliteMessageRepository};
pub use service::message_service::{
    message_label, EditOutcome, EditSession, MessageService, MessageSummary,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
