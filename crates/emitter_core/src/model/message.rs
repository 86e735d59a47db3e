//! Message domain model.
//!
//! # Responsibility
//! - Define the single record type managed by the message collection.
//! - Provide the pending-delete mark used by the two-step delete protocol.
//!
//! # Invariants
//! - `id` is assigned by a persistence backend and never reused.
//! - `is_sent` is a plain flag; there is no undefined state.
//! - A persisted `body` is never blank after trimming.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Backend-assigned identifier of a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation failures for message writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageValidationError {
    /// Body is empty or whitespace-only.
    EmptyBody,
}

impl Display for MessageValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "message body cannot be blank"),
        }
    }
}

impl Error for MessageValidationError {}

/// Returns whether `body` carries no text once surrounding whitespace is ignored.
pub fn is_blank(body: &str) -> bool {
    body.trim().is_empty()
}

/// Creation request; the backend turns it into a [`Message`] by assigning an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub body: String,
    pub is_sent: bool,
}

impl NewMessage {
    /// New unsent message with the given body.
    pub fn unsent(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            is_sent: false,
        }
    }

    pub fn validate(&self) -> Result<(), MessageValidationError> {
        if is_blank(&self.body) {
            return Err(MessageValidationError::EmptyBody);
        }
        Ok(())
    }
}

/// A single text entry with a sent/unsent flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub body: String,
    pub is_sent: bool,
    /// First half of the delete protocol. Lives only in memory.
    #[serde(skip)]
    pending_delete: bool,
}

impl Message {
    /// Builds a record that already has a backend-assigned id.
    pub fn new(id: MessageId, body: impl Into<String>, is_sent: bool) -> Self {
        Self {
            id,
            body: body.into(),
            is_sent,
            pending_delete: false,
        }
    }

    /// Marks this record for deletion.
    ///
    /// The record stays in storage until a backend persists the deletion.
    pub fn mark_deleted(&mut self) {
        self.pending_delete = true;
    }

    /// Returns whether [`Message::mark_deleted`] has been called.
    pub fn is_marked_for_deletion(&self) -> bool {
        self.pending_delete
    }

    pub fn validate(&self) -> Result<(), MessageValidationError> {
        if is_blank(&self.body) {
            return Err(MessageValidationError::EmptyBody);
        }
        Ok(())
    }
}

/// The three named views over the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFilter {
    /// Unfiltered (`index` route).
    #[default]
    All,
    /// `is_sent == false` (`active` route).
    Unsent,
    /// `is_sent == true` (`completed` route).
    Sent,
}

impl MessageFilter {
    /// Returns whether `message` belongs to this view.
    pub fn matches(self, message: &Message) -> bool {
        match self {
            Self::All => true,
            Self::Unsent => !message.is_sent,
            Self::Sent => message.is_sent,
        }
    }

    /// Route name the view is served under.
    pub fn route_name(self) -> &'static str {
        match self {
            Self::All => "index",
            Self::Unsent => "active",
            Self::Sent => "completed",
        }
    }
}

/// Demo records loaded by the fixture backend and `seed`.
pub fn fixture_messages() -> Vec<NewMessage> {
    vec![
        NewMessage {
            body: "Hola".to_string(),
            is_sent: true,
        },
        NewMessage {
            body: "...".to_string(),
            is_sent: false,
        },
        NewMessage {
            body: "testing 1, 2, 3".to_string(),
            is_sent: false,
        },
    ]
}
