//! Message collection aggregator.
//!
//! # Responsibility
//! - Derive counts, labels and filtered views over the live collection.
//! - Apply single-record and bulk mutations, persisting each change.
//!
//! # Invariants
//! - Derived values are read fresh from the repository on every call.
//! - Blank bodies never reach storage: `create` skips them and edits turn
//!   them into deletions.
//! - Deletion always runs both steps: mark, then persist.
//! - Notifier failures are logged and never undo local state.

use crate::model::message::{is_blank, Message, MessageFilter, MessageId, NewMessage};
use crate::notify::Notifier;
use crate::repo::message_repo::{MessageRepository, RepoError, RepoResult};
use log::{info, warn};
use serde::Serialize;

const SINGULAR_LABEL: &str = "message";
const PLURAL_LABEL: &str = "messages";

/// Noun used next to a remaining-message count.
///
/// `"message"` for exactly one, `"messages"` otherwise (including zero).
pub fn message_label(count: u64) -> &'static str {
    if count == 1 {
        SINGULAR_LABEL
    } else {
        PLURAL_LABEL
    }
}

/// Snapshot of every derived value, computed from fresh reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    pub total: u64,
    pub remaining: u64,
    pub sent: u64,
    pub has_sent: bool,
    pub all_done: bool,
    pub label: &'static str,
}

/// Result of leaving the editing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Body was non-blank and has been persisted.
    Saved(Message),
    /// Body was blank; the record has been deleted.
    Deleted(MessageId),
}

/// A message in the editing state.
///
/// Nothing is persisted until the session is handed to
/// [`MessageService::accept_edit`]. Dropping the session, or calling
/// [`EditSession::cancel`], discards the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    message: Message,
    draft: String,
}

impl EditSession {
    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, body: impl Into<String>) {
        self.draft = body.into();
    }

    /// Leaves the editing state without saving and returns the untouched record.
    pub fn cancel(self) -> Message {
        self.message
    }
}

/// Aggregator over a message repository and an outbound notifier.
pub struct MessageService<R: MessageRepository, N: Notifier> {
    repo: R,
    notifier: N,
}

impl<R: MessageRepository, N: Notifier> MessageService<R, N> {
    /// Creates a service over the provided backend and notifier.
    pub fn new(repo: R, notifier: N) -> Self {
        Self { repo, notifier }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates an unsent message.
    ///
    /// # Contract
    /// - Blank `body` is a no-op returning `Ok(None)`.
    /// - Otherwise the body is stored as given (not trimmed).
    pub fn create_message(&self, body: &str) -> RepoResult<Option<Message>> {
        if is_blank(body) {
            info!("event=message_create module=service status=skip reason=blank_body");
            return Ok(None);
        }

        let message = self.repo.create_message(&NewMessage::unsent(body))?;
        info!(
            "event=message_create module=service status=ok id={} body_len={}",
            message.id,
            message.body.len()
        );
        Ok(Some(message))
    }

    /// Creates a message from a caller-owned staging field.
    ///
    /// `draft` is cleared only when a record was actually created.
    pub fn create_from_draft(&self, draft: &mut String) -> RepoResult<Option<Message>> {
        let created = self.create_message(draft.as_str())?;
        if created.is_some() {
            draft.clear();
        }
        Ok(created)
    }

    pub fn get_message(&self, id: MessageId) -> RepoResult<Option<Message>> {
        self.repo.get_message(id)
    }

    /// Like [`Self::get_message`] but treats a missing id as `NotFound`.
    pub fn require_message(&self, id: MessageId) -> RepoResult<Message> {
        self.repo.get_message(id)?.ok_or(RepoError::NotFound(id))
    }

    /// Lists one of the three named views.
    pub fn list_messages(&self, filter: MessageFilter) -> RepoResult<Vec<Message>> {
        self.repo.list_messages(filter)
    }

    pub fn total_count(&self) -> RepoResult<u64> {
        self.repo.count_messages(MessageFilter::All)
    }

    pub fn remaining_count(&self) -> RepoResult<u64> {
        self.repo.count_messages(MessageFilter::Unsent)
    }

    pub fn sent_count(&self) -> RepoResult<u64> {
        self.repo.count_messages(MessageFilter::Sent)
    }

    pub fn has_sent(&self) -> RepoResult<bool> {
        Ok(self.sent_count()? > 0)
    }

    /// `"message"` when exactly one message remains unsent, else `"messages"`.
    pub fn pluralize_label(&self) -> RepoResult<&'static str> {
        Ok(message_label(self.remaining_count()?))
    }

    /// `true` iff the collection is non-empty and every member is sent.
    pub fn all_are_done(&self) -> RepoResult<bool> {
        let total = self.total_count()?;
        Ok(total > 0 && self.sent_count()? == total)
    }

    /// Sets `is_sent = value` on every member; returns how many changed.
    pub fn set_all_done(&self, value: bool) -> RepoResult<usize> {
        let mut changed = 0;
        for mut message in self.repo.list_messages(MessageFilter::All)? {
            if message.is_sent == value {
                continue;
            }
            message.is_sent = value;
            self.repo.save_message(&message)?;
            changed += 1;
        }

        info!(
            "event=messages_set_all module=service status=ok value={} changed={}",
            value, changed
        );
        Ok(changed)
    }

    /// Deletes every message that is sent at call time; returns how many.
    pub fn clear_sent(&self) -> RepoResult<usize> {
        let snapshot = self.repo.list_messages(MessageFilter::Sent)?;
        let cleared = snapshot.len();
        for mut message in snapshot {
            self.destroy(&mut message)?;
        }

        info!(
            "event=messages_clear_sent module=service status=ok cleared={}",
            cleared
        );
        Ok(cleared)
    }

    /// Getter half of the per-record sent flag accessor.
    pub fn is_sent(&self, message: &Message) -> bool {
        message.is_sent
    }

    /// Setter half: assigns, persists, and returns `value`.
    pub fn set_sent(&self, message: &mut Message, value: bool) -> RepoResult<bool> {
        message.is_sent = value;
        self.repo.save_message(message)?;
        info!(
            "event=message_set_sent module=service status=ok id={} value={}",
            message.id, value
        );
        Ok(value)
    }

    /// Enters the editing state with the current body as draft.
    pub fn begin_edit(&self, message: Message) -> EditSession {
        let draft = message.body.clone();
        EditSession { message, draft }
    }

    /// Leaves the editing state, saving or deleting depending on the draft.
    pub fn accept_edit(&self, session: EditSession) -> RepoResult<EditOutcome> {
        let EditSession { mut message, draft } = session;
        self.edit_body(&mut message, draft)
    }

    /// Stores `new_body`, or deletes the record when it is blank.
    pub fn edit_body(
        &self,
        message: &mut Message,
        new_body: impl Into<String>,
    ) -> RepoResult<EditOutcome> {
        let new_body = new_body.into();
        if is_blank(&new_body) {
            self.destroy(message)?;
            info!(
                "event=message_edit module=service status=ok id={} outcome=deleted",
                message.id
            );
            return Ok(EditOutcome::Deleted(message.id));
        }

        message.body = new_body;
        self.repo.save_message(message)?;
        info!(
            "event=message_edit module=service status=ok id={} outcome=saved body_len={}",
            message.id,
            message.body.len()
        );
        Ok(EditOutcome::Saved(message.clone()))
    }

    /// Marks `message` for deletion and persists the deletion.
    pub fn delete_message(&self, message: &mut Message) -> RepoResult<()> {
        self.destroy(message)?;
        info!(
            "event=message_delete module=service status=ok id={}",
            message.id
        );
        Ok(())
    }

    /// Sends the body through the notifier, then marks the message sent.
    ///
    /// The notifier is called exactly once. Its failure is logged and the
    /// message is still marked sent.
    pub fn notify_sent(&self, message: &mut Message) -> RepoResult<()> {
        if let Err(err) = self.notifier.notify(&message.body) {
            warn!(
                "event=message_notify module=service status=error id={} error={}",
                message.id, err
            );
        }

        message.is_sent = true;
        self.repo.save_message(message)?;
        info!(
            "event=message_notify module=service status=ok id={}",
            message.id
        );
        Ok(())
    }

    /// Marks the message unsent without notifying anyone.
    pub fn reset_sent(&self, message: &mut Message) -> RepoResult<()> {
        message.is_sent = false;
        self.repo.save_message(message)?;
        info!(
            "event=message_reset module=service status=ok id={}",
            message.id
        );
        Ok(())
    }

    /// Computes all derived values from fresh repository reads.
    pub fn summary(&self) -> RepoResult<MessageSummary> {
        let total = self.total_count()?;
        let remaining = self.remaining_count()?;
        let sent = self.sent_count()?;
        Ok(MessageSummary {
            total,
            remaining,
            sent,
            has_sent: sent > 0,
            all_done: total > 0 && sent == total,
            label: message_label(remaining),
        })
    }

    fn destroy(&self, message: &mut Message) -> RepoResult<()> {
        message.mark_deleted();
        self.repo.delete_message(message)
    }
}
