//! In-memory fixture backend.
//!
//! Non-persistent; used for demos and tests. Ids come from a counter that
//! never hands out the same value twice, even after deletions.

use crate::model::message::{fixture_messages, Message, MessageFilter, MessageId, NewMessage};
use crate::repo::message_repo::{MessageRepository, RepoError, RepoResult};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug)]
struct FixtureState {
    next_id: i64,
    rows: BTreeMap<MessageId, Message>,
}

/// Message store held entirely in memory.
#[derive(Debug)]
pub struct FixtureMessageRepository {
    state: RefCell<FixtureState>,
}

impl Default for FixtureMessageRepository {
    fn default() -> Self {
        Self::empty()
    }
}

impl FixtureMessageRepository {
    pub fn empty() -> Self {
        Self {
            state: RefCell::new(FixtureState {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }

    /// Store preloaded with [`fixture_messages`] under ids 1, 2, 3.
    pub fn with_fixtures() -> Self {
        Self::seeded(&fixture_messages())
    }

    /// Store preloaded with `drafts`, assigned ids in order starting at 1.
    ///
    /// Blank drafts are skipped.
    pub fn seeded(drafts: &[NewMessage]) -> Self {
        let repo = Self::empty();
        for draft in drafts {
            // Only validation can fail here.
            let _ = repo.create_message(draft);
        }
        repo
    }
}

impl MessageRepository for FixtureMessageRepository {
    fn create_message(&self, draft: &NewMessage) -> RepoResult<Message> {
        draft.validate()?;

        let mut state = self.state.borrow_mut();
        let id = MessageId(state.next_id);
        state.next_id += 1;
        let message = Message::new(id, draft.body.clone(), draft.is_sent);
        state.rows.insert(id, message.clone());
        Ok(message)
    }

    fn save_message(&self, message: &Message) -> RepoResult<()> {
        message.validate()?;

        let mut state = self.state.borrow_mut();
        let stored = state
            .rows
            .get_mut(&message.id)
            .ok_or(RepoError::NotFound(message.id))?;
        stored.body = message.body.clone();
        stored.is_sent = message.is_sent;
        Ok(())
    }

    fn get_message(&self, id: MessageId) -> RepoResult<Option<Message>> {
        Ok(self.state.borrow().rows.get(&id).cloned())
    }

    fn list_messages(&self, filter: MessageFilter) -> RepoResult<Vec<Message>> {
        Ok(self
            .state
            .borrow()
            .rows
            .values()
            .filter(|message| filter.matches(message))
            .cloned()
            .collect())
    }

    fn count_messages(&self, filter: MessageFilter) -> RepoResult<u64> {
        let count = self
            .state
            .borrow()
            .rows
            .values()
            .filter(|message| filter.matches(message))
            .count();
        Ok(count as u64)
    }

    fn delete_message(&self, message: &Message) -> RepoResult<()> {
        if !message.is_marked_for_deletion() {
            return Err(RepoError::NotMarkedForDeletion(message.id));
        }

        self.state
            .borrow_mut()
            .rows
            .remove(&message.id)
            .map(|_| ())
            .ok_or(RepoError::NotFound(message.id))
    }
}
