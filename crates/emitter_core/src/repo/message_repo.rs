//! Message repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the create/find/filter/delete/save surface the collection
//!   aggregator works against.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate the message before touching storage.
//! - `delete_message` only accepts records marked for deletion.
//! - Listings are ordered by ascending id (insertion order).

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::message::{
    Message, MessageFilter, MessageId, MessageValidationError, NewMessage,
};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MESSAGE_SELECT_SQL: &str = "SELECT id, body, is_sent FROM messages";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for message persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(MessageValidationError),
    Db(DbError),
    NotFound(MessageId),
    /// Deletion was persisted without the preceding mark.
    NotMarkedForDeletion(MessageId),
    InvalidData(String),
    /// Connection has not been through `db::open_db*` migrations.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "message not found: {id}"),
            Self::NotMarkedForDeletion(id) => {
                write!(f, "message {id} must be marked for deletion before it is deleted")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted message data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is older than required {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MessageValidationError> for RepoError {
    fn from(value: MessageValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence backend for message records.
pub trait MessageRepository {
    /// Persists a new record and returns it with its assigned id.
    fn create_message(&self, draft: &NewMessage) -> RepoResult<Message>;
    /// Writes body and sent flag of an existing record.
    fn save_message(&self, message: &Message) -> RepoResult<()>;
    fn get_message(&self, id: MessageId) -> RepoResult<Option<Message>>;
    fn list_messages(&self, filter: MessageFilter) -> RepoResult<Vec<Message>>;
    fn count_messages(&self, filter: MessageFilter) -> RepoResult<u64>;
    /// Persists the deletion of a record previously marked with
    /// [`Message::mark_deleted`].
    fn delete_message(&self, message: &Message) -> RepoResult<()>;
}

impl<R: MessageRepository + ?Sized> MessageRepository for &R {
    fn create_message(&self, draft: &NewMessage) -> RepoResult<Message> {
        (**self).create_message(draft)
    }

    fn save_message(&self, message: &Message) -> RepoResult<()> {
        (**self).save_message(message)
    }

    fn get_message(&self, id: MessageId) -> RepoResult<Option<Message>> {
        (**self).get_message(id)
    }

    fn list_messages(&self, filter: MessageFilter) -> RepoResult<Vec<Message>> {
        (**self).list_messages(filter)
    }

    fn count_messages(&self, filter: MessageFilter) -> RepoResult<u64> {
        (**self).count_messages(filter)
    }

    fn delete_message(&self, message: &Message) -> RepoResult<()> {
        (**self).delete_message(message)
    }
}

/// SQLite-backed durable message store.
pub struct SqliteMessageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMessageRepository<'conn> {
    /// Wraps a connection returned by [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` when the `messages` table is absent.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version < expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_table: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'messages'
            );",
            [],
            |row| row.get(0),
        )?;
        if has_table == 0 {
            return Err(RepoError::MissingRequiredTable("messages"));
        }

        Ok(Self { conn })
    }
}

impl MessageRepository for SqliteMessageRepository<'_> {
    fn create_message(&self, draft: &NewMessage) -> RepoResult<Message> {
        draft.validate()?;

        self.conn.execute(
            "INSERT INTO messages (body, is_sent) VALUES (?1, ?2);",
            params![draft.body.as_str(), bool_to_int(draft.is_sent)],
        )?;

        let id = MessageId(self.conn.last_insert_rowid());
        Ok(Message::new(id, draft.body.clone(), draft.is_sent))
    }

    fn save_message(&self, message: &Message) -> RepoResult<()> {
        message.validate()?;

        let changed = self.conn.execute(
            "UPDATE messages
             SET
                body = ?1,
                is_sent = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![
                message.body.as_str(),
                bool_to_int(message.is_sent),
                message.id.0
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(message.id));
        }
        Ok(())
    }

    fn get_message(&self, id: MessageId) -> RepoResult<Option<Message>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MESSAGE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.0])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_message_row(row)?));
        }
        Ok(None)
    }

    fn list_messages(&self, filter: MessageFilter) -> RepoResult<Vec<Message>> {
        let sql = format!(
            "{MESSAGE_SELECT_SQL}{} ORDER BY id ASC;",
            filter_clause(filter)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next()? {
            messages.push(parse_message_row(row)?);
        }
        Ok(messages)
    }

    fn count_messages(&self, filter: MessageFilter) -> RepoResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM messages{};", filter_clause(filter));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn delete_message(&self, message: &Message) -> RepoResult<()> {
        if !message.is_marked_for_deletion() {
            return Err(RepoError::NotMarkedForDeletion(message.id));
        }

        let changed = self
            .conn
            .execute("DELETE FROM messages WHERE id = ?1;", [message.id.0])?;
        if changed == 0 {
            return Err(RepoError::NotFound(message.id));
        }
        Ok(())
    }
}

fn filter_clause(filter: MessageFilter) -> &'static str {
    match filter {
        MessageFilter::All => "",
        MessageFilter::Unsent => " WHERE is_sent = 0",
        MessageFilter::Sent => " WHERE is_sent = 1",
    }
}

fn parse_message_row(row: &Row<'_>) -> RepoResult<Message> {
    let id: i64 = row.get("id")?;
    let is_sent = match row.get::<_, i64>("is_sent")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_sent value `{other}` in messages.is_sent"
            )));
        }
    };

    let message = Message::new(MessageId(id), row.get::<_, String>("body")?, is_sent);
    message.validate()?;
    Ok(message)
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
