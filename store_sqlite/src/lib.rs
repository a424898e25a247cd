//! SQLite implementation of the curation store traits.
//!
//! A single connection behind a mutex serialises every call, so the
//! check-and-set operations only need a transaction to stay atomic against
//! crashes.
//!
//! ## Tables
//!
//! - `votes` - one row per submitted content, unique on (author, permalink)
//! - `responses` - curator verdicts, primary key (vote_id, voter)
//! - `credentials` - delegated accounts, unique on account
//! - `referrals` - pending and completed referrals
//! - `conversations` - per-user private chat state
//! - `events` - reward and report cadence log

mod conversation;
mod credential;
mod event;
mod referral;
mod response;
mod schema;
mod vote;

use curator_store::StoreError;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

/// Durable store backed by one SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        tracing::info!(path = %path.display(), "opening SQLite store");

        let conn = Connection::open(path)
            .map_err(|e| StoreError::Backend(format!("failed to open SQLite: {e}")))?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )
        .map_err(|e| StoreError::Backend(format!("failed to set PRAGMA: {e}")))?;

        Self::with_schema(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        tracing::debug!("opening in-memory SQLite store");

        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Backend(format!("failed to open in-memory SQLite: {e}")))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| StoreError::Backend(format!("failed to set PRAGMA: {e}")))?;

        Self::with_schema(conn)
    }

    fn with_schema(conn: Connection) -> Result<Self, StoreError> {
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        f(&mut conn)
    }
}

/// Map a rusqlite error, reporting unique-constraint violations as duplicates.
pub(crate) fn map_err(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            StoreError::NotFound(e.to_string())
        }
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Duplicate(msg.clone().unwrap_or_else(|| e.to_string()))
        }
        _ => StoreError::Backend(e.to_string()),
    }
}

pub(crate) fn to_sql_time(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

pub(crate) fn from_sql_time(secs: i64) -> u64 {
    u64::try_from(secs).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_store::{CredentialStore, NewVote, VoteStore};
    use curator_types::{ChatId, ContentRef, Credential, Timestamp, UserId};

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curator.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .put_credential(&Credential::activated(UserId::new(1), ChatId::new(1), "alice"))
                .unwrap();
            store
                .insert_vote(&NewVote {
                    content: ContentRef::new("alice", "post1").unwrap(),
                    submitter: UserId::new(1),
                    submitted_at: Timestamp::new(100),
                    percent: 100,
                })
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert!(store.credential_by_account("alice").unwrap().is_some());
        assert_eq!(store.open_vote_count().unwrap(), 1);
    }
}
