//! Database schema definitions.

use crate::map_err;
use curator_store::StoreError;
use rusqlite::Connection;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )
    .map_err(map_err)?;

    let current: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    if current == 0 {
        tracing::info!(version = SCHEMA_VERSION, "creating database schema");
        conn.execute_batch(TABLES).map_err(map_err)?;
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [SCHEMA_VERSION])
            .map_err(map_err)?;
    } else if current > SCHEMA_VERSION {
        return Err(StoreError::Corruption(format!(
            "schema version {current} is newer than supported {SCHEMA_VERSION}"
        )));
    } else {
        tracing::debug!(version = current, "database schema is up to date");
    }
    Ok(())
}

const TABLES: &str = r#"
CREATE TABLE votes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    author TEXT NOT NULL,
    permalink TEXT NOT NULL,
    submitter INTEGER NOT NULL,
    submitted_at INTEGER NOT NULL,
    percent INTEGER NOT NULL,
    state TEXT NOT NULL DEFAULT 'open',
    UNIQUE (author, permalink)
);
CREATE INDEX idx_votes_state ON votes (state, submitted_at);
CREATE INDEX idx_votes_submitter ON votes (submitter, submitted_at);

CREATE TABLE responses (
    vote_id INTEGER NOT NULL REFERENCES votes (id),
    voter INTEGER NOT NULL,
    positive INTEGER NOT NULL,
    responded_at INTEGER NOT NULL,
    PRIMARY KEY (vote_id, voter)
);
CREATE INDEX idx_responses_time ON responses (responded_at);

CREATE TABLE credentials (
    user_id INTEGER PRIMARY KEY,
    chat_id INTEGER NOT NULL,
    account TEXT NOT NULL UNIQUE,
    power INTEGER NOT NULL,
    active INTEGER NOT NULL,
    curator INTEGER NOT NULL,
    rating INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE referrals (
    referred INTEGER PRIMARY KEY,
    referrer_account TEXT NOT NULL,
    referred_account TEXT,
    completed INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE conversations (
    user_id INTEGER PRIMARY KEY,
    state TEXT NOT NULL
);

CREATE TABLE events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    at INTEGER NOT NULL
);
CREATE INDEX idx_events_kind ON events (kind, at);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        let version: i32 = conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
