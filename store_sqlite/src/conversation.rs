use crate::{map_err, SqliteStore};
use curator_store::{ConversationStore, StoreError};
use curator_types::{ConversationState, UserId};
use rusqlite::{params, OptionalExtension};

impl ConversationStore for SqliteStore {
    fn conversation(&self, user: UserId) -> Result<ConversationState, StoreError> {
        let raw: Option<String> = self.with_conn(|conn| {
            conn.query_row(
                "SELECT state FROM conversations WHERE user_id = ?1",
                params![user.get()],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_err)
        })?;
        match raw {
            Some(raw) => raw
                .parse()
                .map_err(|e| StoreError::Corruption(format!("conversation of {user}: {e}"))),
            None => Ok(ConversationState::Idle),
        }
    }

    fn put_conversation(&self, user: UserId, state: ConversationState) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (user_id, state) VALUES (?1, ?2)
                 ON CONFLICT (user_id) DO UPDATE SET state = excluded.state",
                params![user.get(), state.as_str()],
            )
            .map_err(map_err)?;
            Ok(())
        })
    }
}
