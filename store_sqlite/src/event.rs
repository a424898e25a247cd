use crate::{from_sql_time, map_err, to_sql_time, SqliteStore};
use curator_store::{EventStore, StoreError};
use curator_types::{EventKind, Timestamp};
use rusqlite::params;

impl EventStore for SqliteStore {
    fn last_event(&self, kind: EventKind) -> Result<Option<Timestamp>, StoreError> {
        self.with_conn(|conn| {
            let at: Option<i64> = conn
                .query_row(
                    "SELECT MAX(at) FROM events WHERE kind = ?1",
                    params![kind.as_str()],
                    |row| row.get(0),
                )
                .map_err(map_err)?;
            Ok(at.map(|secs| Timestamp::new(from_sql_time(secs))))
        })
    }

    fn record_event(&self, kind: EventKind, at: Timestamp) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (kind, at) VALUES (?1, ?2)",
                params![kind.as_str(), to_sql_time(at.as_secs())],
            )
            .map_err(map_err)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_latest_event_per_kind() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.last_event(EventKind::Reward).unwrap(), None);

        store.record_event(EventKind::Reward, Timestamp::new(100)).unwrap();
        store.record_event(EventKind::Reward, Timestamp::new(300)).unwrap();
        store.record_event(EventKind::Report, Timestamp::new(200)).unwrap();

        assert_eq!(
            store.last_event(EventKind::Reward).unwrap(),
            Some(Timestamp::new(300))
        );
        assert_eq!(
            store.last_event(EventKind::Report).unwrap(),
            Some(Timestamp::new(200))
        );
    }
}
