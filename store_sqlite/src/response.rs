use crate::{from_sql_time, map_err, to_sql_time, SqliteStore};
use curator_store::{ResponseStore, StoreError};
use curator_types::{Response, Timestamp, UserId, Verdict, VoteId};
use rusqlite::{params, OptionalExtension, Row};

fn read_response(row: &Row<'_>) -> rusqlite::Result<Response> {
    let positive: bool = row.get(2)?;
    let at: i64 = row.get(3)?;
    Ok(Response {
        vote_id: VoteId::new(row.get(0)?),
        voter: UserId::new(row.get(1)?),
        verdict: Verdict::from_positive(positive),
        responded_at: Timestamp::new(from_sql_time(at)),
    })
}

impl ResponseStore for SqliteStore {
    fn insert_response(&self, response: &Response) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let inserted = conn
                .execute(
                    "INSERT OR IGNORE INTO responses (vote_id, voter, positive, responded_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        response.vote_id.get(),
                        response.voter.get(),
                        response.verdict.is_positive(),
                        to_sql_time(response.responded_at.as_secs()),
                    ],
                )
                .map_err(map_err)?;
            Ok(inserted == 1)
        })
    }

    fn get_response(&self, vote: VoteId, voter: UserId) -> Result<Option<Response>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT vote_id, voter, positive, responded_at FROM responses
                 WHERE vote_id = ?1 AND voter = ?2",
                params![vote.get(), voter.get()],
                read_response,
            )
            .optional()
            .map_err(map_err)
        })
    }

    fn responses_for(&self, vote: VoteId) -> Result<Vec<Response>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT vote_id, voter, positive, responded_at FROM responses
                     WHERE vote_id = ?1 ORDER BY responded_at, voter",
                )
                .map_err(map_err)?;
            let rows = stmt
                .query_map(params![vote.get()], read_response)
                .map_err(map_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_err)?;
            Ok(rows)
        })
    }

    fn response_counts_since(&self, since: Timestamp) -> Result<Vec<(UserId, u64)>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT voter, COUNT(*) FROM responses WHERE responded_at >= ?1
                     GROUP BY voter ORDER BY voter",
                )
                .map_err(map_err)?;
            let rows = stmt
                .query_map(params![to_sql_time(since.as_secs())], |row| {
                    let voter: i64 = row.get(0)?;
                    let count: i64 = row.get(1)?;
                    Ok((UserId::new(voter), u64::try_from(count).unwrap_or(0)))
                })
                .map_err(map_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_err)?;
            Ok(rows)
        })
    }
}
