use crate::{from_sql_time, map_err, to_sql_time, SqliteStore};
use curator_store::{NewVote, RatingChange, StoreError, VoteStore};
use curator_types::{ContentRef, Timestamp, UserId, Vote, VoteId, VoteState};
use rusqlite::{params, OptionalExtension, Row};

const VOTE_COLUMNS: &str = "id, author, permalink, submitter, submitted_at, percent, state";

struct VoteRow {
    id: i64,
    author: String,
    permalink: String,
    submitter: i64,
    submitted_at: i64,
    percent: i64,
    state: String,
}

impl VoteRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            author: row.get(1)?,
            permalink: row.get(2)?,
            submitter: row.get(3)?,
            submitted_at: row.get(4)?,
            percent: row.get(5)?,
            state: row.get(6)?,
        })
    }

    fn into_vote(self) -> Result<Vote, StoreError> {
        let state: VoteState = self
            .state
            .parse()
            .map_err(|e| StoreError::Corruption(format!("vote {}: {e}", self.id)))?;
        let percent = u8::try_from(self.percent)
            .map_err(|_| StoreError::Corruption(format!("vote {}: percent {}", self.id, self.percent)))?;
        Ok(Vote {
            id: VoteId::new(self.id),
            content: ContentRef {
                author: self.author,
                permalink: self.permalink,
            },
            submitter: UserId::new(self.submitter),
            submitted_at: Timestamp::new(from_sql_time(self.submitted_at)),
            percent,
            state,
        })
    }
}

impl SqliteStore {
    fn query_votes(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> Result<Vec<Vote>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql).map_err(map_err)?;
            let rows = stmt
                .query_map(args, VoteRow::read)
                .map_err(map_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_err)?;
            rows.into_iter().map(VoteRow::into_vote).collect()
        })
    }
}

impl VoteStore for SqliteStore {
    fn insert_vote(&self, vote: &NewVote) -> Result<Vote, StoreError> {
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO votes (author, permalink, submitter, submitted_at, percent, state)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'open')",
                params![
                    vote.content.author,
                    vote.content.permalink,
                    vote.submitter.get(),
                    to_sql_time(vote.submitted_at.as_secs()),
                    vote.percent,
                ],
            )
            .map_err(map_err)?;
            Ok(conn.last_insert_rowid())
        })?;

        Ok(Vote {
            id: VoteId::new(id),
            content: vote.content.clone(),
            submitter: vote.submitter,
            submitted_at: vote.submitted_at,
            percent: vote.percent,
            state: VoteState::Open,
        })
    }

    fn get_vote(&self, id: VoteId) -> Result<Vote, StoreError> {
        let sql = format!("SELECT {VOTE_COLUMNS} FROM votes WHERE id = ?1");
        self.query_votes(&sql, params![id.get()])?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("vote {id}")))
    }

    fn content_exists(&self, content: &ContentRef) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT 1 FROM votes WHERE author = ?1 AND permalink = ?2",
                params![content.author, content.permalink],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(map_err)
        })
    }

    fn last_vote_by(&self, submitter: UserId) -> Result<Option<Vote>, StoreError> {
        let sql = format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE submitter = ?1
             ORDER BY submitted_at DESC, id DESC LIMIT 1"
        );
        Ok(self.query_votes(&sql, params![submitter.get()])?.into_iter().next())
    }

    fn recent_resolved_by(&self, submitter: UserId, limit: usize) -> Result<Vec<Vote>, StoreError> {
        let sql = format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE submitter = ?1 AND state != 'open'
             ORDER BY submitted_at DESC, id DESC LIMIT ?2"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query_votes(&sql, params![submitter.get(), limit])
    }

    fn open_vote_count(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM votes WHERE state = 'open'", [], |row| {
                    row.get(0)
                })
                .map_err(map_err)?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
    }

    fn open_votes(&self) -> Result<Vec<Vote>, StoreError> {
        let sql = format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE state = 'open' ORDER BY submitted_at, id"
        );
        self.query_votes(&sql, [])
    }

    fn oldest_open_vote(&self) -> Result<Option<Vote>, StoreError> {
        let sql = format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE state = 'open'
             ORDER BY submitted_at, id LIMIT 1"
        );
        Ok(self.query_votes(&sql, [])?.into_iter().next())
    }

    fn votes_in_state_since(
        &self,
        state: VoteState,
        since: Timestamp,
    ) -> Result<Vec<Vote>, StoreError> {
        let sql = format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE state = ?1 AND submitted_at >= ?2
             ORDER BY submitted_at, id"
        );
        self.query_votes(&sql, params![state.as_str(), to_sql_time(since.as_secs())])
    }

    fn resolve(
        &self,
        id: VoteId,
        to: VoteState,
        ratings: &[RatingChange],
    ) -> Result<bool, StoreError> {
        if !to.is_terminal() {
            return Err(StoreError::Backend(format!(
                "vote {id} cannot be resolved to {}",
                to.as_str()
            )));
        }

        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(map_err)?;
            let changed = tx
                .execute(
                    "UPDATE votes SET state = ?1 WHERE id = ?2 AND state = 'open'",
                    params![to.as_str(), id.get()],
                )
                .map_err(map_err)?;
            if changed == 0 {
                return Ok(false);
            }
            for change in ratings {
                tx.execute(
                    "UPDATE credentials SET rating = rating + ?1 WHERE user_id = ?2",
                    params![change.delta, change.user.get()],
                )
                .map_err(map_err)?;
            }
            tx.commit().map_err(map_err)?;
            Ok(true)
        })
    }
}
