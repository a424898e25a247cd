use crate::{map_err, SqliteStore};
use curator_store::{CredentialStore, StoreError};
use curator_types::{ChatId, Credential, PowerPercent, UserId};
use rusqlite::{params, OptionalExtension, Row};

const CREDENTIAL_COLUMNS: &str = "user_id, chat_id, account, power, active, curator, rating";

fn read_row(row: &Row<'_>) -> rusqlite::Result<(Credential, i64)> {
    let power: i64 = row.get(3)?;
    Ok((
        Credential {
            user_id: UserId::new(row.get(0)?),
            chat_id: ChatId::new(row.get(1)?),
            account: row.get(2)?,
            power: PowerPercent::FULL,
            active: row.get(4)?,
            curator: row.get(5)?,
            rating: row.get(6)?,
        },
        power,
    ))
}

fn with_power((mut credential, power): (Credential, i64)) -> Result<Credential, StoreError> {
    credential.power = PowerPercent::new(power).map_err(|e| {
        StoreError::Corruption(format!("credential {}: {e}", credential.user_id))
    })?;
    Ok(credential)
}

impl SqliteStore {
    fn query_credentials(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> Result<Vec<Credential>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql).map_err(map_err)?;
            let rows = stmt
                .query_map(args, read_row)
                .map_err(map_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_err)?;
            rows.into_iter().map(with_power).collect()
        })
    }
}

impl CredentialStore for SqliteStore {
    fn get_credential(&self, user: UserId) -> Result<Option<Credential>, StoreError> {
        let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE user_id = ?1");
        Ok(self.query_credentials(&sql, params![user.get()])?.into_iter().next())
    }

    fn credential_by_account(&self, account: &str) -> Result<Option<Credential>, StoreError> {
        let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE account = ?1");
        Ok(self.query_credentials(&sql, params![account])?.into_iter().next())
    }

    fn put_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(map_err)?;
            let holder: Option<i64> = tx
                .query_row(
                    "SELECT user_id FROM credentials WHERE account = ?1",
                    params![credential.account],
                    |row| row.get(0),
                )
                .optional()
                .map_err(map_err)?;
            if let Some(holder) = holder {
                if holder != credential.user_id.get() {
                    return Err(StoreError::Duplicate(format!(
                        "account {} is held by user {holder}",
                        credential.account
                    )));
                }
            }
            tx.execute(
                "INSERT INTO credentials (user_id, chat_id, account, power, active, curator, rating)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (user_id) DO UPDATE SET
                    chat_id = excluded.chat_id,
                    account = excluded.account,
                    power = excluded.power,
                    active = excluded.active,
                    curator = excluded.curator",
                params![
                    credential.user_id.get(),
                    credential.chat_id.get(),
                    credential.account,
                    credential.power.get(),
                    credential.active,
                    credential.curator,
                    credential.rating,
                ],
            )
            .map_err(map_err)?;
            tx.commit().map_err(map_err)
        })
    }

    fn set_power(&self, user: UserId, power: PowerPercent) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE credentials SET power = ?2 WHERE user_id = ?1",
                    params![user.get(), power.get()],
                )
                .map_err(map_err)?;
            Ok(changed > 0)
        })
    }

    fn set_active(&self, user: UserId, active: bool) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE credentials SET active = ?2 WHERE user_id = ?1",
                    params![user.get(), active],
                )
                .map_err(map_err)?;
            Ok(changed > 0)
        })
    }

    fn set_curator(
        &self,
        user: UserId,
        curator: bool,
        chat: Option<ChatId>,
    ) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE credentials SET curator = ?2, chat_id = COALESCE(?3, chat_id)
                     WHERE user_id = ?1",
                    params![user.get(), curator, chat.map(|c| c.get())],
                )
                .map_err(map_err)?;
            Ok(changed > 0)
        })
    }

    fn active_credentials(&self) -> Result<Vec<Credential>, StoreError> {
        let sql = format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE active = 1 ORDER BY user_id"
        );
        self.query_credentials(&sql, [])
    }

    fn active_curators(&self) -> Result<Vec<Credential>, StoreError> {
        let sql = format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE active = 1 AND curator = 1
             ORDER BY user_id"
        );
        self.query_credentials(&sql, [])
    }
}
