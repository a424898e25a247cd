use crate::{map_err, SqliteStore};
use curator_store::{ReferralStore, StoreError};
use curator_types::{Referral, UserId};
use rusqlite::{params, OptionalExtension};

impl ReferralStore for SqliteStore {
    fn put_referral(&self, referral: &Referral) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO referrals (referred, referrer_account, referred_account, completed)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    referral.referred.get(),
                    referral.referrer_account,
                    referral.referred_account,
                    referral.completed,
                ],
            )
            .map_err(map_err)?;
            Ok(())
        })
    }

    fn get_referral(&self, referred: UserId) -> Result<Option<Referral>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT referred, referrer_account, referred_account, completed
                 FROM referrals WHERE referred = ?1",
                params![referred.get()],
                |row| {
                    Ok(Referral {
                        referred: UserId::new(row.get(0)?),
                        referrer_account: row.get(1)?,
                        referred_account: row.get(2)?,
                        completed: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(map_err)
        })
    }

    fn complete_referral(
        &self,
        referred: UserId,
        referred_account: &str,
    ) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE referrals SET completed = 1, referred_account = ?1
                     WHERE referred = ?2 AND completed = 0",
                    params![referred_account, referred.get()],
                )
                .map_err(map_err)?;
            Ok(changed == 1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_exactly_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .put_referral(&Referral::pending(UserId::new(2), "alice"))
            .unwrap();

        assert!(store.complete_referral(UserId::new(2), "bob").unwrap());
        assert!(!store.complete_referral(UserId::new(2), "carol").unwrap());

        let referral = store.get_referral(UserId::new(2)).unwrap().unwrap();
        assert!(referral.completed);
        assert_eq!(referral.referred_account.as_deref(), Some("bob"));
    }

    #[test]
    fn one_referral_per_user() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put_referral(&Referral::pending(UserId::new(2), "alice")).unwrap();
        let err = store
            .put_referral(&Referral::pending(UserId::new(2), "carol"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn unknown_referral_does_not_complete() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(!store.complete_referral(UserId::new(9), "bob").unwrap());
    }
}
