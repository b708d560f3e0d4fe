/// Preference persistence
use super::Preference;
use crate::error::AppResult;
use chrono::Utc;
use sqlx::{Row, SqliteExecutor, SqlitePool};

/// Preference store
#[derive(Clone)]
pub struct PreferenceStore {
    db: SqlitePool,
}

impl PreferenceStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert the default preference for a freshly registered account.
    ///
    /// Runs on the caller's executor so registration can keep it in the
    /// same transaction as the account insert.
    pub async fn create_default<'e, E>(executor: E, account_id: i64) -> AppResult<Preference>
    where
        E: SqliteExecutor<'e>,
    {
        let preference = Preference::default();

        sqlx::query(
            r#"
            INSERT INTO preference (account_id, age, gender, size, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(account_id)
        .bind(preference.age_codes())
        .bind(preference.gender_codes())
        .bind(preference.size_codes())
        .bind(Utc::now())
        .execute(executor)
        .await?;

        Ok(preference)
    }

    /// Load the preference of an account.
    ///
    /// Accounts without a stored row get the default preference.
    pub async fn get(&self, account_id: i64) -> AppResult<Preference> {
        Self::fetch(&self.db, account_id).await
    }

    pub(crate) async fn fetch<'e, E>(executor: E, account_id: i64) -> AppResult<Preference>
    where
        E: SqliteExecutor<'e>,
    {
        let row = sqlx::query("SELECT age, gender, size FROM preference WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(executor)
            .await?;

        match row {
            Some(row) => {
                let age: String = row.get("age");
                let gender: String = row.get("gender");
                let size: String = row.get("size");
                Preference::from_stored(&age, &gender, &size)
            }
            None => {
                tracing::debug!(account_id, "No stored preference, using defaults");
                Ok(Preference::default())
            }
        }
    }

    /// Replace all three preference fields at once.
    ///
    /// Codes are validated before anything is written.
    pub async fn update<A, G, S>(
        &self,
        account_id: i64,
        age: &[A],
        gender: &[G],
        size: &[S],
    ) -> AppResult<Preference>
    where
        A: AsRef<str>,
        G: AsRef<str>,
        S: AsRef<str>,
    {
        let preference = Preference::from_codes(age, gender, size)?;

        sqlx::query(
            r#"
            INSERT INTO preference (account_id, age, gender, size, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(account_id) DO UPDATE SET
                age = excluded.age,
                gender = excluded.gender,
                size = excluded.size,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(account_id)
        .bind(preference.age_codes())
        .bind(preference.gender_codes())
        .bind(preference.size_codes())
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        tracing::info!(
            account_id,
            age = %preference.age_codes(),
            gender = %preference.gender_codes(),
            size = %preference.size_codes(),
            "Preference updated"
        );

        Ok(preference)
    }
}
