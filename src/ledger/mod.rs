/// Decision ledger
///
/// Keeps the latest liked/disliked decision per (account, dog). A missing
/// row means the dog is undecided for that account.
use crate::{
    catalog::DogId,
    error::{AppError, AppResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteExecutor, SqlitePool};
use std::{collections::HashSet, str::FromStr};

/// Persisted decision status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionStatus {
    #[serde(rename = "l")]
    Liked,
    #[serde(rename = "d")]
    Disliked,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Liked => "l",
            DecisionStatus::Disliked => "d",
        }
    }
}

impl FromStr for DecisionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l" => Ok(DecisionStatus::Liked),
            "d" => Ok(DecisionStatus::Disliked),
            _ => Err(AppError::Internal(format!("Invalid decision status: {}", s))),
        }
    }
}

/// Decision record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub account_id: i64,
    pub dog_id: DogId,
    pub status: DecisionStatus,
    pub decided_at: DateTime<Utc>,
}

/// Decision ledger
#[derive(Clone)]
pub struct DecisionLedger {
    db: SqlitePool,
}

impl DecisionLedger {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Record a decision, overwriting any earlier one for the pair.
    ///
    /// A single upsert statement, so concurrent writers resolve to the last write.
    pub async fn record_decision(
        &self,
        account_id: i64,
        dog_id: DogId,
        status: DecisionStatus,
    ) -> AppResult<Decision> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO decision (account_id, dog_id, status, decided_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(account_id, dog_id) DO UPDATE SET
                status = excluded.status,
                decided_at = excluded.decided_at
            "#,
        )
        .bind(account_id)
        .bind(dog_id)
        .bind(status.as_str())
        .bind(now)
        .execute(&self.db)
        .await?;

        tracing::info!(account_id, dog_id, status = status.as_str(), "Decision recorded");

        Ok(Decision {
            account_id,
            dog_id,
            status,
            decided_at: now,
        })
    }

    /// Return a dog to the undecided state. Clearing an undecided dog is a no-op.
    pub async fn clear_decision(&self, account_id: i64, dog_id: DogId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM decision WHERE account_id = ? AND dog_id = ?")
            .bind(account_id)
            .bind(dog_id)
            .execute(&self.db)
            .await?;

        tracing::info!(
            account_id,
            dog_id,
            cleared = result.rows_affected(),
            "Decision cleared"
        );
        Ok(())
    }

    /// Current status of a pair, `None` when undecided
    #[cfg(test)]
    pub async fn status_of(&self, account_id: i64, dog_id: DogId) -> AppResult<Option<DecisionStatus>> {
        use sqlx::Row;

        let row = sqlx::query("SELECT status FROM decision WHERE account_id = ? AND dog_id = ?")
            .bind(account_id)
            .bind(dog_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(|row| row.get::<String, _>("status").parse())
            .transpose()
    }

    /// Every dog the account has decided on, either way.
    ///
    /// Takes an executor so the candidate selector can read inside its
    /// own transaction.
    pub async fn decided_dog_ids<'e, E>(executor: E, account_id: i64) -> AppResult<HashSet<DogId>>
    where
        E: SqliteExecutor<'e>,
    {
        let ids: Vec<DogId> = sqlx::query_scalar("SELECT dog_id FROM decision WHERE account_id = ?")
            .bind(account_id)
            .fetch_all(executor)
            .await?;

        Ok(ids.into_iter().collect())
    }

    /// Dogs with exactly this status, ascending by id
    pub async fn dog_ids_with_status<'e, E>(
        executor: E,
        account_id: i64,
        status: DecisionStatus,
    ) -> AppResult<Vec<DogId>>
    where
        E: SqliteExecutor<'e>,
    {
        let ids = sqlx::query_scalar(
            r#"
            SELECT dog_id FROM decision
            WHERE account_id = ? AND status = ?
            ORDER BY dog_id
            "#,
        )
        .bind(account_id)
        .bind(status.as_str())
        .fetch_all(executor)
        .await?;

        Ok(ids)
    }
}
