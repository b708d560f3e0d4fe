/// Candidate selection per (account, bucket)
use super::Bucket;
use crate::{
    catalog::{DogCatalog, DogId},
    error::AppResult,
    ledger::DecisionLedger,
    preference::{resolve, PreferenceStore},
};
use sqlx::SqlitePool;

/// Computes the ascending candidate sequence for a bucket.
///
/// Nothing is cached: preferences and decisions may change between calls.
#[derive(Clone)]
pub struct CandidateSelector {
    db: SqlitePool,
}

impl CandidateSelector {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Eligible dog ids for the account in the bucket, ascending
    pub async fn candidates(&self, account_id: i64, bucket: Bucket) -> AppResult<Vec<DogId>> {
        // One read transaction so preferences, decisions and the catalog
        // come from the same snapshot
        let mut tx = self.db.begin().await?;

        let ids = match bucket.status() {
            Some(status) => {
                DecisionLedger::dog_ids_with_status(&mut *tx, account_id, status).await?
            }
            None => {
                let preference = PreferenceStore::fetch(&mut *tx, account_id).await?;
                let criteria = resolve(&preference)?;
                let decided = DecisionLedger::decided_dog_ids(&mut *tx, account_id).await?;

                DogCatalog::matching_ids(&mut *tx, &criteria)
                    .await?
                    .into_iter()
                    .filter(|id| !decided.contains(id))
                    .collect()
            }
        };

        tx.commit().await?;

        tracing::debug!(
            account_id,
            bucket = bucket.as_str(),
            count = ids.len(),
            "Computed candidate sequence"
        );
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, ledger::DecisionStatus};

    struct Fixture {
        pool: SqlitePool,
        selector: CandidateSelector,
        ledger: DecisionLedger,
        preferences: PreferenceStore,
        user: i64,
    }

    /// Dogs 1..5: ages 60, 420, 720, 420, 36 and sizes m, l, xl, l, s
    async fn fixture() -> Fixture {
        let pool = db::test_pool().await;
        let user = db::insert_test_account(&pool, "test_user").await;
        PreferenceStore::create_default(&pool, user).await.unwrap();

        for (age, size) in [(60, "m"), (420, "l"), (720, "xl"), (420, "l"), (36, "s")] {
            db::insert_test_dog(&pool, age, "m", size).await;
        }

        Fixture {
            selector: CandidateSelector::new(pool.clone()),
            ledger: DecisionLedger::new(pool.clone()),
            preferences: PreferenceStore::new(pool.clone()),
            pool,
            user,
        }
    }

    #[tokio::test]
    async fn test_undecided_filters_by_age_bucket() {
        let f = fixture().await;

        // 420 and 720 months are past every bucket
        let ids = f.selector.candidates(f.user, Bucket::Undecided).await.unwrap();
        assert_eq!(ids, vec![1, 5]);
    }

    #[tokio::test]
    async fn test_undecided_excludes_decided_dogs() {
        let f = fixture().await;

        f.ledger.record_decision(f.user, 1, DecisionStatus::Liked).await.unwrap();
        f.ledger.record_decision(f.user, 5, DecisionStatus::Disliked).await.unwrap();

        let ids = f.selector.candidates(f.user, Bucket::Undecided).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_undecided_respects_size_and_age() {
        let f = fixture().await;

        f.preferences.update(f.user, &["s"], &["m", "f"], &["s"]).await.unwrap();
        assert!(f
            .selector
            .candidates(f.user, Bucket::Undecided)
            .await
            .unwrap()
            .is_empty());

        f.preferences.update(f.user, &["a"], &["m", "f"], &["s"]).await.unwrap();
        assert_eq!(
            f.selector.candidates(f.user, Bucket::Undecided).await.unwrap(),
            vec![5]
        );
    }

    #[tokio::test]
    async fn test_undecided_respects_gender() {
        let f = fixture().await;
        let female = db::insert_test_dog(&f.pool, 10, "f", "s").await;

        f.preferences.update(f.user, &["b"], &["f"], &["s", "m", "l", "xl"]).await.unwrap();
        assert_eq!(
            f.selector.candidates(f.user, Bucket::Undecided).await.unwrap(),
            vec![female]
        );
    }

    #[tokio::test]
    async fn test_liked_and_disliked_ignore_preferences() {
        let f = fixture().await;

        // Dog 3 (720 months) never matches the age buckets
        f.ledger.record_decision(f.user, 3, DecisionStatus::Liked).await.unwrap();
        f.ledger.record_decision(f.user, 1, DecisionStatus::Liked).await.unwrap();
        f.ledger.record_decision(f.user, 2, DecisionStatus::Disliked).await.unwrap();
        f.preferences.update(f.user, &["b"], &["f"], &["s"]).await.unwrap();

        assert_eq!(
            f.selector.candidates(f.user, Bucket::Liked).await.unwrap(),
            vec![1, 3]
        );
        assert_eq!(
            f.selector.candidates(f.user, Bucket::Disliked).await.unwrap(),
            vec![2]
        );
    }

    #[tokio::test]
    async fn test_buckets_never_overlap() {
        let f = fixture().await;

        f.ledger.record_decision(f.user, 1, DecisionStatus::Liked).await.unwrap();
        f.ledger.record_decision(f.user, 1, DecisionStatus::Disliked).await.unwrap();
        f.ledger.record_decision(f.user, 4, DecisionStatus::Liked).await.unwrap();

        let liked = f.selector.candidates(f.user, Bucket::Liked).await.unwrap();
        let disliked = f.selector.candidates(f.user, Bucket::Disliked).await.unwrap();
        let undecided = f.selector.candidates(f.user, Bucket::Undecided).await.unwrap();

        for id in &liked {
            assert!(!disliked.contains(id));
            assert!(!undecided.contains(id));
        }
        for id in &disliked {
            assert!(!undecided.contains(id));
        }
        assert_eq!(liked, vec![4]);
        assert_eq!(disliked, vec![1]);
        assert_eq!(undecided, vec![5]);
    }
}
