/// Next-dog selection engine
///
/// Ties the candidate selector and the cursor navigator together: given an
/// account, a bucket and the last seen dog id, find the next dog to show.

pub mod cursor;
pub mod selector;

pub use cursor::next_after;
pub use selector::CandidateSelector;

use crate::{
    catalog::{Dog, DogCatalog, DogId},
    error::{AppError, AppResult},
    ledger::DecisionStatus,
    metrics,
};
use std::{str::FromStr, sync::Arc};

/// Decision bucket being browsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Liked,
    Disliked,
    Undecided,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Liked => "liked",
            Bucket::Disliked => "disliked",
            Bucket::Undecided => "undecided",
        }
    }

    /// Single-letter status code used in decision payloads
    pub fn code(&self) -> &'static str {
        match self {
            Bucket::Liked => DecisionStatus::Liked.as_str(),
            Bucket::Disliked => DecisionStatus::Disliked.as_str(),
            Bucket::Undecided => "u",
        }
    }

    /// Persisted status for the bucket; undecided has none
    pub fn status(&self) -> Option<DecisionStatus> {
        match self {
            Bucket::Liked => Some(DecisionStatus::Liked),
            Bucket::Disliked => Some(DecisionStatus::Disliked),
            Bucket::Undecided => None,
        }
    }
}

impl FromStr for Bucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "liked" => Ok(Bucket::Liked),
            "disliked" => Ok(Bucket::Disliked),
            "undecided" => Ok(Bucket::Undecided),
            _ => Err(AppError::UnknownBucket(s.to_string())),
        }
    }
}

/// Next-dog lookups
#[derive(Clone)]
pub struct MatchEngine {
    selector: CandidateSelector,
    catalog: Arc<DogCatalog>,
}

impl MatchEngine {
    pub fn new(selector: CandidateSelector, catalog: Arc<DogCatalog>) -> Self {
        Self { selector, catalog }
    }

    /// Id of the next eligible dog after `cursor`, if any
    pub async fn next_dog_id(
        &self,
        account_id: i64,
        bucket: Bucket,
        cursor: DogId,
    ) -> AppResult<Option<DogId>> {
        let candidates = self.selector.candidates(account_id, bucket).await?;
        Ok(next_after(&candidates, cursor))
    }

    /// Next eligible dog after `cursor`, or `NotFound` once the bucket is exhausted
    pub async fn next_dog(&self, account_id: i64, bucket: Bucket, cursor: DogId) -> AppResult<Dog> {
        let next = self.next_dog_id(account_id, bucket, cursor).await?;
        metrics::record_next_lookup(bucket.as_str(), next.is_some());

        let dog_id = next.ok_or_else(|| {
            AppError::NotFound(format!("No {} dog after {}", bucket.as_str(), cursor))
        })?;

        self.catalog.get_dog(dog_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, ledger::DecisionLedger, preference::PreferenceStore};

    #[test]
    fn test_bucket_parsing() {
        assert_eq!("liked".parse::<Bucket>().unwrap(), Bucket::Liked);
        assert_eq!("disliked".parse::<Bucket>().unwrap(), Bucket::Disliked);
        assert_eq!("undecided".parse::<Bucket>().unwrap(), Bucket::Undecided);
        assert!(matches!(
            "likedd".parse::<Bucket>(),
            Err(AppError::UnknownBucket(_))
        ));
    }

    #[test]
    fn test_bucket_codes() {
        assert_eq!(Bucket::Liked.code(), "l");
        assert_eq!(Bucket::Disliked.code(), "d");
        assert_eq!(Bucket::Undecided.code(), "u");
        assert_eq!(Bucket::Undecided.status(), None);
    }

    async fn engine_with_dogs() -> (MatchEngine, DecisionLedger, PreferenceStore, i64) {
        let pool = db::test_pool().await;
        let user = db::insert_test_account(&pool, "test_user").await;
        PreferenceStore::create_default(&pool, user).await.unwrap();

        for (age, size) in [(60, "m"), (420, "l"), (720, "xl"), (420, "l"), (36, "s")] {
            db::insert_test_dog(&pool, age, "m", size).await;
        }

        let engine = MatchEngine::new(
            CandidateSelector::new(pool.clone()),
            Arc::new(DogCatalog::new(pool.clone())),
        );
        (
            engine,
            DecisionLedger::new(pool.clone()),
            PreferenceStore::new(pool),
            user,
        )
    }

    #[tokio::test]
    async fn test_first_undecided_dog() {
        let (engine, _ledger, _prefs, user) = engine_with_dogs().await;

        let dog = engine.next_dog(user, Bucket::Undecided, 0).await.unwrap();
        assert_eq!(dog.id, 1);
        assert_eq!(dog.age, 60);
    }

    #[tokio::test]
    async fn test_liked_dogs_drop_out_of_undecided() {
        let (engine, ledger, _prefs, user) = engine_with_dogs().await;

        ledger.record_decision(user, 1, DecisionStatus::Liked).await.unwrap();
        ledger.record_decision(user, 2, DecisionStatus::Liked).await.unwrap();

        // Dogs 3 and 4 are older than every age bucket
        let next = engine.next_dog_id(user, Bucket::Undecided, 0).await.unwrap();
        assert_eq!(next, Some(5));
    }

    #[tokio::test]
    async fn test_senior_small_preference_finds_nothing() {
        let (engine, _ledger, prefs, user) = engine_with_dogs().await;

        prefs.update(user, &["s"], &["m", "f"], &["s"]).await.unwrap();

        let result = engine.next_dog(user, Bucket::Undecided, 0).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_walk_liked_bucket() {
        let (engine, ledger, _prefs, user) = engine_with_dogs().await;

        ledger.record_decision(user, 1, DecisionStatus::Liked).await.unwrap();
        ledger.record_decision(user, 2, DecisionStatus::Liked).await.unwrap();

        assert_eq!(engine.next_dog(user, Bucket::Liked, 0).await.unwrap().id, 1);
        assert_eq!(engine.next_dog(user, Bucket::Liked, 1).await.unwrap().id, 2);
        assert!(matches!(
            engine.next_dog(user, Bucket::Liked, 2).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resume_after_cursor_was_decided() {
        let (engine, ledger, _prefs, user) = engine_with_dogs().await;

        // User was looking at dog 1, then liked it; resuming from 1 still works
        ledger.record_decision(user, 1, DecisionStatus::Liked).await.unwrap();
        assert_eq!(
            engine.next_dog_id(user, Bucket::Undecided, 1).await.unwrap(),
            Some(5)
        );

        // Undeciding brings it back for a fresh walk
        ledger.clear_decision(user, 1).await.unwrap();
        assert_eq!(
            engine.next_dog_id(user, Bucket::Undecided, 0).await.unwrap(),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_empty_disliked_bucket() {
        let (engine, _ledger, _prefs, user) = engine_with_dogs().await;

        assert!(matches!(
            engine.next_dog(user, Bucket::Disliked, -1).await,
            Err(AppError::NotFound(_))
        ));
    }
}
