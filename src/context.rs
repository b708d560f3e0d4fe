/// Application context and dependency injection
use crate::{
    account::AccountManager,
    catalog::{import_seed_file, DogCatalog},
    config::ServerConfig,
    db,
    error::{AppError, AppResult},
    ledger::DecisionLedger,
    matching::{CandidateSelector, MatchEngine},
    preference::PreferenceStore,
    rate_limit::RateLimiter,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub catalog: Arc<DogCatalog>,
    pub preferences: Arc<PreferenceStore>,
    pub ledger: Arc<DecisionLedger>,
    pub matcher: Arc<MatchEngine>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AppResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let ctx = Self::with_pool(config, db);

        if let Some(seed) = &ctx.config.storage.dog_seed_file {
            import_seed_file(&ctx.catalog, seed).await?;
        }

        let promoted = ctx.account_manager.promote_staff_accounts().await?;
        if promoted > 0 {
            tracing::info!(count = promoted, "Promoted configured staff accounts");
        }

        Ok(ctx)
    }

    /// Wire every service over an already migrated pool
    pub fn with_pool(config: ServerConfig, db: SqlitePool) -> Self {
        let config = Arc::new(config);

        let account_manager = Arc::new(AccountManager::new(db.clone(), config.clone()));
        let catalog = Arc::new(DogCatalog::new(db.clone()));
        let preferences = Arc::new(PreferenceStore::new(db.clone()));
        let ledger = Arc::new(DecisionLedger::new(db.clone()));
        let matcher = Arc::new(MatchEngine::new(
            CandidateSelector::new(db.clone()),
            catalog.clone(),
        ));
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Self {
            config,
            db,
            account_manager,
            catalog,
            preferences,
            ledger,
            matcher,
            rate_limiter,
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> AppResult<()> {
        let dir = &config.storage.data_directory;
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                AppError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }

    /// Context over a fresh in-memory database
    #[cfg(test)]
    pub async fn for_tests() -> Self {
        Self::with_pool(ServerConfig::for_tests(), db::test_pool().await)
    }
}
