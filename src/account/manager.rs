/// Account manager implementation using runtime queries
use crate::{
    account::ValidatedSession,
    config::ServerConfig,
    db::account::{Account, Session},
    error::{AppError, AppResult},
    metrics,
    preference::PreferenceStore,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    sid: String,
    iat: i64,
    exp: i64,
}

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
}

impl AccountManager {
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Register a new account.
    ///
    /// The account row and its default preference are written in one
    /// transaction.
    pub async fn register(&self, username: &str, password: &str) -> AppResult<Account> {
        if self.username_exists(username).await? {
            return Err(AppError::Conflict(
                "A user with that username already exists.".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        let id = sqlx::query(
            "INSERT INTO account (username, password_hash, is_active, is_staff, created_at)
             VALUES (?1, ?2, 1, 0, ?3)",
        )
        .bind(username)
        .bind(&password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("A user with that username already exists.".to_string())
            }
            other => AppError::Database(other),
        })?
        .last_insert_rowid();

        PreferenceStore::create_default(&mut *tx, id).await?;

        tx.commit().await?;

        metrics::record_account_registration();
        tracing::info!(account_id = id, username, "Registered account");

        Ok(Account {
            id,
            username: username.to_string(),
            password_hash,
            is_active: true,
            is_staff: false,
            created_at: now,
            last_login: None,
        })
    }

    /// Grant staff rights to existing accounts named in the configuration.
    ///
    /// Registration never grants staff, so a configured name only gains
    /// rights once its account exists when this runs.
    pub async fn promote_staff_accounts(&self) -> AppResult<u64> {
        let usernames = &self.config.authentication.staff_usernames;
        if usernames.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; usernames.len()].join(", ");
        let query_str = format!(
            "UPDATE account SET is_staff = 1 WHERE is_staff = 0 AND username IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&query_str);
        for username in usernames {
            query = query.bind(username);
        }
        let result = query.execute(&self.db).await?;

        Ok(result.rows_affected())
    }

    /// Verify credentials and open a session
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(Account, Session)> {
        let account = self
            .get_account_by_username(username)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => {
                    AppError::Authentication("Invalid credentials".to_string())
                }
                other => other,
            })?;

        if !account.is_active {
            return Err(AppError::Authorization("Account is inactive".to_string()));
        }

        if !verify_password(password, &account.password_hash)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        sqlx::query("UPDATE account SET last_login = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(account.id)
            .execute(&self.db)
            .await?;

        let session = self.create_session(account.id).await?;
        tracing::debug!(account_id = account.id, session_id = %session.id, "Login succeeded");

        Ok((account, session))
    }

    /// Issue a signed token and persist its session row
    pub async fn create_session(&self, account_id: i64) -> AppResult<Session> {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.authentication.session_ttl_hours);

        let claims = Claims {
            sub: account_id.to_string(),
            sid: session_id.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.authentication.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Jwt(format!("Failed to generate token: {}", e)))?;

        sqlx::query(
            "INSERT INTO session (id, account_id, token, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&session_id)
        .bind(account_id)
        .bind(&token)
        .bind(now)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(Session {
            id: session_id,
            account_id,
            token,
            created_at: now,
            expires_at,
        })
    }

    /// Validate a request credential and return the session it belongs to
    pub async fn validate_access_token(&self, token: &str) -> AppResult<ValidatedSession> {
        let decoding_key =
            DecodingKey::from_secret(self.config.authentication.jwt_secret.as_bytes());
        decode::<Claims>(token, &decoding_key, &Validation::new(Algorithm::HS256)).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Authentication("Token has expired".to_string())
                }
                _ => AppError::Authentication("Invalid token".to_string()),
            },
        )?;

        // A valid signature is not enough: the session must still exist
        let row = sqlx::query(
            "SELECT s.id, s.account_id, s.expires_at, a.is_active, a.is_staff
             FROM session s JOIN account a ON a.id = s.account_id
             WHERE s.token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid or expired session".to_string()))?;

        let expires_at: DateTime<Utc> = row.get("expires_at");
        if Utc::now() > expires_at {
            return Err(AppError::Authentication("Session expired".to_string()));
        }

        let is_active: bool = row.get("is_active");
        if !is_active {
            return Err(AppError::Authorization("Account is inactive".to_string()));
        }

        Ok(ValidatedSession {
            account_id: row.get("account_id"),
            session_id: row.get("id"),
            is_staff: row.get("is_staff"),
        })
    }

    /// Delete a session (logout)
    pub async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM session WHERE id = ?1")
            .bind(session_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Remove every session past its expiry; returns how many were removed
    pub async fn cleanup_expired_sessions(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM session WHERE expires_at < ?1")
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Get account by id
    #[cfg(test)]
    pub async fn get_account(&self, id: i64) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(
            "SELECT id, username, password_hash, is_active, is_staff, created_at, last_login
             FROM account WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    async fn get_account_by_username(&self, username: &str) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(
            "SELECT id, username, password_hash, is_active, is_staff, created_at, last_login
             FROM account WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM account WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.db)
            .await?;

        Ok(count > 0)
    }
}

/// Hash a password with Argon2id and a random salt
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, stored: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| AppError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
