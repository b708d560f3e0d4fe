/// Configuration management for Pupmatch
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Longest accepted session lifetime (one year)
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Tracing filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "pupmatch=debug,tower_http=debug";

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    /// JSON catalog imported when the dog table is empty
    pub dog_seed_file: Option<PathBuf>,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    /// Usernames of existing accounts promoted to staff at startup
    pub staff_usernames: Vec<String>,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub authenticated_rps: u32,
    pub anonymous_rps: u32,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            authenticated_rps: 50,
            anonymous_rps: 5,
            burst_size: 25,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub level: String,
    pub format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("PUPMATCH_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("PUPMATCH_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| AppError::Validation("Invalid port number".to_string()))?;

        let data_directory: PathBuf = env::var("PUPMATCH_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("PUPMATCH_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("pupmatch.sqlite"));
        let dog_seed_file = env::var("PUPMATCH_DOG_SEED_FILE").ok().map(PathBuf::from);

        let jwt_secret = env::var("PUPMATCH_JWT_SECRET")
            .map_err(|_| AppError::Validation("JWT secret required".to_string()))?;
        let session_ttl_hours = env::var("PUPMATCH_SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);
        let staff_usernames = parse_list(&env::var("PUPMATCH_STAFF_USERNAMES").unwrap_or_default());

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            enabled: env::var("PUPMATCH_RATE_LIMITS_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enabled),
            authenticated_rps: env::var("PUPMATCH_RATE_LIMIT_AUTHENTICATED_RPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.authenticated_rps),
            anonymous_rps: env::var("PUPMATCH_RATE_LIMIT_ANONYMOUS_RPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.anonymous_rps),
            burst_size: env::var("PUPMATCH_RATE_LIMIT_BURST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.burst_size),
        };

        let level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(ServerConfig {
            service: ServiceConfig { hostname, port },
            storage: StorageConfig {
                data_directory,
                database,
                dog_seed_file,
            },
            authentication: AuthConfig {
                jwt_secret,
                session_ttl_hours,
                staff_usernames,
            },
            rate_limit,
            logging: LoggingConfig { level, format },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(AppError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        let ttl = self.authentication.session_ttl_hours;
        if ttl <= 0 || ttl > MAX_SESSION_TTL_HOURS {
            return Err(AppError::Validation(format!(
                "Session TTL must be between 1 and {} hours",
                MAX_SESSION_TTL_HOURS
            )));
        }

        Ok(())
    }

    /// Minimal configuration for unit and HTTP tests
    #[cfg(test)]
    pub fn for_tests() -> Self {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8000,
            },
            storage: StorageConfig {
                data_directory: PathBuf::from("./data"),
                database: PathBuf::from(":memory:"),
                dog_seed_file: None,
            },
            authentication: AuthConfig {
                jwt_secret: "test-secret-key-for-testing-only-0123".to_string(),
                session_ttl_hours: 24,
                staff_usernames: vec!["admin".to_string()],
            },
            rate_limit: RateLimitConfig {
                enabled: false,
                ..RateLimitConfig::default()
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}

/// Split a comma-separated list, dropping blanks
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("alice, bob,,carol "), vec!["alice", "bob", "carol"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = ServerConfig::for_tests();
        assert!(config.validate().is_ok());

        config.authentication.jwt_secret = "short".to_string();
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_bounds_session_ttl() {
        let mut config = ServerConfig::for_tests();

        config.authentication.session_ttl_hours = 0;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        config.authentication.session_ttl_hours = MAX_SESSION_TTL_HOURS;
        assert!(config.validate().is_ok());

        config.authentication.session_ttl_hours = MAX_SESSION_TTL_HOURS + 1;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        config.authentication.session_ttl_hours = i64::MAX;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_hostname() {
        let mut config = ServerConfig::for_tests();
        config.service.hostname.clear();
        assert!(config.validate().is_err());
    }
}
