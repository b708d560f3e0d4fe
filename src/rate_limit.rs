/// Rate Limiting System
use crate::{
    api::middleware::extract_token,
    config::RateLimitConfig,
    context::AppContext,
    error::{AppError, AppResult},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

type DirectLimiter = GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    authenticated: Arc<DirectLimiter>,
    anonymous: Arc<DirectLimiter>,
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let auth_quota = Quota::per_second(non_zero(config.authenticated_rps))
            .allow_burst(non_zero(config.burst_size));

        // Anonymous callers get a fifth of the burst allowance
        let anon_quota = Quota::per_second(non_zero(config.anonymous_rps))
            .allow_burst(non_zero(config.burst_size / 5));

        Self {
            enabled: config.enabled,
            authenticated: Arc::new(GovernorLimiter::direct(auth_quota)),
            anonymous: Arc::new(GovernorLimiter::direct(anon_quota)),
        }
    }

    /// Check rate limit for an authenticated caller
    pub fn check_authenticated(&self) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }
        self.authenticated
            .check()
            .map_err(|_| AppError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(1),
            })
    }

    /// Check rate limit for an anonymous caller
    pub fn check_anonymous(&self) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }
        self.anonymous
            .check()
            .map_err(|_| AppError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(1),
            })
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if extract_token(request.headers()).is_some() {
        ctx.rate_limiter.check_authenticated()?;
    } else {
        ctx.rate_limiter.check_anonymous()?;
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(&RateLimitConfig::default());

        assert!(limiter.check_authenticated().is_ok());
        assert!(limiter.check_anonymous().is_ok());
    }

    #[test]
    fn test_burst_limit() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: true,
            authenticated_rps: 1,
            anonymous_rps: 1,
            burst_size: 5,
        });

        for _ in 0..5 {
            assert!(limiter.check_authenticated().is_ok());
        }
        assert!(matches!(
            limiter.check_authenticated(),
            Err(AppError::RateLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_disabled_limiter_never_rejects() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: false,
            authenticated_rps: 1,
            anonymous_rps: 1,
            burst_size: 1,
        });

        for _ in 0..20 {
            assert!(limiter.check_anonymous().is_ok());
        }
    }
}
