/// Background task implementations
use crate::{context::AppContext, error::AppResult};

/// Cleanup expired sessions
pub async fn cleanup_expired_sessions(ctx: &AppContext) -> AppResult<u64> {
    ctx.account_manager.cleanup_expired_sessions().await
}
