/// Authentication extractors
use crate::{
    account::ValidatedSession, api::middleware::extract_token, context::AppContext,
    error::AppError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated context - extracts and validates the session from the request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account_id: i64,
    pub session: ValidatedSession,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers).ok_or_else(|| {
            AppError::Authentication("Authentication credentials were not provided".to_string())
        })?;

        let session = state.account_manager.validate_access_token(&token).await?;

        Ok(AuthContext {
            account_id: session.account_id,
            session,
        })
    }
}

/// Staff context - requires an authenticated staff account
#[derive(Debug, Clone)]
pub struct StaffAuthContext {
    pub account_id: i64,
}

#[async_trait]
impl FromRequestParts<AppContext> for StaffAuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_request_parts(parts, state).await?;

        if !auth.session.is_staff {
            tracing::warn!(account_id = auth.account_id, "Staff-only request denied");
            return Err(AppError::Authorization("Staff account required".to_string()));
        }

        Ok(StaffAuthContext {
            account_id: auth.account_id,
        })
    }
}
