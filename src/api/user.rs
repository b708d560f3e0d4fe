/// Account and preference endpoints
use crate::{
    account::{LoginRequest, RegisterRequest, RegisterResponse, TokenResponse},
    auth::AuthContext,
    context::AppContext,
    error::AppResult,
    preference::{Preference, PreferenceUpdate},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use validator::Validate;

/// Build user routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/user/", post(register))
        .route("/api/user/login/", post(login))
        .route("/api/user/logout/", post(logout))
        .route("/api/user/isstaff/", get(is_staff))
        .route(
            "/api/user/preferences/",
            get(get_preferences).put(update_preferences),
        )
}

/// Register a new account
async fn register(
    State(ctx): State<AppContext>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let account = ctx
        .account_manager
        .register(&req.username, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: account.id,
            username: account.username,
            is_active: account.is_active,
        }),
    ))
}

/// Exchange credentials for a token
async fn login(
    State(ctx): State<AppContext>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(req) = payload?;
    let (_, session) = ctx
        .account_manager
        .login(&req.username, &req.password)
        .await?;

    Ok(Json(TokenResponse {
        token: session.token,
    }))
}

/// Revoke the session behind the presented token
async fn logout(State(ctx): State<AppContext>, auth: AuthContext) -> AppResult<StatusCode> {
    ctx.account_manager
        .delete_session(&auth.session.session_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn is_staff(auth: AuthContext) -> Json<serde_json::Value> {
    Json(json!({ "is_staff": auth.session.is_staff }))
}

async fn get_preferences(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> AppResult<Json<Preference>> {
    let preference = ctx.preferences.get(auth.account_id).await?;
    Ok(Json(preference))
}

/// Replace all three preference fields
async fn update_preferences(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    payload: Result<Json<PreferenceUpdate>, JsonRejection>,
) -> AppResult<Json<Preference>> {
    let Json(req) = payload?;
    let age = req.age.into_codes();
    let gender = req.gender.into_codes();
    let size = req.size.into_codes();

    let preference = ctx
        .preferences
        .update(auth.account_id, &age, &gender, &size)
        .await?;

    Ok(Json(preference))
}
