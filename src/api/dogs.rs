/// Dog endpoints: decisions, next-dog lookups and catalog administration
use crate::{
    auth::{AuthContext, StaffAuthContext},
    catalog::{Dog, DogId, NewDog},
    context::AppContext,
    error::{AppError, AppResult},
    matching::Bucket,
    metrics,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

/// Build dog routes.
///
/// Every route names its first segment `id` so the router accepts them side by side.
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/dog/", post(create_dog))
        .route(
            "/api/dog/:id/",
            get(get_dog).put(update_dog).delete(delete_dog),
        )
        .route("/api/dog/:id/:bucket/", post(decide).put(decide))
        .route("/api/dog/:id/:bucket/next/", get(next_dog))
}

/// Response to a decision change
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub dog: DogId,
    pub status: &'static str,
}

fn parse_dog_id(raw: &str) -> AppResult<DogId> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid dog id: {}", raw)))
}

/// Mark a dog liked, disliked, or undecided for the caller
async fn decide(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((id, bucket)): Path<(String, String)>,
) -> AppResult<Json<DecisionResponse>> {
    let bucket: Bucket = bucket.parse()?;
    let dog_id = parse_dog_id(&id)?;

    // Decisions only exist for catalogued dogs
    ctx.catalog.get_dog(dog_id).await?;

    match bucket.status() {
        Some(status) => {
            ctx.ledger
                .record_decision(auth.account_id, dog_id, status)
                .await?;
        }
        None => ctx.ledger.clear_decision(auth.account_id, dog_id).await?,
    }
    metrics::record_decision(bucket.code());

    Ok(Json(DecisionResponse {
        dog: dog_id,
        status: bucket.code(),
    }))
}

/// Next dog after the cursor in the requested bucket
async fn next_dog(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((cursor, bucket)): Path<(String, String)>,
) -> AppResult<Json<Dog>> {
    let bucket: Bucket = bucket.parse()?;
    let cursor = parse_dog_id(&cursor)?;

    let dog = ctx.matcher.next_dog(auth.account_id, bucket, cursor).await?;
    tracing::debug!(
        account_id = auth.account_id,
        bucket = bucket.as_str(),
        cursor,
        dog_id = dog.id,
        "Served next dog"
    );

    Ok(Json(dog))
}

async fn get_dog(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> AppResult<Json<Dog>> {
    let dog = ctx.catalog.get_dog(parse_dog_id(&id)?).await?;
    Ok(Json(dog))
}

async fn create_dog(
    State(ctx): State<AppContext>,
    staff: StaffAuthContext,
    payload: Result<Json<NewDog>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Dog>)> {
    let Json(req) = payload?;
    let dog = ctx.catalog.create_dog(req).await?;
    tracing::info!(staff_id = staff.account_id, dog_id = dog.id, "Staff created dog");
    Ok((StatusCode::CREATED, Json(dog)))
}

async fn update_dog(
    State(ctx): State<AppContext>,
    staff: StaffAuthContext,
    Path(id): Path<String>,
    payload: Result<Json<NewDog>, JsonRejection>,
) -> AppResult<Json<Dog>> {
    let dog_id = parse_dog_id(&id)?;
    let Json(req) = payload?;
    let dog = ctx.catalog.update_dog(dog_id, req).await?;
    tracing::info!(staff_id = staff.account_id, dog_id, "Staff updated dog");
    Ok(Json(dog))
}

async fn delete_dog(
    State(ctx): State<AppContext>,
    staff: StaffAuthContext,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let dog_id = parse_dog_id(&id)?;
    ctx.catalog.delete_dog(dog_id).await?;
    tracing::info!(staff_id = staff.account_id, dog_id, "Staff deleted dog");
    Ok(StatusCode::NO_CONTENT)
}
