/// API routes and handlers
pub mod dogs;
pub mod health;
pub mod middleware;
pub mod user;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(user::routes())
        .merge(dogs::routes())
}
