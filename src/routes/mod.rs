pub mod auth;
pub mod entries;
pub mod invitations;
pub mod lists;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The full HTTP API with request tracing attached.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(lists::router())
        .merge(entries::router())
        .merge(invitations::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject blank values for fields the API treats as mandatory.
pub(crate) fn required<'a>(field: &str, value: &'a str) -> AppResult<&'a str> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value)
}
