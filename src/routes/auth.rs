use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use crate::auth::{credentials, session};
use crate::db::models::Session;
use crate::extractors::{CurrentUser, JsonBody};
use crate::response::{ok, ApiResult};
use crate::routes::required;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify", post(verify))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// POST /auth/register: create an account and sign it in
async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CredentialsRequest>,
) -> ApiResult<Session> {
    let username = required("username", &req.username)?;
    let password = required("password", &req.password)?;
    let auth = &state.config.auth;

    let user = credentials::register(&state.db, username, password, auth.bcrypt_cost)?;
    ok(session::create_session(&state.db, &user, auth.session_days)?)
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CredentialsRequest>,
) -> ApiResult<Session> {
    let username = required("username", &req.username)?;
    let password = required("password", &req.password)?;
    let auth = &state.config.auth;

    let user = credentials::login(&state.db, username, password, auth.bcrypt_cost)?;
    tracing::info!("User {} logged in", user.username);
    ok(session::create_session(&state.db, &user, auth.session_days)?)
}

/// POST /auth/verify: resolve a token to its session
async fn verify(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<VerifyRequest>,
) -> ApiResult<Session> {
    ok(session::verify_session(&state.db, &req.token)?)
}

async fn logout(State(state): State<AppState>, user: CurrentUser) -> ApiResult<()> {
    session::delete_session(&state.db, &user.token)?;
    tracing::info!("User {} logged out", user.username);
    ok(())
}
