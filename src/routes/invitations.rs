use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::db::models::Invitation;
use crate::extractors::{CurrentUser, JsonBody};
use crate::response::{ok, ApiResult};
use crate::routes::required;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invitations", get(my_invitations).post(invite))
        .route("/invitations/accept", post(accept))
        .route("/invitations/decline", post(decline))
        .route("/invitations/revoke", post(revoke))
}

#[derive(Deserialize)]
pub struct InviteRequest {
    pub list_id: i64,
    pub username: String,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

/// Pending invitations the caller sent or received.
async fn my_invitations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Vec<Invitation>> {
    ok(state.invitations.list_for(user.id)?)
}

async fn invite(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<InviteRequest>,
) -> ApiResult<Invitation> {
    let username = required("username", &req.username)?;
    ok(state.invitations.invite(user.id, req.list_id, username)?)
}

async fn accept(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<TokenRequest>,
) -> ApiResult<Invitation> {
    ok(state.invitations.accept(&req.token, user.id)?)
}

async fn decline(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<TokenRequest>,
) -> ApiResult<()> {
    state.invitations.decline(&req.token, user.id)?;
    ok(())
}

async fn revoke(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<TokenRequest>,
) -> ApiResult<()> {
    state.invitations.revoke(&req.token, user.id)?;
    ok(())
}
