use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::db::models::{List, ListDetail, User};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, JsonBody, PathParam};
use crate::response::{ok, ApiResult};
use crate::routes::required;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/lists", get(my_lists).post(create_list))
        .route("/lists/{id}", get(list_detail).delete(delete_list))
        .route("/lists/{id}/join", post(join_list))
        .route("/lists/{id}/leave", post(leave_list))
        .route("/lists/{id}/members", get(list_members))
}

#[derive(Deserialize)]
pub struct CreateListRequest {
    pub name: String,
}

async fn my_lists(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Vec<List>> {
    ok(state.lists.lists_for(user.id)?)
}

async fn create_list(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<CreateListRequest>,
) -> ApiResult<List> {
    let name = required("name", &req.name)?;
    ok(state.lists.create_list(user.id, name)?)
}

/// GET /lists/{id}: the list and every entry on it, members only
async fn list_detail(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(list_id): PathParam<i64>,
) -> ApiResult<ListDetail> {
    state.lists.require_member(list_id, user.id)?;
    ok(detail(&state, list_id)?)
}

async fn delete_list(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(list_id): PathParam<i64>,
) -> ApiResult<()> {
    state.lists.delete_list(list_id, user.id)?;
    ok(())
}

/// POST /lists/{id}/join: become a member, then see the list like one
async fn join_list(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(list_id): PathParam<i64>,
) -> ApiResult<ListDetail> {
    state.lists.join(list_id, user.id)?;
    tracing::info!("User {} joined list {}", user.username, list_id);
    ok(detail(&state, list_id)?)
}

async fn leave_list(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(list_id): PathParam<i64>,
) -> ApiResult<()> {
    state.lists.leave(list_id, user.id)?;
    ok(())
}

async fn list_members(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(list_id): PathParam<i64>,
) -> ApiResult<Vec<User>> {
    state.lists.require_member(list_id, user.id)?;
    ok(state.lists.members(list_id)?)
}

fn detail(state: &AppState, list_id: i64) -> AppResult<ListDetail> {
    let list = state.lists.get_list(list_id)?;
    let entries = state.entries.all(list_id)?;
    Ok(ListDetail { list, entries })
}
