use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::db::models::Entry;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, JsonBody, PathParam};
use crate::response::{ok, ApiResult};
use crate::routes::required;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/lists/{id}/entries", get(list_entries).post(add_entry))
        .route("/lists/{id}/entries/move", post(move_entry))
        .route(
            "/entries/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/entries/{id}/complete", post(complete_entry))
}

#[derive(Deserialize)]
pub struct EntryRequest {
    pub text: String,
    pub category: String,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub category: String,
    pub old_index: i64,
    pub new_index: i64,
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

/// Load an entry the caller is allowed to touch.
fn member_entry(state: &AppState, user: &CurrentUser, entry_id: i64) -> AppResult<Entry> {
    let entry = state.entries.get(entry_id)?;
    state.lists.require_member(entry.list_id, user.id)?;
    Ok(entry)
}

async fn list_entries(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(list_id): PathParam<i64>,
) -> ApiResult<Vec<Entry>> {
    state.lists.require_member(list_id, user.id)?;
    ok(state.entries.all(list_id)?)
}

async fn add_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(list_id): PathParam<i64>,
    JsonBody(req): JsonBody<EntryRequest>,
) -> ApiResult<Entry> {
    let text = required("text", &req.text)?;
    let category = required("category", &req.category)?;
    state.lists.require_member(list_id, user.id)?;

    ok(state.entries.add(list_id, text, category)?)
}

/// POST /lists/{id}/entries/move: `data` is whether the entry moved
async fn move_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(list_id): PathParam<i64>,
    JsonBody(req): JsonBody<MoveRequest>,
) -> ApiResult<bool> {
    let category = required("category", &req.category)?;
    state.lists.require_member(list_id, user.id)?;

    ok(state
        .entries
        .move_entry(list_id, category, req.old_index, req.new_index)?)
}

async fn get_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(entry_id): PathParam<i64>,
) -> ApiResult<Entry> {
    ok(member_entry(&state, &user, entry_id)?)
}

async fn update_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(entry_id): PathParam<i64>,
    JsonBody(req): JsonBody<EntryRequest>,
) -> ApiResult<Entry> {
    let text = required("text", &req.text)?;
    let category = required("category", &req.category)?;
    member_entry(&state, &user, entry_id)?;

    if !state.entries.update(entry_id, text, category)? {
        return Err(AppError::NotFound);
    }
    ok(state.entries.get(entry_id)?)
}

async fn complete_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(entry_id): PathParam<i64>,
    JsonBody(req): JsonBody<CompleteRequest>,
) -> ApiResult<Entry> {
    member_entry(&state, &user, entry_id)?;

    if !state.entries.complete(entry_id, req.completed)? {
        return Err(AppError::NotFound);
    }
    ok(state.entries.get(entry_id)?)
}

async fn delete_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(entry_id): PathParam<i64>,
) -> ApiResult<()> {
    member_entry(&state, &user, entry_id)?;

    if !state.entries.delete(entry_id)? {
        return Err(AppError::NotFound);
    }
    ok(())
}
