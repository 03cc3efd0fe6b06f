use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Body of every API response: either the typed payload or an error message,
/// never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResponse<T> {
    Ok { data: T },
    Error { message: String },
}

pub type ApiResult<T> = AppResult<Json<ApiResponse<T>>>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::Ok { data }))
}
