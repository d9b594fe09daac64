use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Favorite, Theater};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me/favorites", get(list_favorites))
        .route("/favorites", post(add_favorite))
        .route("/favorites/{theater_id}", delete(remove_favorite))
}

// GET /api/me/favorites
async fn list_favorites(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let favorites = Favorite::for_user(user.user_id, &state.db).await?;
    Ok(Json(favorites))
}

// POST /api/favorites
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddFavoriteRequest {
    theater_id: Option<i64>,
}

async fn add_favorite(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<AddFavoriteRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;
    let theater_id = req.theater_id.ok_or(AppError::MissingField("theaterId"))?;
    Theater::find(theater_id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("theater {}", theater_id)))?;

    let favorite = Favorite::add(user.user_id, theater_id, &state.db).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

// DELETE /api/favorites/{theater_id} - снимает все дубли разом
async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(theater_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let removed = Favorite::remove(user.user_id, theater_id, &state.db).await?;
    if removed == 0 {
        return Err(AppError::NotFound(format!("favorite for theater {}", theater_id)));
    }
    Ok(Json(json!({ "theaterId": theater_id, "removed": removed })))
}
