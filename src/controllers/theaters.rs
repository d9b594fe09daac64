use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{not_blank, Screen, Subdivision, Theater};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/subdivisions", get(list_subdivisions))
        .route("/theaters", get(search_theaters).post(create_theater))
        .route(
            "/theaters/{id}",
            get(get_theater).patch(update_theater).delete(delete_theater),
        )
        .route("/theaters/{id}/screens", post(create_screen))
}

// null в JSON -> Some(None), отсутствие поля -> None
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

// GET /api/subdivisions
async fn list_subdivisions(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let subdivisions = Subdivision::all(&state.db).await?;
    Ok(Json(subdivisions))
}

// GET /api/theaters?subdivisionId=13&q=...
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TheatersQuery {
    subdivision_id: Option<i32>,
    q: Option<String>,
}

async fn search_theaters(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TheatersQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = query?;
    let theaters = Theater::search(params.subdivision_id, params.q.as_deref(), &state.db).await?;
    Ok(Json(json!({ "count": theaters.len(), "theaters": theaters })))
}

// GET /api/theaters/{id}
#[derive(Debug, Serialize)]
struct TheaterDetail {
    #[serde(flatten)]
    theater: Theater,
    screens: Vec<Screen>,
}

async fn get_theater(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let theater = Theater::find(id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("theater {}", id)))?;
    let screens = Screen::for_theater(id, &state.db).await?;
    Ok(Json(TheaterDetail { theater, screens }))
}

// POST /api/theaters
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateTheaterRequest {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    name: String,
    #[validate(length(min = 1, max = 300), custom(function = "not_blank"))]
    address: String,
    #[validate(url)]
    official_url: Option<String>,
    subdivision_id: i32,
}

async fn create_theater(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTheaterRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;
    req.validate()?;
    if !Subdivision::exists(req.subdivision_id, &state.db).await? {
        return Err(AppError::Validation(format!("unknown subdivision {}", req.subdivision_id)));
    }

    let theater = Theater::create(
        req.name.trim(),
        req.address.trim(),
        req.official_url.as_deref(),
        req.subdivision_id,
        &state.db,
    )
    .await
    .map_err(|e| AppError::from_write(e, format!("theater '{}'", req.name.trim())))?;

    tracing::info!("Theater {} created manually", theater.id);
    Ok((StatusCode::CREATED, Json(theater)))
}

// PATCH /api/theaters/{id}
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateTheaterRequest {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    name: Option<String>,
    #[validate(length(min = 1, max = 300), custom(function = "not_blank"))]
    address: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    official_url: Option<Option<String>>,
}

async fn update_theater(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateTheaterRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;
    req.validate()?;
    if let Some(Some(url)) = &req.official_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AppError::Validation("officialUrl must be an http(s) URL".to_string()));
        }
    }

    let theater = Theater::update(
        id,
        req.name.as_deref().map(str::trim),
        req.address.as_deref().map(str::trim),
        req.official_url.as_ref().map(|u| u.as_deref()),
        &state.db,
    )
    .await
    .map_err(|e| AppError::from_write(e, "theater with this name"))?
    .ok_or_else(|| AppError::NotFound(format!("theater {}", id)))?;

    Ok(Json(theater))
}

// DELETE /api/theaters/{id} - залы, места и отзывы удаляются каскадом
async fn delete_theater(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let screen_ids: Vec<i64> = Screen::for_theater(id, &state.db).await?.iter().map(|s| s.id).collect();
    if !Theater::delete(id, &state.db).await? {
        return Err(AppError::NotFound(format!("theater {}", id)));
    }
    // Схемы удалённых каскадом экранов не должны отдаваться из кеша
    state.cache.invalidate_screens(&screen_ids).await;
    tracing::warn!("Theater {} deleted with {} screens", id, screen_ids.len());
    Ok(Json(json!({ "message": "Theater deleted" })))
}

// POST /api/theaters/{id}/screens
#[derive(Debug, Deserialize, Validate)]
struct CreateScreenRequest {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    name: String,
}

async fn create_screen(
    State(state): State<Arc<AppState>>,
    Path(theater_id): Path<i64>,
    payload: Result<Json<CreateScreenRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;
    req.validate()?;
    Theater::find(theater_id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("theater {}", theater_id)))?;

    let name = req.name.trim();
    let screen = Screen::create(theater_id, name, &state.db)
        .await
        .map_err(|e| AppError::from_write(e, format!("screen '{}'", name)))?;

    Ok((StatusCode::CREATED, Json(screen)))
}
