//! Операторские ручки: сбор кандидатов со стороннего сайта и их импорт.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::import::{self, ImportResult, ImportTheater};
use crate::services::scraper::ScrapedTheater;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/scrape", get(scrape_theaters))
        .route("/import", post(import_theaters))
}

// GET /api/admin/scrape?subdivisionId=13
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeQuery {
    subdivision_id: Option<i32>,
    #[serde(default)]
    refresh: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeResponse {
    subdivision_id: i32,
    count: usize,
    theaters: Vec<ScrapedTheater>,
}

async fn scrape_theaters(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ScrapeQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = query?;
    let subdivision_id = params.subdivision_id.ok_or(AppError::MissingField("subdivisionId"))?;

    if !params.refresh {
        if let Some(theaters) = state.cache.get_cached_scrape(subdivision_id).await {
            tracing::debug!("Scrape cache hit for subdivision {}", subdivision_id);
            return Ok(Json(ScrapeResponse { subdivision_id, count: theaters.len(), theaters }));
        }
    }

    let theaters = state.scraper.scrape_subdivision(subdivision_id).await?;
    state.cache.cache_scrape(subdivision_id, &theaters).await;

    Ok(Json(ScrapeResponse { subdivision_id, count: theaters.len(), theaters }))
}

// POST /api/admin/import
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub theaters: Option<Vec<ImportTheater>>,
}

impl ImportRequest {
    /// Проверка тела целиком до того, как что-либо запишется.
    pub fn into_candidates(self) -> Result<Vec<ImportTheater>, AppError> {
        let theaters = self.theaters.ok_or(AppError::MissingField("theaters"))?;
        if theaters.is_empty() {
            return Err(AppError::Validation("theaters must not be empty".to_string()));
        }
        for (i, theater) in theaters.iter().enumerate() {
            theater
                .validate()
                .map_err(|e| AppError::Validation(format!("theaters[{}]: {}", i, e)))?;
        }
        Ok(theaters)
    }
}

#[derive(Debug, Serialize)]
struct ImportResponse {
    results: Vec<ImportResult>,
}

async fn import_theaters(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;
    let candidates = req.into_candidates()?;

    let results = import::import_theaters(&state.db, &candidates).await;
    Ok((StatusCode::CREATED, Json(ImportResponse { results })))
}
