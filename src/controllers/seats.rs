use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{Screen, SeatMapEntry};
use crate::services::layout::{self, LayoutChange, ReconcileCommand, SeatGrid};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats/layout", post(reconcile_layout))
        .route("/screens/{id}/seats", get(get_seat_map))
}

/* ---------- LAYOUT ---------- */

// POST /api/seats/layout
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    pub screen_id: Option<i64>,
    pub rows: Option<i64>,
    pub columns: Option<i64>,
}

impl TryFrom<ReconcileRequest> for ReconcileCommand {
    type Error = AppError;

    fn try_from(req: ReconcileRequest) -> Result<Self, Self::Error> {
        let screen_id = req.screen_id.ok_or(AppError::MissingField("screenId"))?;
        let rows = req.rows.ok_or(AppError::MissingField("rows"))?;
        let columns = req.columns.ok_or(AppError::MissingField("columns"))?;
        if screen_id <= 0 {
            return Err(AppError::Validation("screenId must be > 0".to_string()));
        }

        Ok(ReconcileCommand { screen_id, grid: SeatGrid::new(rows, columns)? })
    }
}

#[derive(Debug, Serialize)]
struct ReconcileResponse {
    message: String,
    #[serde(flatten)]
    change: LayoutChange,
}

async fn reconcile_layout(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;
    let cmd = ReconcileCommand::try_from(req)?;

    let change = layout::reconcile(&state.db, cmd).await?;
    state.cache.invalidate_seats(cmd.screen_id).await;

    Ok((
        StatusCode::CREATED,
        Json(ReconcileResponse {
            message: format!(
                "Seat layout updated to {} rows x {} columns",
                cmd.grid.rows(),
                cmd.grid.columns()
            ),
            change,
        }),
    ))
}

/* ---------- SEAT MAP ---------- */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeatMapResponse {
    screen_id: i64,
    seats: Vec<SeatMapEntry>,
}

// GET /api/screens/{id}/seats
async fn get_seat_map(
    State(state): State<Arc<AppState>>,
    Path(screen_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    if let Some(seats) = state.cache.get_seat_map(screen_id).await {
        return Ok(Json(SeatMapResponse { screen_id, seats }));
    }

    Screen::find(screen_id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("screen {}", screen_id)))?;

    let seats = SeatMapEntry::for_screen(screen_id, &state.db).await?;
    state.cache.save_seat_map(screen_id, &seats).await;

    Ok(Json(SeatMapResponse { screen_id, seats }))
}
