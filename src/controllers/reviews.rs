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
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Seat, SeatReview};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats/{id}/reviews", get(list_seat_reviews))
        .route("/reviews", post(create_review))
        .route("/reviews/{id}", delete(delete_review))
        .route("/reviews/{id}/bookmark", post(add_bookmark).delete(remove_bookmark))
        .route("/me/bookmarks", get(list_bookmarks))
}

/* ---------- helpers ---------- */

async fn review_or_404(state: &AppState, id: i64) -> AppResult<SeatReview> {
    SeatReview::find(id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {}", id)))
}

// Отзывы меняют агрегаты на схеме зала - сбрасываем её кеш
async fn invalidate_seat_screen(state: &AppState, seat_id: i64) {
    if let Ok(Some(seat)) = Seat::find(seat_id, &state.db).await {
        state.cache.invalidate_seats(seat.screen_id).await;
    }
}

/* ---------- REVIEWS ---------- */

// GET /api/seats/{id}/reviews
async fn list_seat_reviews(
    State(state): State<Arc<AppState>>,
    Path(seat_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let seat = Seat::find(seat_id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("seat {}", seat_id)))?;
    let reviews = SeatReview::for_seat(seat.id, &state.db).await?;
    Ok(Json(json!({ "seat": seat, "reviews": reviews })))
}

// POST /api/reviews
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub seat_id: Option<i64>,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i16>,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub comment: String,
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;
    let seat_id = req.seat_id.ok_or(AppError::MissingField("seatId"))?;
    let rating = req.rating.ok_or(AppError::MissingField("rating"))?;
    req.validate()?;

    let seat = Seat::find(seat_id, &state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("seat {}", seat_id)))?;

    // Подпись места фиксируется в момент создания отзыва
    let review = SeatReview::create(seat.id, user.user_id, &seat.label(), rating, req.comment.trim(), &state.db).await?;
    state.cache.invalidate_seats(seat.screen_id).await;

    Ok((StatusCode::CREATED, Json(review)))
}

// DELETE /api/reviews/{id} - только автор
async fn delete_review(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let review = review_or_404(&state, id).await?;
    if review.user_id != user.user_id {
        return Err(AppError::Forbidden("review belongs to another user".to_string()));
    }

    SeatReview::delete(id, &state.db).await?;
    invalidate_seat_screen(&state, review.seat_id).await;

    Ok(Json(json!({ "message": "Review deleted" })))
}

/* ---------- BOOKMARKS ---------- */

// POST /api/reviews/{id}/bookmark
async fn add_bookmark(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let review = review_or_404(&state, id).await?;
    let created = SeatReview::add_bookmark(review.id, user.user_id, &state.db).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(json!({ "reviewId": review.id, "bookmarked": true }))))
}

// DELETE /api/reviews/{id}/bookmark
async fn remove_bookmark(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    if !SeatReview::remove_bookmark(id, user.user_id, &state.db).await? {
        return Err(AppError::NotFound(format!("bookmark for review {}", id)));
    }
    Ok(Json(json!({ "reviewId": id, "bookmarked": false })))
}

// GET /api/me/bookmarks
async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let reviews = SeatReview::bookmarked_by(user.user_id, &state.db).await?;
    Ok(Json(reviews))
}
