use serde::Serialize;
use sqlx::FromRow;
use chrono::NaiveDateTime;

use crate::database::Database;

const REVIEW_COLUMNS: &str = "r.id, r.seat_id, r.user_id, r.seat_label, r.rating, r.comment, r.created_at";

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatReview {
    pub id: i64,
    pub seat_id: i64,
    pub user_id: i64,
    /// Снимок подписи места на момент создания, не синхронизируется с seats.
    pub seat_label: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: NaiveDateTime,
}

impl SeatReview {
    pub async fn for_seat(seat_id: i64, db: &Database) -> Result<Vec<SeatReview>, sqlx::Error> {
        sqlx::query_as::<_, SeatReview>(&format!(
            "SELECT {} FROM seat_reviews r WHERE r.seat_id = $1 ORDER BY r.created_at DESC, r.id DESC",
            REVIEW_COLUMNS
        ))
        .bind(seat_id)
        .fetch_all(&db.pool)
        .await
    }

    pub async fn find(id: i64, db: &Database) -> Result<Option<SeatReview>, sqlx::Error> {
        sqlx::query_as::<_, SeatReview>(&format!(
            "SELECT {} FROM seat_reviews r WHERE r.id = $1",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn create(
        seat_id: i64,
        user_id: i64,
        seat_label: &str,
        rating: i16,
        comment: &str,
        db: &Database,
    ) -> Result<SeatReview, sqlx::Error> {
        sqlx::query_as::<_, SeatReview>(
            "INSERT INTO seat_reviews (seat_id, user_id, seat_label, rating, comment)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, seat_id, user_id, seat_label, rating, comment, created_at"
        )
        .bind(seat_id)
        .bind(user_id)
        .bind(seat_label)
        .bind(rating)
        .bind(comment)
        .fetch_one(&db.pool)
        .await
    }

    pub async fn delete(id: i64, db: &Database) -> Result<bool, sqlx::Error> {
        sqlx::query("DELETE FROM seat_reviews WHERE id = $1")
            .bind(id)
            .execute(&db.pool)
            .await
            .map(|r| r.rows_affected() > 0)
    }

    // Закладки пользователя, свежие сверху
    pub async fn bookmarked_by(user_id: i64, db: &Database) -> Result<Vec<SeatReview>, sqlx::Error> {
        sqlx::query_as::<_, SeatReview>(&format!(
            "SELECT {} FROM bookmarks b
             JOIN seat_reviews r ON r.id = b.review_id
             WHERE b.user_id = $1
             ORDER BY b.created_at DESC",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&db.pool)
        .await
    }

    // true, если закладка создана; повторное добавление ничего не меняет
    pub async fn add_bookmark(review_id: i64, user_id: i64, db: &Database) -> Result<bool, sqlx::Error> {
        sqlx::query(
            "INSERT INTO bookmarks (user_id, review_id) VALUES ($1, $2)
             ON CONFLICT (user_id, review_id) DO NOTHING"
        )
        .bind(user_id)
        .bind(review_id)
        .execute(&db.pool)
        .await
        .map(|r| r.rows_affected() > 0)
    }

    pub async fn remove_bookmark(review_id: i64, user_id: i64, db: &Database) -> Result<bool, sqlx::Error> {
        sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND review_id = $2")
            .bind(user_id)
            .bind(review_id)
            .execute(&db.pool)
            .await
            .map(|r| r.rows_affected() > 0)
    }
}
