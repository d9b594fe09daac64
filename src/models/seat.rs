use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Database;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: i64,
    pub screen_id: i64,
    pub row_label: String,
    pub col_number: i32,
}

impl Seat {
    /// Подпись места в отзывах, например `C-7`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.row_label, self.col_number)
    }

    pub async fn find(id: i64, db: &Database) -> Result<Option<Seat>, sqlx::Error> {
        sqlx::query_as::<_, Seat>(
            "SELECT id, screen_id, row_label, col_number FROM seats WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&db.pool)
        .await
    }
}

/// Место на схеме зала вместе с агрегатами по отзывам.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMapEntry {
    pub id: i64,
    pub row_label: String,
    pub col_number: i32,
    pub review_count: i64,
    pub average_rating: Option<f64>,
}

impl SeatMapEntry {
    pub async fn for_screen(screen_id: i64, db: &Database) -> Result<Vec<SeatMapEntry>, sqlx::Error> {
        sqlx::query_as::<_, SeatMapEntry>(
            r#"
            SELECT s.id, s.row_label, s.col_number,
                   COUNT(r.id) AS review_count,
                   AVG(r.rating)::FLOAT8 AS average_rating
            FROM seats s
            LEFT JOIN seat_reviews r ON r.seat_id = s.id
            WHERE s.screen_id = $1
            GROUP BY s.id
            ORDER BY s.row_label, s.col_number
            "#
        )
        .bind(screen_id)
        .fetch_all(&db.pool)
        .await
    }
}
