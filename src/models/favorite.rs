use serde::Serialize;
use sqlx::FromRow;
use chrono::NaiveDateTime;

use crate::database::Database;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub theater_id: i64,
    pub created_at: NaiveDateTime,
}

impl Favorite {
    pub async fn for_user(user_id: i64, db: &Database) -> Result<Vec<Favorite>, sqlx::Error> {
        sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, theater_id, created_at FROM favorites
             WHERE user_id = $1 ORDER BY created_at DESC"
        )
        .bind(user_id)
        .fetch_all(&db.pool)
        .await
    }

    // Дубликаты не проверяются
    pub async fn add(user_id: i64, theater_id: i64, db: &Database) -> Result<Favorite, sqlx::Error> {
        sqlx::query_as::<_, Favorite>(
            "INSERT INTO favorites (user_id, theater_id) VALUES ($1, $2)
             RETURNING id, user_id, theater_id, created_at"
        )
        .bind(user_id)
        .bind(theater_id)
        .fetch_one(&db.pool)
        .await
    }

    pub async fn remove(user_id: i64, theater_id: i64, db: &Database) -> Result<u64, sqlx::Error> {
        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND theater_id = $2")
            .bind(user_id)
            .bind(theater_id)
            .execute(&db.pool)
            .await
            .map(|r| r.rows_affected())
    }
}
