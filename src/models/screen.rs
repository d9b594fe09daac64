use serde::Serialize;
use sqlx::FromRow;

use crate::database::Database;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: i64,
    pub theater_id: i64,
    pub name: String,
}

impl Screen {
    pub async fn for_theater(theater_id: i64, db: &Database) -> Result<Vec<Screen>, sqlx::Error> {
        sqlx::query_as::<_, Screen>(
            "SELECT id, theater_id, name FROM screens WHERE theater_id = $1 ORDER BY id"
        )
        .bind(theater_id)
        .fetch_all(&db.pool)
        .await
    }

    pub async fn find(id: i64, db: &Database) -> Result<Option<Screen>, sqlx::Error> {
        sqlx::query_as::<_, Screen>("SELECT id, theater_id, name FROM screens WHERE id = $1")
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }

    // Нарушение UNIQUE (theater_id, name) приходит наверх как database error
    pub async fn create(theater_id: i64, name: &str, db: &Database) -> Result<Screen, sqlx::Error> {
        sqlx::query_as::<_, Screen>(
            "INSERT INTO screens (theater_id, name) VALUES ($1, $2) RETURNING id, theater_id, name"
        )
        .bind(theater_id)
        .bind(name)
        .fetch_one(&db.pool)
        .await
    }
}
