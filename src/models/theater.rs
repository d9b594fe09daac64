use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::NaiveDateTime;

use crate::database::Database;

const THEATER_COLUMNS: &str =
    "id, name, address, official_url, subdivision_id, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theater {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub official_url: Option<String>,
    pub subdivision_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Theater {
    pub async fn find(id: i64, db: &Database) -> Result<Option<Theater>, sqlx::Error> {
        sqlx::query_as::<_, Theater>(&format!("SELECT {} FROM theaters WHERE id = $1", THEATER_COLUMNS))
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }

    // Поиск по региону и подстроке названия, оба фильтра необязательны
    pub async fn search(
        subdivision_id: Option<i32>,
        query: Option<&str>,
        db: &Database,
    ) -> Result<Vec<Theater>, sqlx::Error> {
        let pattern = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q.replace('%', "\\%").replace('_', "\\_")));

        sqlx::query_as::<_, Theater>(&format!(
            "SELECT {} FROM theaters
             WHERE ($1::INTEGER IS NULL OR subdivision_id = $1)
               AND ($2::TEXT IS NULL OR name ILIKE $2)
             ORDER BY subdivision_id, name",
            THEATER_COLUMNS
        ))
        .bind(subdivision_id)
        .bind(pattern)
        .fetch_all(&db.pool)
        .await
    }

    pub async fn create(
        name: &str,
        address: &str,
        official_url: Option<&str>,
        subdivision_id: i32,
        db: &Database,
    ) -> Result<Theater, sqlx::Error> {
        sqlx::query_as::<_, Theater>(&format!(
            "INSERT INTO theaters (name, address, official_url, subdivision_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            THEATER_COLUMNS
        ))
        .bind(name)
        .bind(address)
        .bind(official_url)
        .bind(subdivision_id)
        .fetch_one(&db.pool)
        .await
    }

    // Частичное обновление: None оставляет поле как есть.
    // official_url: Some(None) сбрасывает ссылку.
    pub async fn update(
        id: i64,
        name: Option<&str>,
        address: Option<&str>,
        official_url: Option<Option<&str>>,
        db: &Database,
    ) -> Result<Option<Theater>, sqlx::Error> {
        sqlx::query_as::<_, Theater>(&format!(
            "UPDATE theaters SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                official_url = CASE WHEN $4 THEN $5 ELSE official_url END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            THEATER_COLUMNS
        ))
        .bind(id)
        .bind(name)
        .bind(address)
        .bind(official_url.is_some())
        .bind(official_url.flatten())
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn delete(id: i64, db: &Database) -> Result<bool, sqlx::Error> {
        sqlx::query("DELETE FROM theaters WHERE id = $1")
            .bind(id)
            .execute(&db.pool)
            .await
            .map(|r| r.rows_affected() > 0)
    }
}
