use serde::Serialize;
use sqlx::FromRow;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl User {
    // Найти пользователя по id из identity-провайдера
    pub async fn find_by_external_id(external_id: &str, db: &crate::database::Database) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, external_id, name, created_at FROM users WHERE external_id = $1"
        )
        .bind(external_id)
        .fetch_optional(&db.pool)
        .await
    }
}
