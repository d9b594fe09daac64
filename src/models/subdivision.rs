use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subdivision {
    pub id: i32,
    pub name: String,
}

impl Subdivision {
    pub async fn all(db: &crate::database::Database) -> Result<Vec<Subdivision>, sqlx::Error> {
        sqlx::query_as::<_, Subdivision>("SELECT id, name FROM subdivisions ORDER BY id")
            .fetch_all(&db.pool)
            .await
    }

    pub async fn exists(id: i32, db: &crate::database::Database) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM subdivisions WHERE id = $1)")
            .bind(id)
            .fetch_one(&db.pool)
            .await
    }
}
