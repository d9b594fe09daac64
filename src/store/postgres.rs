use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use super::{CreatedTheater, LayoutStore, NewTheater, StoreError, TheaterStore};
use crate::database::Database;
use crate::models::Seat;
use crate::services::layout::{LayoutChange, SeatCoord, SeatGrid};

// Вставка пачки мест одним запросом через UNNEST
async fn insert_seats(
    tx: &mut Transaction<'_, Postgres>,
    screen_id: i64,
    coords: &[SeatCoord],
) -> Result<usize, sqlx::Error> {
    if coords.is_empty() {
        return Ok(0);
    }
    let (rows, cols): (Vec<String>, Vec<i32>) = coords
        .iter()
        .map(|c| (c.row.to_string(), c.column as i32))
        .unzip();

    let result = sqlx::query(
        r#"
        INSERT INTO seats (screen_id, row_label, col_number)
        SELECT $1, r, c FROM UNNEST($2::VARCHAR[], $3::INTEGER[]) AS t(r, c)
        "#
    )
    .bind(screen_id)
    .bind(&rows)
    .bind(&cols)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() as usize)
}

#[async_trait]
impl LayoutStore for Database {
    async fn reconcile_layout(&self, screen_id: i64, grid: SeatGrid) -> Result<LayoutChange, StoreError> {
        let mut tx = self.pool.begin().await?;

        // 1) Блокируем строку экрана: второй reconcile по тому же экрану ждёт коммита
        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM screens WHERE id = $1 FOR UPDATE")
            .bind(screen_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound(format!("screen {}", screen_id)));
        }

        // 2) Текущие места и план
        let current = sqlx::query_as::<_, Seat>(
            "SELECT id, screen_id, row_label, col_number FROM seats WHERE screen_id = $1 ORDER BY id"
        )
        .bind(screen_id)
        .fetch_all(&mut *tx)
        .await?;

        let plan = grid.plan(&current);
        if plan.is_noop() {
            tx.commit().await?;
            return Ok(LayoutChange::default());
        }

        // 3) Сначала отзывы, потом сами места
        let mut change = LayoutChange::default();
        if !plan.remove.is_empty() {
            change.reviews_removed = sqlx::query("DELETE FROM seat_reviews WHERE seat_id = ANY($1)")
                .bind(&plan.remove)
                .execute(&mut *tx)
                .await?
                .rows_affected() as usize;

            change.seats_removed = sqlx::query("DELETE FROM seats WHERE id = ANY($1)")
                .bind(&plan.remove)
                .execute(&mut *tx)
                .await?
                .rows_affected() as usize;
        }

        // 4) Недостающие места
        change.seats_added = insert_seats(&mut tx, screen_id, &plan.add).await?;

        tx.commit().await?;
        Ok(change)
    }
}

#[async_trait]
impl TheaterStore for Database {
    async fn find_theater_id(&self, name: &str, subdivision_id: i32) -> Result<Option<i64>, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM theaters WHERE name = $1 AND subdivision_id = $2"
        )
        .bind(name)
        .bind(subdivision_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn create_theater(&self, theater: &NewTheater) -> Result<CreatedTheater, StoreError> {
        let mut tx = self.pool.begin().await?;

        let theater_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO theaters (name, address, official_url, subdivision_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id"
        )
        .bind(&theater.name)
        .bind(&theater.address)
        .bind(&theater.official_url)
        .bind(theater.subdivision_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::from_write(e, format!("theater '{}'", theater.name)))?;

        for screen in &theater.screens {
            let screen_id = sqlx::query_scalar::<_, i64>(
                "INSERT INTO screens (theater_id, name) VALUES ($1, $2) RETURNING id"
            )
            .bind(theater_id)
            .bind(&screen.name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, format!("screen '{}'", screen.name)))?;

            if let Some(grid) = screen.grid {
                let coords: Vec<SeatCoord> = grid.coords().collect();
                insert_seats(&mut tx, screen_id, &coords).await?;
            }
        }

        // Если что-то выше упало, tx откатывается при drop
        tx.commit().await?;

        Ok(CreatedTheater { theater_id, screen_count: theater.screens.len() })
    }
}
