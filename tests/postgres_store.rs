//! Транзакции хранилища на живом Postgres.
//!
//! Запуск: `DATABASE_URL=postgres://... cargo test -- --ignored`.

use cinema_seats::database::Database;
use cinema_seats::services::layout::{self, LayoutChange, ReconcileCommand, SeatGrid};
use cinema_seats::store::{NewScreen, NewTheater, StoreError, TheaterStore};
use sqlx::PgPool;

async fn seed_screen(pool: &PgPool) -> i64 {
    sqlx::query("INSERT INTO subdivisions (id, name) VALUES (13, '東京都') ON CONFLICT DO NOTHING")
        .execute(pool)
        .await
        .unwrap();
    let theater_id: i64 = sqlx::query_scalar(
        "INSERT INTO theaters (name, address, subdivision_id) VALUES ('シネマA', '新宿', 13) RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query_scalar("INSERT INTO screens (theater_id, name) VALUES ($1, 'Screen 1') RETURNING id")
        .bind(theater_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn seat_id(pool: &PgPool, screen_id: i64, row: &str, col: i32) -> Option<i64> {
    sqlx::query_scalar("SELECT id FROM seats WHERE screen_id = $1 AND row_label = $2 AND col_number = $3")
        .bind(screen_id)
        .bind(row)
        .bind(col)
        .fetch_optional(pool)
        .await
        .unwrap()
}

async fn review(pool: &PgPool, seat_id: i64, user: &str) -> i64 {
    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (external_id) VALUES ($1)
         ON CONFLICT (external_id) DO UPDATE SET name = users.name RETURNING id",
    )
    .bind(user)
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query_scalar(
        "INSERT INTO seat_reviews (seat_id, user_id, seat_label, rating) VALUES ($1, $2, 'x', 4) RETURNING id",
    )
    .bind(seat_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn cmd(screen_id: i64, rows: i64, columns: i64) -> ReconcileCommand {
    ReconcileCommand { screen_id, grid: SeatGrid::new(rows, columns).unwrap() }
}

#[sqlx::test(migrations = "./src/migrations")]
#[ignore = "needs DATABASE_URL"]
async fn reconcile_shrinks_with_review_cascade_and_keeps_survivors(pool: PgPool) {
    let db = Database { pool: pool.clone() };
    let screen = seed_screen(&pool).await;

    let change = layout::reconcile(&db, cmd(screen, 6, 5)).await.unwrap();
    assert_eq!(change.seats_added, 30);

    let a1 = seat_id(&pool, screen, "A", 1).await.unwrap();
    let f1 = seat_id(&pool, screen, "F", 1).await.unwrap();
    review(&pool, f1, "u1").await;
    review(&pool, f1, "u2").await;
    let kept_review = review(&pool, a1, "u1").await;

    let change = layout::reconcile(&db, cmd(screen, 5, 5)).await.unwrap();
    assert_eq!(change, LayoutChange { seats_added: 0, seats_removed: 5, reviews_removed: 2 });

    assert_eq!(seat_id(&pool, screen, "A", 1).await, Some(a1));
    assert!(seat_id(&pool, screen, "F", 1).await.is_none());
    let left: Vec<i64> = sqlx::query_scalar("SELECT id FROM seat_reviews").fetch_all(&pool).await.unwrap();
    assert_eq!(left, vec![kept_review]);

    let again = layout::reconcile(&db, cmd(screen, 5, 5)).await.unwrap();
    assert_eq!(again, LayoutChange::default());
}

#[sqlx::test(migrations = "./src/migrations")]
#[ignore = "needs DATABASE_URL"]
async fn reconcile_unknown_screen_writes_nothing(pool: PgPool) {
    let db = Database { pool: pool.clone() };
    let err = layout::reconcile(&db, cmd(9999, 2, 2)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let seats: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seats").fetch_one(&pool).await.unwrap();
    assert_eq!(seats, 0);
}

#[sqlx::test(migrations = "./src/migrations")]
#[ignore = "needs DATABASE_URL"]
async fn create_theater_rolls_back_on_duplicate_screen(pool: PgPool) {
    sqlx::query("INSERT INTO subdivisions (id, name) VALUES (13, '東京都')")
        .execute(&pool)
        .await
        .unwrap();
    let db = Database { pool: pool.clone() };

    let theater = |screens: Vec<NewScreen>| NewTheater {
        name: "シネマB".to_string(),
        address: "六本木".to_string(),
        official_url: None,
        subdivision_id: 13,
        screens,
    };
    let screen = |name: &str, count: u32| NewScreen { name: name.to_string(), grid: SeatGrid::estimate(count) };

    let err = db
        .create_theater(&theater(vec![screen("スクリーン1", 100), screen("スクリーン1", 50)]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(db.find_theater_id("シネマB", 13).await.unwrap(), None);

    let created = db.create_theater(&theater(vec![screen("スクリーン1", 100)])).await.unwrap();
    assert_eq!(created.screen_count, 1);
    let seats: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seats").fetch_one(&pool).await.unwrap();
    assert_eq!(seats, 8 * 13);
}
