//! Доступ к хранилищу для ядра: перестройка схемы зала и импорт кинотеатров.
//!
//! Сервисы принимают хранилище как `&impl LayoutStore` / `&impl TheaterStore`,
//! продовая реализация - [`crate::database::Database`] (см. `postgres.rs`).

use async_trait::async_trait;
use thiserror::Error;

use crate::services::layout::{LayoutChange, SeatGrid};

pub mod postgres;
#[cfg(test)]
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Нарушение уникальности превращается в Conflict, остальное - Database.
    pub fn from_write(err: sqlx::Error, what: impl Into<String>) -> Self {
        match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => StoreError::Conflict(what.into()),
            _ => StoreError::Database(err),
        }
    }
}

/// Новый кинотеатр со всеми залами, создаётся одной транзакцией.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTheater {
    pub name: String,
    pub address: String,
    pub official_url: Option<String>,
    pub subdivision_id: i32,
    pub screens: Vec<NewScreen>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewScreen {
    pub name: String,
    /// None - зал без мест (число мест неизвестно).
    pub grid: Option<SeatGrid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedTheater {
    pub theater_id: i64,
    pub screen_count: usize,
}

#[async_trait]
pub trait LayoutStore: Send + Sync {
    /// Атомарно приводит места экрана к сетке, см. [`SeatGrid::plan`].
    /// Параллельные вызовы для одного экрана выполняются по очереди.
    async fn reconcile_layout(&self, screen_id: i64, grid: SeatGrid) -> Result<LayoutChange, StoreError>;
}

#[async_trait]
pub trait TheaterStore: Send + Sync {
    async fn find_theater_id(&self, name: &str, subdivision_id: i32) -> Result<Option<i64>, StoreError>;

    /// Кинотеатр, залы и места - всё или ничего.
    async fn create_theater(&self, theater: &NewTheater) -> Result<CreatedTheater, StoreError>;
}
