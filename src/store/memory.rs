// Хранилище в памяти для тестов ядра. Запись идёт в копию состояния,
// которая подменяет оригинал только при успехе - так же, как коммит транзакции.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CreatedTheater, LayoutStore, NewTheater, StoreError, TheaterStore};
use crate::models::Seat;
use crate::services::layout::{LayoutChange, SeatCoord, SeatGrid};

#[derive(Debug, Clone, Default)]
struct State {
    next_id: i64,
    theaters: Vec<(i64, String, i32)>,
    screens: Vec<(i64, i64, String)>,
    seats: Vec<Seat>,
    // (id, seat_id, user_id, rating)
    reviews: Vec<(i64, i64, i64, i16)>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_seats(&mut self, screen_id: i64, coords: impl Iterator<Item = SeatCoord>) -> usize {
        let mut added = 0;
        for c in coords {
            let id = self.next_id();
            self.seats.push(Seat {
                id,
                screen_id,
                row_label: c.row.to_string(),
                col_number: c.column as i32,
            });
            added += 1;
        }
        added
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_next_write: AtomicBool,
    fail_theater_named: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_screen(&self, theater_id: i64, name: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.screens.push((id, theater_id, name.to_string()));
        id
    }

    pub fn add_review(&self, seat_id: i64, user_id: i64, rating: i16) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.reviews.push((id, seat_id, user_id, rating));
        id
    }

    /// Следующая запись упадёт посередине, после частичных изменений.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Создание кинотеатра с таким названием упадёт после вставки залов.
    pub fn fail_theater(&self, name: &str) {
        *self.fail_theater_named.lock().unwrap() = Some(name.to_string());
    }

    pub fn seats(&self, screen_id: i64) -> Vec<Seat> {
        let state = self.state.lock().unwrap();
        state.seats.iter().filter(|s| s.screen_id == screen_id).cloned().collect()
    }

    pub fn seat_at(&self, screen_id: i64, row: &str, col: i32) -> Option<Seat> {
        self.seats(screen_id)
            .into_iter()
            .find(|s| s.row_label == row && s.col_number == col)
    }

    pub fn reviews_for(&self, seat_id: i64) -> Vec<i64> {
        let state = self.state.lock().unwrap();
        state.reviews.iter().filter(|r| r.1 == seat_id).map(|r| r.0).collect()
    }

    pub fn theater_count(&self) -> usize {
        self.state.lock().unwrap().theaters.len()
    }

    pub fn screens_of(&self, theater_id: i64) -> Vec<(i64, String)> {
        let state = self.state.lock().unwrap();
        state
            .screens
            .iter()
            .filter(|s| s.1 == theater_id)
            .map(|s| (s.0, s.2.clone()))
            .collect()
    }

    fn simulated_failure() -> StoreError {
        StoreError::Database(sqlx::Error::Protocol("simulated write failure".to_string()))
    }
}

#[async_trait]
impl LayoutStore for MemoryStore {
    async fn reconcile_layout(&self, screen_id: i64, grid: SeatGrid) -> Result<LayoutChange, StoreError> {
        let mut guard = self.state.lock().unwrap();
        if !guard.screens.iter().any(|s| s.0 == screen_id) {
            return Err(StoreError::NotFound(format!("screen {}", screen_id)));
        }

        let mut next = guard.clone();
        let current: Vec<Seat> = next.seats.iter().filter(|s| s.screen_id == screen_id).cloned().collect();
        let plan = grid.plan(&current);

        let reviews_before = next.reviews.len();
        next.reviews.retain(|r| !plan.remove.contains(&r.1));
        let reviews_removed = reviews_before - next.reviews.len();

        let seats_before = next.seats.len();
        next.seats.retain(|s| !plan.remove.contains(&s.id));
        let seats_removed = seats_before - next.seats.len();

        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(Self::simulated_failure());
        }

        let seats_added = next.insert_seats(screen_id, plan.add.into_iter());
        *guard = next;

        Ok(LayoutChange { seats_added, seats_removed, reviews_removed })
    }
}

#[async_trait]
impl TheaterStore for MemoryStore {
    async fn find_theater_id(&self, name: &str, subdivision_id: i32) -> Result<Option<i64>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .theaters
            .iter()
            .find(|t| t.1 == name && t.2 == subdivision_id)
            .map(|t| t.0))
    }

    async fn create_theater(&self, theater: &NewTheater) -> Result<CreatedTheater, StoreError> {
        let mut guard = self.state.lock().unwrap();
        if guard.theaters.iter().any(|t| t.1 == theater.name && t.2 == theater.subdivision_id) {
            return Err(StoreError::Conflict(format!("theater '{}'", theater.name)));
        }

        let mut next = guard.clone();
        let theater_id = next.next_id();
        next.theaters.push((theater_id, theater.name.clone(), theater.subdivision_id));

        for screen in &theater.screens {
            if next.screens.iter().any(|s| s.1 == theater_id && s.2 == screen.name) {
                return Err(StoreError::Conflict(format!("screen '{}'", screen.name)));
            }
            let screen_id = next.next_id();
            next.screens.push((screen_id, theater_id, screen.name.clone()));
            if let Some(grid) = screen.grid {
                next.insert_seats(screen_id, grid.coords());
            }
        }

        let should_fail = self.fail_theater_named.lock().unwrap().as_deref() == Some(theater.name.as_str());
        if should_fail || self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(Self::simulated_failure());
        }

        *guard = next;
        Ok(CreatedTheater { theater_id, screen_count: theater.screens.len() })
    }
}
