//! layout.rs
//!
//! Схема зала: координаты мест и приведение набора мест экрана к прямоугольной сетке.
//!
//! Ключевые компоненты:
//! 1.  **RowLabel / SeatCoord**: ряд обозначается заглавной буквой `A`..`Z`, номер
//!     места в ряду - положительное число. Тип ряда физически не может выйти за `Z`,
//!     поэтому сетка больше 26 рядов не строится вообще.
//! 2.  **SeatGrid**: целевые размеры сетки (ряды x места). Создаётся только через
//!     проверяющие конструкторы: `SeatGrid::new` для ручного ввода и
//!     `SeatGrid::estimate` для оценки по общему числу мест при импорте.
//! 3.  **LayoutPlan**: разница между текущими местами экрана и сеткой - какие места
//!     удалить (вместе с отзывами), какие добавить. Места, попадающие в сетку,
//!     не трогаются и сохраняют свой id, а значит и историю отзывов.
//! 4.  **reconcile**: применяет план одной транзакцией через `LayoutStore`.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::models::Seat;
use crate::store::{LayoutStore, StoreError};

/// Потолок схемы обозначений: буквы `A`..`Z`.
pub const MAX_ROWS: u32 = 26;

/// Верхняя граница числа мест в ряду.
pub const MAX_COLUMNS: u32 = 200;

/// Больше мест в один экран не помещается: 26 рядов по 200.
pub const MAX_SEAT_COUNT: u32 = MAX_ROWS * MAX_COLUMNS;

/// Отношение ширины к высоте при оценке сетки по числу мест.
const ESTIMATE_ASPECT_RATIO: f64 = 1.5;

/// Ошибки построения сетки.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("rows must be between 1 and 26, got {0}")]
    RowsOutOfRange(i64),
    #[error("columns must be between 1 and 200, got {0}")]
    ColumnsOutOfRange(i64),
}

/// Буква ряда, хранится как смещение от `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowLabel(u8);

impl RowLabel {
    pub fn from_offset(offset: u32) -> Option<Self> {
        (offset < MAX_ROWS).then(|| RowLabel(offset as u8))
    }

    /// Разбирает подпись ряда из БД. Всё, кроме одной буквы `A`..`Z`, - None.
    pub fn parse(label: &str) -> Option<Self> {
        let mut chars = label.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Some(RowLabel(c as u8 - b'A')),
            _ => None,
        }
    }

    pub fn offset(self) -> u32 {
        self.0 as u32
    }

    pub fn as_char(self) -> char {
        (b'A' + self.0) as char
    }
}

impl fmt::Display for RowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Координата места внутри экрана.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeatCoord {
    pub row: RowLabel,
    pub column: u32,
}

impl SeatCoord {
    pub fn of_seat(seat: &Seat) -> Option<Self> {
        let row = RowLabel::parse(&seat.row_label)?;
        let column = u32::try_from(seat.col_number).ok().filter(|c| *c >= 1)?;
        Some(SeatCoord { row, column })
    }
}

impl fmt::Display for SeatCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.column)
    }
}

/// Прямоугольная сетка мест: `rows` рядов по `columns` мест.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatGrid {
    rows: u32,
    columns: u32,
}

impl SeatGrid {
    pub fn new(rows: i64, columns: i64) -> Result<Self, LayoutError> {
        if rows < 1 || rows > MAX_ROWS as i64 {
            return Err(LayoutError::RowsOutOfRange(rows));
        }
        if columns < 1 || columns > MAX_COLUMNS as i64 {
            return Err(LayoutError::ColumnsOutOfRange(columns));
        }
        Ok(SeatGrid { rows: rows as u32, columns: columns as u32 })
    }

    /// Оценка сетки по общему числу мест при соотношении сторон 1.5:1.
    ///
    /// `rows = round(sqrt(count / 1.5))`, `columns = round(count / rows)`, оба не меньше 1.
    /// Ряды упираются в [`MAX_ROWS`], тогда места в ряду пересчитываются от 26 рядов,
    /// а сами места в ряду упираются в [`MAX_COLUMNS`]. Для нуля мест сетки нет.
    pub fn estimate(seat_count: u32) -> Option<Self> {
        if seat_count == 0 {
            return None;
        }
        let count = seat_count as f64;
        let rows = ((count / ESTIMATE_ASPECT_RATIO).sqrt().round() as u32).clamp(1, MAX_ROWS);
        let columns = ((count / rows as f64).round() as u32).clamp(1, MAX_COLUMNS);
        Some(SeatGrid { rows, columns })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn contains(&self, coord: SeatCoord) -> bool {
        coord.row.offset() < self.rows && coord.column >= 1 && coord.column <= self.columns
    }

    /// Все координаты сетки: ряд за рядом, внутри ряда по возрастанию номера.
    pub fn coords(&self) -> impl Iterator<Item = SeatCoord> + '_ {
        (0..self.rows)
            .filter_map(RowLabel::from_offset)
            .flat_map(move |row| (1..=self.columns).map(move |column| SeatCoord { row, column }))
    }

    /// Сравнивает текущие места экрана с сеткой.
    ///
    /// Удаляются места вне сетки, места с неразборчивой подписью и повторы
    /// одной координаты (остаётся первое). Добавляются недостающие координаты.
    pub fn plan(&self, current: &[Seat]) -> LayoutPlan {
        let mut kept = HashSet::with_capacity(current.len());
        let mut remove = Vec::new();

        for seat in current {
            match SeatCoord::of_seat(seat) {
                Some(coord) if self.contains(coord) && kept.insert(coord) => {}
                _ => remove.push(seat.id),
            }
        }

        let add = self.coords().filter(|c| !kept.contains(c)).collect();
        LayoutPlan { remove, add }
    }
}

/// Что нужно сделать с местами экрана, чтобы он совпал с сеткой.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutPlan {
    /// id мест к удалению; отзывы на них удаляются первыми.
    pub remove: Vec<i64>,
    pub add: Vec<SeatCoord>,
}

impl LayoutPlan {
    pub fn is_noop(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

/// Итог применения плана.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutChange {
    pub seats_added: usize,
    pub seats_removed: usize,
    pub reviews_removed: usize,
}

/// Проверенная команда на перестройку схемы экрана.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileCommand {
    pub screen_id: i64,
    pub grid: SeatGrid,
}

/// Приводит места экрана к сетке одной транзакцией.
///
/// Чтение текущих мест, удаление (отзывы, затем места) и вставка выполняются
/// хранилищем атомарно и под блокировкой экрана; при ошибке схема остаётся прежней.
/// Повторный вызов с теми же размерами ничего не меняет.
pub async fn reconcile<S>(store: &S, cmd: ReconcileCommand) -> Result<LayoutChange, StoreError>
where
    S: LayoutStore + ?Sized,
{
    let change = store.reconcile_layout(cmd.screen_id, cmd.grid).await?;

    info!(
        screen_id = cmd.screen_id,
        rows = cmd.grid.rows(),
        columns = cmd.grid.columns(),
        added = change.seats_added,
        removed = change.seats_removed,
        reviews_removed = change.reviews_removed,
        "Seat layout reconciled"
    );

    Ok(change)
}
