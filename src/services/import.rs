//! Импорт выбранных оператором кандидатов в справочник кинотеатров.
//!
//! Каждый кандидат обрабатывается независимо: существующий (название + регион)
//! пропускается, новый создаётся одной транзакцией вместе с залами и местами.
//! Ошибка одного кандидата откатывает только его и попадает в отчёт как `failed`.

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use validator::Validate;

use crate::models::not_blank;
use crate::services::layout::SeatGrid;
use crate::store::{NewScreen, NewTheater, StoreError, TheaterStore};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImportScreen {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    // Не больше, чем помещается в сетку 26 x 200
    #[serde(default)]
    #[validate(range(max = 5200))]
    pub seat_count: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImportTheater {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(min = 1, max = 300), custom(function = "not_blank"))]
    pub address: String,
    #[validate(url)]
    pub official_url: Option<String>,
    pub subdivision_id: i32,
    #[serde(default)]
    #[validate(nested)]
    pub screens: Vec<ImportScreen>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Created,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub name: String,
    pub subdivision_id: i32,
    pub status: ImportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theater_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportResult {
    fn new(name: &str, subdivision_id: i32, status: ImportStatus) -> Self {
        Self {
            name: name.to_string(),
            subdivision_id,
            status,
            theater_id: None,
            screen_count: None,
            error: None,
        }
    }
}

impl From<&ImportTheater> for NewTheater {
    fn from(candidate: &ImportTheater) -> Self {
        NewTheater {
            name: candidate.name.trim().to_string(),
            address: candidate.address.trim().to_string(),
            official_url: candidate.official_url.clone(),
            subdivision_id: candidate.subdivision_id,
            screens: candidate
                .screens
                .iter()
                .map(|s| NewScreen {
                    name: s.name.trim().to_string(),
                    grid: SeatGrid::estimate(s.seat_count),
                })
                .collect(),
        }
    }
}

async fn import_one<S>(store: &S, candidate: &ImportTheater) -> Result<ImportResult, StoreError>
where
    S: TheaterStore + ?Sized,
{
    let new_theater = NewTheater::from(candidate);

    if store
        .find_theater_id(&new_theater.name, new_theater.subdivision_id)
        .await?
        .is_some()
    {
        info!("Theater '{}' already exists in subdivision {}, skipped", new_theater.name, new_theater.subdivision_id);
        return Ok(ImportResult::new(&new_theater.name, new_theater.subdivision_id, ImportStatus::Skipped));
    }

    let created = match store.create_theater(&new_theater).await {
        Ok(created) => created,
        // Кто-то успел создать тот же кинотеатр между проверкой и вставкой
        Err(StoreError::Conflict(what)) if what.starts_with("theater") => {
            return Ok(ImportResult::new(&new_theater.name, new_theater.subdivision_id, ImportStatus::Skipped));
        }
        Err(e) => return Err(e),
    };

    info!(
        "Imported theater '{}' (id={}) with {} screens",
        new_theater.name, created.theater_id, created.screen_count
    );

    Ok(ImportResult {
        theater_id: Some(created.theater_id),
        screen_count: Some(created.screen_count),
        ..ImportResult::new(&new_theater.name, new_theater.subdivision_id, ImportStatus::Created)
    })
}

/// Импортирует кандидатов по порядку и возвращает итог по каждому.
pub async fn import_theaters<S>(store: &S, candidates: &[ImportTheater]) -> Vec<ImportResult>
where
    S: TheaterStore + ?Sized,
{
    let mut results = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let result = match import_one(store, candidate).await {
            Ok(result) => result,
            Err(e) => {
                error!("Failed to import theater '{}': {:?}", candidate.name, e);
                ImportResult {
                    error: Some(match e {
                        StoreError::Conflict(what) => format!("conflict: {}", what),
                        _ => "internal error".to_string(),
                    }),
                    ..ImportResult::new(candidate.name.trim(), candidate.subdivision_id, ImportStatus::Failed)
                }
            }
        };
        results.push(result);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn candidate(name: &str, subdivision_id: i32, screens: &[(&str, u32)]) -> ImportTheater {
        ImportTheater {
            name: name.to_string(),
            address: "東京都千代田区有楽町1-1-2".to_string(),
            official_url: None,
            subdivision_id,
            screens: screens
                .iter()
                .map(|(n, c)| ImportScreen { name: n.to_string(), seat_count: *c })
                .collect(),
        }
    }

    #[tokio::test]
    async fn same_theater_twice_is_created_then_skipped() {
        let store = MemoryStore::new();
        let c = candidate("シネマA", 13, &[("スクリーン1", 100)]);

        let results = import_theaters(&store, &[c.clone(), c]).await;
        assert_eq!(results[0].status, ImportStatus::Created);
        assert_eq!(results[0].screen_count, Some(1));
        assert_eq!(results[1].status, ImportStatus::Skipped);
        assert_eq!(results[1].theater_id, None);
        assert_eq!(store.theater_count(), 1);
    }

    #[tokio::test]
    async fn same_name_in_other_subdivision_is_a_new_theater() {
        let store = MemoryStore::new();
        let results = import_theaters(
            &store,
            &[candidate("シネマA", 13, &[]), candidate("シネマA", 14, &[])],
        )
        .await;
        assert!(results.iter().all(|r| r.status == ImportStatus::Created));
        assert_eq!(store.theater_count(), 2);
    }

    #[tokio::test]
    async fn screens_get_estimated_seat_grids() {
        let store = MemoryStore::new();
        let results = import_theaters(
            &store,
            &[candidate("シネマB", 13, &[("スクリーン1", 100), ("スクリーン2", 0)])],
        )
        .await;
        let theater_id = results[0].theater_id.unwrap();

        let screens = store.screens_of(theater_id);
        assert_eq!(screens.len(), 2);
        // 100 мест -> 8 рядов по 13
        assert_eq!(store.seats(screens[0].0).len(), 8 * 13);
        assert!(store.seat_at(screens[0].0, "H", 13).is_some());
        assert!(store.seats(screens[1].0).is_empty());
    }

    #[tokio::test]
    async fn failure_is_isolated_to_its_candidate() {
        let store = MemoryStore::new();
        store.fail_theater("壊れたシネマ");

        let results = import_theaters(
            &store,
            &[
                candidate("シネマA", 13, &[("スクリーン1", 50)]),
                candidate("壊れたシネマ", 13, &[("スクリーン1", 50)]),
                candidate("シネマC", 13, &[]),
            ],
        )
        .await;

        let statuses: Vec<ImportStatus> = results.iter().map(|r| r.status).collect();
        assert_eq!(statuses, [ImportStatus::Created, ImportStatus::Failed, ImportStatus::Created]);
        assert_eq!(results[1].error.as_deref(), Some("internal error"));
        assert_eq!(store.theater_count(), 2);
    }

    #[tokio::test]
    async fn duplicate_screen_names_fail_the_whole_candidate() {
        let store = MemoryStore::new();
        let results = import_theaters(
            &store,
            &[candidate("シネマD", 13, &[("スクリーン1", 10), ("スクリーン1", 20)])],
        )
        .await;
        assert_eq!(results[0].status, ImportStatus::Failed);
        assert_eq!(results[0].error.as_deref(), Some("conflict: screen 'スクリーン1'"));
        assert_eq!(store.theater_count(), 0);
    }

    #[test]
    fn validation_rejects_blank_names_and_bad_urls() {
        let mut c = candidate("", 13, &[]);
        assert!(c.validate().is_err());

        c.name = "シネマE".into();
        c.official_url = Some("not a url".into());
        assert!(c.validate().is_err());

        c.official_url = Some("https://cinema-e.test/".into());
        c.screens = vec![ImportScreen { name: String::new(), seat_count: 10 }];
        assert!(c.validate().is_err());

        c.screens[0].name = "スクリーン1".into();
        assert!(c.validate().is_ok());

        c.screens[0].seat_count = 5201;
        assert!(c.validate().is_err());
    }

    #[test]
    fn whitespace_only_fields_are_blank() {
        let mut c = candidate("   ", 13, &[]);
        assert!(c.validate().is_err());

        c.name = "シネマF".into();
        c.address = " \t ".into();
        assert!(c.validate().is_err());

        c.address = "東京都港区六本木6-10-2".into();
        c.screens = vec![ImportScreen { name: "  ".into(), seat_count: 10 }];
        assert!(c.validate().is_err());
    }

    #[tokio::test]
    async fn results_report_the_stored_name() {
        let store = MemoryStore::new();
        let results = import_theaters(
            &store,
            &[candidate("  シネマG ", 13, &[]), candidate("シネマG", 13, &[])],
        )
        .await;

        assert_eq!(results[0].name, "シネマG");
        assert_eq!(results[0].status, ImportStatus::Created);
        assert_eq!(results[1].name, "シネマG");
        assert_eq!(results[1].status, ImportStatus::Skipped);
    }
}
