use redis::AsyncCommands;
use tracing::warn;

use super::CacheService;
use crate::services::scraper::ScrapedTheater;

fn scrape_key(subdivision_id: i32) -> String {
    format!("scrape:subdivision:{}", subdivision_id)
}

impl CacheService {
    pub async fn get_cached_scrape(&self, subdivision_id: i32) -> Option<Vec<ScrapedTheater>> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(scrape_key(subdivision_id)).await.unwrap_or(None);
        data.and_then(|d| serde_json::from_str(&d).ok())
    }

    // Сбор идёт долго (пауза между страницами), поэтому результат держим час
    pub async fn cache_scrape(&self, subdivision_id: i32, theaters: &[ScrapedTheater]) {
        let Ok(data) = serde_json::to_string(theaters) else { return };
        let mut conn = self.redis.conn.clone();
        let result: Result<(), _> = conn.set_ex(scrape_key(subdivision_id), data, self.scrape_ttl_secs).await;
        if let Err(e) = result {
            warn!("Failed to cache scrape result for subdivision {}: {:?}", subdivision_id, e);
        }
    }
}
