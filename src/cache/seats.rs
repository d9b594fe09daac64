use redis::AsyncCommands;
use tracing::{debug, warn};

use super::CacheService;
use crate::models::SeatMapEntry;

fn seat_map_key(screen_id: i64) -> String {
    format!("seats:{}", screen_id)
}

impl CacheService {
    // Схема зала из кеша, None при промахе или ошибке
    pub async fn get_seat_map(&self, screen_id: i64) -> Option<Vec<SeatMapEntry>> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = match conn.get(seat_map_key(screen_id)).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Redis get failed for seat map {}: {:?}", screen_id, e);
                return None;
            }
        };
        data.and_then(|d| serde_json::from_str(&d).ok())
    }

    pub async fn save_seat_map(&self, screen_id: i64, seats: &[SeatMapEntry]) {
        let Ok(data) = serde_json::to_string(seats) else { return };
        let mut conn = self.redis.conn.clone();
        let result: Result<(), _> = conn.set_ex(seat_map_key(screen_id), data, self.seat_map_ttl_secs).await;
        if let Err(e) = result {
            warn!("Redis set failed for seat map {}: {:?}", screen_id, e);
        }
    }

    // Инвалидировать кеш мест после изменения схемы или отзывов
    pub async fn invalidate_seats(&self, screen_id: i64) {
        self.invalidate_screens(&[screen_id]).await;
    }

    /// Сбрасывает схемы нескольких экранов одним DEL, например перед удалением кинотеатра.
    pub async fn invalidate_screens(&self, screen_ids: &[i64]) {
        if screen_ids.is_empty() {
            return;
        }
        let keys: Vec<String> = screen_ids.iter().copied().map(seat_map_key).collect();
        let mut conn = self.redis.conn.clone();
        let result: Result<(), _> = conn.del(keys).await;
        match result {
            Ok(()) => debug!("Invalidated seat map cache for screens {:?}", screen_ids),
            Err(e) => warn!("Redis del failed for seat maps {:?}: {:?}", screen_ids, e),
        }
    }
}
