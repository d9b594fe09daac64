use crate::redis_client::RedisClient;

pub mod scrape;
pub mod seats;

// Кеш поверх Redis. Ошибки Redis не роняют запросы: промах -> идём в источник.
#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    scrape_ttl_secs: u64,
    seat_map_ttl_secs: u64,
}

impl CacheService {
    pub fn new(redis: RedisClient, config: &crate::config::CacheConfig) -> Self {
        Self {
            redis,
            scrape_ttl_secs: config.scrape_ttl_secs,
            seat_map_ttl_secs: config.seat_map_ttl_secs,
        }
    }
}
