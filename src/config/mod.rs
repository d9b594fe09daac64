use serde::Deserialize;
use std::env;
use std::str::FromStr;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub scraper: ScraperConfig,
    pub cache: CacheConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Настройки скрапера кинотеатров
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Корень сайта-источника, без завершающего слэша.
    pub base_url: String,
    /// Пауза между запросами к страницам кинотеатров.
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

// TTL кешей в Redis
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub scrape_ttl_secs: u64,
    pub seat_map_ttl_secs: u64,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: FromStr>(key: &str, default: &str) -> T {
    var_or(key, default)
        .parse()
        .unwrap_or_else(|_| panic!("{} must be a valid number", key))
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parsed_or("PORT", "8000"),
                environment: var_or("ENVIRONMENT", "development"),
                rust_log: var_or("RUST_LOG", "cinema_seats=debug,tower_http=debug"),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: parsed_or("DB_POOL_SIZE", "20"),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").expect("REDIS_URL must be set"),
            },
            scraper: ScraperConfig {
                base_url: var_or("SCRAPER_BASE_URL", "https://eiga.com")
                    .trim_end_matches('/')
                    .to_string(),
                request_delay_ms: parsed_or("SCRAPER_REQUEST_DELAY_MS", "1000"),
                timeout_secs: parsed_or("SCRAPER_TIMEOUT_SECS", "15"),
                user_agent: var_or(
                    "SCRAPER_USER_AGENT",
                    "Mozilla/5.0 (compatible; cinema-seats-bot/0.1)",
                ),
            },
            cache: CacheConfig {
                scrape_ttl_secs: parsed_or("SCRAPE_CACHE_TTL_SECS", "3600"),
                seat_map_ttl_secs: parsed_or("SEAT_MAP_CACHE_TTL_SECS", "86400"),
            },
        }
    }
}

impl ScraperConfig {
    /// Конфиг для тестов: без задержки, другой origin.
    pub fn for_origin(base_url: &str) -> Self {
        ScraperConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_delay_ms: 0,
            timeout_secs: 5,
            user_agent: "cinema-seats-test".to_string(),
        }
    }
}
