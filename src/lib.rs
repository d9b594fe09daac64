pub mod config;
pub mod database;
pub mod redis_client;
pub mod error;
pub mod models;
pub mod store;
pub mod controllers;
pub mod middleware;
pub mod cache;
pub mod services;

use std::sync::Arc;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub redis: redis_client::RedisClient,
    pub cache: cache::CacheService,
    pub config: config::Config,
    pub scraper: services::scraper::TheaterScraper,
}

impl AppState {
    // Подключения создаются здесь, закрываются в main после остановки сервера
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;
        tracing::info!("Database connected");

        db.run_migrations().await?;

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        let cache = cache::CacheService::new(redis.clone(), &config.cache);
        let scraper = services::scraper::TheaterScraper::new(&config.scraper)?;

        Ok(Arc::new(Self {
            db,
            redis,
            cache,
            config,
            scraper,
        }))
    }
}
