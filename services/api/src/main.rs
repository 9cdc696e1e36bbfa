use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::{
    AppState,
    assets::{AssetStore, NoopAssetStore, S3AssetStore},
    config::AppConfig,
    create_router,
    engine::SuggestionCache,
    middleware::JwtVerifier,
    repositories::{Repositories, run_migrations},
};
use aws_config::BehaviorVersion;
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};

async fn suggestion_cache(config: &AppConfig) -> Option<SuggestionCache> {
    let url = config.redis_url.as_ref()?;
    let redis_config = RedisConfig {
        url: url.clone(),
        ..RedisConfig::from_env()
    };
    let redis = match RedisPool::new(&redis_config) {
        Ok(redis) => redis,
        Err(e) => {
            warn!("Redis unavailable, suggestions will not be cached: {}", e);
            return None;
        }
    };

    match redis.health_check().await {
        Ok(true) => {
            info!("Suggestion cache enabled");
            Some(SuggestionCache::new(redis, config.suggestion_cache_ttl))
        }
        Ok(false) | Err(_) => {
            warn!("Redis health check failed, suggestions will not be cached");
            None
        }
    }
}

async fn asset_store(config: &AppConfig) -> Arc<dyn AssetStore> {
    match &config.asset_bucket {
        Some(bucket) => {
            let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
            let s3_client = aws_sdk_s3::Client::new(&aws_config);
            info!("Project assets stored in bucket {}", bucket);
            Arc::new(S3AssetStore::new(s3_client, bucket.clone()))
        }
        None => {
            warn!("APP_ASSET_BUCKET not set, project assets will not be destroyed");
            Arc::new(NoopAssetStore)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let config = AppConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;
    info!("Database migrations applied");

    let jwt = JwtVerifier::from_config(&config)?;
    if jwt.is_none() {
        warn!("No JWT key configured, every request is anonymous");
    }

    let app_state = AppState::new(
        &config,
        Repositories::postgres(pool),
        asset_store(&config).await,
        suggestion_cache(&config).await,
        jwt,
    );

    // Start the web server
    let app = create_router(app_state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
