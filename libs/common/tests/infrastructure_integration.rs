//! Checks against live PostgreSQL and Redis instances

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    // Project search relies on the built-in `simple` text search configuration
    let row = sqlx::query(
        "SELECT to_tsvector('simple', 'Map Club') @@ to_tsquery('simple', 'club | rocket') AS matched",
    )
    .fetch_one(&pool)
    .await?;

    let matched: bool = row.get("matched");
    assert!(matched, "Text search configuration 'simple' is unavailable");

    let redis_pool = RedisPool::new(&RedisConfig::from_env())?;
    assert!(
        redis_pool.health_check().await?,
        "Redis health check failed"
    );

    let key = "integration_test_key";
    redis_pool
        .set_json(key, &serde_json::json!({ "words": ["lead"] }), Some(10))
        .await?;

    let cached: Option<serde_json::Value> = redis_pool.get_json(key).await?;
    assert_eq!(cached, Some(serde_json::json!({ "words": ["lead"] })));

    redis_pool.delete(key).await?;
    let cached: Option<serde_json::Value> = redis_pool.get_json(key).await?;
    assert_eq!(cached, None, "Redis delete operation failed");

    Ok(())
}
