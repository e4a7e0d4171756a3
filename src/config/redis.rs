use super::env::{non_empty, parse_or, process_env};
use redis::aio::ConnectionManager;
use tokio::time::{timeout, Duration};

/// Connect to Redis for the sitemap cache. Callers treat failure as "no cache".
pub async fn get_redis() -> anyhow::Result<ConnectionManager> {
    let redis_url = non_empty(&process_env, "REDIS_URL")
        .unwrap_or_else(|| "redis://localhost:6379".to_string());
    let connect_timeout: u64 = parse_or(&process_env, "REDIS_CONNECT_TIMEOUT_SECS", 5);
    let client = redis::Client::open(redis_url)?;

    timeout(
        Duration::from_secs(connect_timeout),
        ConnectionManager::new(client),
    )
    .await
    .map_err(|_| anyhow::anyhow!("Redis connection timeout after {connect_timeout} seconds"))?
    .map_err(Into::into)
}
