use crate::config::db::RedisConfig;
use crate::config::environment::AppConfig;
use redis::Client as RedisClient;

#[derive(Debug, Clone)]
pub struct InfraClients {
    pub redis: RedisClient,
}

pub const DAPIS_COLLECTION: &str = "dapis";
pub const DAPIS_INDEX_KEY: &str = "dapis:index";
pub const DAPI_STATUS_ATTEMPTS_COLLECTION: &str = "dapi_status_attempts";
pub const USERS_COLLECTION: &str = "users";
pub const USERS_INDEX_KEY: &str = "users:index";

pub async fn init_infra(config: &AppConfig) -> Result<Option<InfraClients>, String> {
    if config.redis_url.is_none() {
        return Ok(None);
    }

    let redis_config = RedisConfig::from_app(config);
    let redis =
        RedisClient::open(redis_config.url).map_err(|e| format!("redis init failed: {e}"))?;
    Ok(Some(InfraClients { redis }))
}
