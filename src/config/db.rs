use crate::config::environment::AppConfig;

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

impl RedisConfig {
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            url: app.redis_url.clone().unwrap_or_default(),
        }
    }
}
