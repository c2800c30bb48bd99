use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rust_env: String,
    pub api_host: String,
    pub api_port: u16,
    pub redis_url: Option<String>,
    pub sponsor_mnemonic: Option<String>,
    pub phala_anchor_path: String,
    pub druntime_fat_path: String,
    pub druntime_fat_v2_path: String,
    pub js_engine_code_hash: String,
    pub protocol_address: String,
    pub deploy_enabled: bool,
    pub deploy_variant: String,
    pub chain_registry_path: Option<String>,
    pub events_channel_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        load_dotenv_layers();
        Ok(Self {
            rust_env: read_var("RUST_ENV")?,
            api_host: read_var("API_HOST")?,
            api_port: read_var("API_PORT")?
                .parse::<u16>()
                .map_err(|e| format!("invalid API_PORT: {e}"))?,
            redis_url: env::var("REDIS_URL").ok(),
            sponsor_mnemonic: env::var("SPONSOR_MNEMONIC").ok(),
            phala_anchor_path: read_optional_string("PHALA_ANCHOR_PATH", "./artifacts/anchor.json"),
            druntime_fat_path: read_optional_string(
                "DRUNTIME_FAT_PATH",
                "./artifacts/druntime.contract",
            ),
            druntime_fat_v2_path: read_optional_string(
                "DRUNTIME_FAT_V2_PATH",
                "./artifacts/druntime_v2.contract",
            ),
            js_engine_code_hash: read_optional_string("JS_ENGINE_CODE_HASH", ""),
            protocol_address: read_optional_string(
                "PROTOCOL_ADDRESS",
                "0x0000000000000000000000000000000000000000",
            ),
            deploy_enabled: read_optional_bool("DEPLOY_ENABLED", true),
            deploy_variant: read_optional_string("DEPLOY_VARIANT", "staged"),
            chain_registry_path: env::var("CHAIN_REGISTRY_PATH").ok(),
            events_channel_capacity: read_optional_usize("EVENTS_CHANNEL_CAPACITY", 64)?,
        })
    }
}

fn read_var(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("missing required env var: {key}"))
}

fn read_optional_usize(key: &str, default: usize) -> Result<usize, String> {
    match env::var(key) {
        Ok(v) => v.parse::<usize>().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn read_optional_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"),
        Err(_) => default,
    }
}

fn read_optional_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn load_dotenv_layers() {
    for path in [".env", "../.env", "../../.env"] {
        let _ = dotenvy::from_path_override(path);
    }
}
