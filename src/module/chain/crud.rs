use super::model::{ChainRecord, ChainType};
use crate::app::AppState;
use crate::module::error::AppError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct ChainStore {
    inner: Mutex<ChainStoreInner>,
}

#[derive(Debug, Default)]
struct ChainStoreInner {
    chains_by_id: HashMap<i64, ChainRecord>,
}

pub fn register_chain(state: &AppState, chain: ChainRecord) -> Result<(), AppError> {
    let mut inner = lock_store(&state.chains)?;
    inner.chains_by_id.insert(chain.chain_id, chain);
    Ok(())
}

pub fn find_by_chain_id(state: &AppState, chain_id: i64) -> Result<Option<ChainRecord>, AppError> {
    let inner = lock_store(&state.chains)?;
    Ok(inner.chains_by_id.get(&chain_id).cloned())
}

pub fn list_chains(state: &AppState) -> Result<Vec<ChainRecord>, AppError> {
    let inner = lock_store(&state.chains)?;
    let mut chains = inner.chains_by_id.values().cloned().collect::<Vec<_>>();
    chains.sort_by_key(|c| c.chain_id);
    Ok(chains)
}

pub fn seed_registry(state: &AppState) -> Result<usize, AppError> {
    let chains = match &state.config.chain_registry_path {
        Some(path) => load_registry_file(path)?,
        None => default_chains(),
    };
    let count = chains.len();
    for chain in chains {
        register_chain(state, chain)?;
    }
    Ok(count)
}

fn load_registry_file(path: &str) -> Result<Vec<ChainRecord>, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::internal(
            "CHAIN_REGISTRY_READ_FAILED",
            format!("failed to read {path}: {e}"),
        )
    })?;
    serde_json::from_str::<Vec<ChainRecord>>(&raw).map_err(|e| {
        AppError::internal(
            "CHAIN_REGISTRY_PARSE_FAILED",
            format!("failed to parse {path}: {e}"),
        )
    })
}

fn default_chains() -> Vec<ChainRecord> {
    vec![
        ChainRecord {
            chain_id: 1,
            name: "phala-poc6".to_string(),
            chain_type: ChainType::Phala,
            http_provider: String::new(),
            ws_provider: "wss://poc6.phala.network/ws".to_string(),
            cluster_id: "0x0000000000000000000000000000000000000000000000000000000000000001"
                .to_string(),
            pruntime: "https://poc6.phala.network/pruntime".to_string(),
        },
        ChainRecord {
            chain_id: 11155111,
            name: "eth-sepolia".to_string(),
            chain_type: ChainType::Evm,
            http_provider: "https://rpc.sepolia.org".to_string(),
            ws_provider: String::new(),
            cluster_id: String::new(),
            pruntime: String::new(),
        },
    ]
}

fn lock_store(store: &ChainStore) -> Result<MutexGuard<'_, ChainStoreInner>, AppError> {
    store
        .inner
        .lock()
        .map_err(|_| AppError::internal("STORE_LOCK_ERROR", "chain store lock poisoned"))
}
