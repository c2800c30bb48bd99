use super::model::{ChainRecord, ChainType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainView {
    pub chain_id: i64,
    pub name: String,
    pub chain_type: ChainType,
    pub http_provider: String,
    pub ws_provider: String,
    pub cluster_id: String,
    pub pruntime: String,
}

impl ChainView {
    pub fn from_record(record: &ChainRecord) -> Self {
        Self {
            chain_id: record.chain_id,
            name: record.name.clone(),
            chain_type: record.chain_type,
            http_provider: record.http_provider.clone(),
            ws_provider: record.ws_provider.clone(),
            cluster_id: record.cluster_id.clone(),
            pruntime: record.pruntime.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListChainsResponse {
    pub count: usize,
    pub chains: Vec<ChainView>,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetChainResponse {
    pub found: bool,
    pub chain: Option<ChainView>,
    pub error_code: Option<String>,
    pub reason: String,
}
