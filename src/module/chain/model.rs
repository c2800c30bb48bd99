use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Evm,
    Phala,
}

impl ChainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evm => "evm",
            Self::Phala => "phala",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRecord {
    pub chain_id: i64,
    pub name: String,
    pub chain_type: ChainType,
    pub http_provider: String,
    pub ws_provider: String,
    pub cluster_id: String,
    pub pruntime: String,
}
