use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    pub id: String,
    pub address: String,
    pub chain_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub wallets: Vec<WalletRecord>,
    pub dapi_ids: Vec<String>,
}
