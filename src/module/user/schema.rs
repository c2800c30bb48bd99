use super::model::{UserRecord, WalletRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInput {
    pub address: String,
    #[serde(alias = "chainId")]
    pub chain_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveUserRequest {
    pub wallets: Vec<WalletInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveUserResponse {
    pub accepted: bool,
    pub user_id: String,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletView {
    pub id: String,
    pub address: String,
    pub chain_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub wallets: Vec<WalletView>,
    pub dapi_ids: Vec<String>,
}

impl UserView {
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            wallets: record.wallets.iter().map(WalletView::from_record).collect(),
            dapi_ids: record.dapi_ids.clone(),
        }
    }
}

impl WalletView {
    pub fn from_record(record: &WalletRecord) -> Self {
        Self {
            id: record.id.clone(),
            address: record.address.clone(),
            chain_id: record.chain_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserResponse {
    pub found: bool,
    pub user: Option<UserView>,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPageResponse {
    pub size: i64,
    pub page: i64,
    pub count: usize,
    pub list: Vec<UserView>,
    pub total: i64,
    pub all: i64,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub deleted: bool,
    pub error_code: Option<String>,
    pub reason: String,
}
