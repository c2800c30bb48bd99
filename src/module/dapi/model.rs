use super::schema::{AuthType, JobStatus, JobStatusTransition};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Web2InfoRecord {
    pub id: String,
    pub uri: String,
    pub method: String,
    pub auth: AuthType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleInfoRecord {
    pub id: String,
    pub source_chain_id: i64,
    pub target_chain_id: i64,
    pub address: String,
    pub anchor: String,
    pub web2_info: Web2InfoRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DapiRecord {
    pub id: String,
    pub owner_address: String,
    pub status: JobStatus,
    pub created_at: i64,
    pub updated_at: i64,
    pub oracle_info: OracleInfoRecord,
    pub transitions: Vec<JobStatusTransition>,
}
