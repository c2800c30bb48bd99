use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    None,
    ApiKey,
    Bearer,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey => "api_key",
            Self::Bearer => "bearer",
        }
    }
}

// Discriminants double as the progress ordinal; the listing filter and
// the broadcast payload both rely on them staying stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Created = 0,
    Pending = 1,
    DeployingRuntime = 2,
    RuntimeDeployed = 3,
    DeployingAnchor = 4,
    AnchorDeployed = 5,
    Configuring = 6,
    Configured = 7,
    Verifying = 8,
    Done = 9,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Pending => "PENDING",
            Self::DeployingRuntime => "DEPLOYING_RUNTIME",
            Self::RuntimeDeployed => "RUNTIME_DEPLOYED",
            Self::DeployingAnchor => "DEPLOYING_ANCHOR",
            Self::AnchorDeployed => "ANCHOR_DEPLOYED",
            Self::Configuring => "CONFIGURING",
            Self::Configured => "CONFIGURED",
            Self::Verifying => "VERIFYING",
            Self::Done => "DONE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CREATED" => Some(Self::Created),
            "PENDING" => Some(Self::Pending),
            "DEPLOYING_RUNTIME" => Some(Self::DeployingRuntime),
            "RUNTIME_DEPLOYED" => Some(Self::RuntimeDeployed),
            "DEPLOYING_ANCHOR" => Some(Self::DeployingAnchor),
            "ANCHOR_DEPLOYED" => Some(Self::AnchorDeployed),
            "CONFIGURING" => Some(Self::Configuring),
            "CONFIGURED" => Some(Self::Configured),
            "VERIFYING" => Some(Self::Verifying),
            "DONE" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn ordinal(&self) -> i64 {
        *self as i64
    }

    pub fn progress(&self) -> i64 {
        self.ordinal() * 10
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusTransition {
    pub from_status: Option<JobStatus>,
    pub to_status: JobStatus,
    pub transitioned_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Web2InfoInput {
    pub uri: String,
    pub method: String,
    pub auth: AuthType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleInfoInput {
    #[serde(alias = "sourceChainId")]
    pub source_chain_id: i64,
    #[serde(alias = "targetChainId")]
    pub target_chain_id: i64,
    #[serde(alias = "web2Info")]
    pub web2_info: Web2InfoInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitDapiRequest {
    #[serde(alias = "ownerAddress")]
    pub owner_address: String,
    #[serde(alias = "oracleInfo")]
    pub oracle_info: OracleInfoInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitDapiResponse {
    pub accepted: bool,
    pub job_id: String,
    pub status: Option<JobStatus>,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Web2InfoView {
    pub id: String,
    pub uri: String,
    pub method: String,
    pub auth: AuthType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleInfoView {
    pub id: String,
    pub source_chain_id: i64,
    pub target_chain_id: i64,
    pub address: String,
    pub anchor: String,
    pub web2_info: Web2InfoView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DapiView {
    pub id: String,
    pub owner_address: String,
    pub status: JobStatus,
    pub progress: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub oracle_info: OracleInfoView,
    pub transitions: Vec<JobStatusTransition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDapiResponse {
    pub found: bool,
    pub dapi: Option<DapiView>,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DapiPageResponse {
    pub size: i64,
    pub page: i64,
    pub count: usize,
    pub list: Vec<DapiView>,
    pub total: i64,
    pub all: i64,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDapiStatusRequest {
    pub next_status: JobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDapiStatusResponse {
    pub updated: bool,
    pub idempotent: bool,
    pub dapi: Option<DapiView>,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployDapiResponse {
    pub accepted: bool,
    pub job_id: String,
    pub variant: String,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDapiResponse {
    pub deleted: bool,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMetricsView {
    pub jobs_submitted: u64,
    pub deployments_started: u64,
    pub deployments_completed: u64,
    pub deployments_failed: u64,
    pub status_events_broadcast: u64,
    pub deploy_duration_count: u64,
    pub deploy_duration_avg_ms: u64,
    pub last_error_ts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub redis_available: bool,
    pub deploy_enabled: bool,
    pub metrics: HealthMetricsView,
    pub error_code: Option<String>,
    pub reason: String,
}
