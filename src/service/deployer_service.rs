use crate::module::error::AppError;
use crate::service::{anchor_service, phala_service};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("chain {0} is not registered")]
    ChainNotFound(i64),

    #[error("deployment configuration error: {0}")]
    Config(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("runtime contract deployment failed: {0}")]
    Runtime(String),

    #[error("anchor contract deployment failed: {0}")]
    Anchor(String),

    #[error("runtime contract configuration failed: {0}")]
    Configure(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<AppError> for DeployError {
    fn from(err: AppError) -> Self {
        DeployError::Persistence(format!("{}: {}", err.code, err.message))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractArtifact {
    pub abi: Value,
    pub bytecode: String,
}

#[derive(Debug, Clone)]
pub struct AnchorConstructorArgs {
    pub owner_address: String,
    pub protocol_address: String,
    pub init_params: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub target_chain_rpc: String,
    pub anchor_contract_addr: String,
    pub submit_key: Option<String>,
    pub web2_api_url_prefix: String,
    pub js_engine_code_hash: String,
    pub method: String,
    pub auth: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct RuntimeDeployRequest {
    pub mnemonic: String,
    pub cluster_id: String,
    pub ws_endpoint: String,
    pub pruntime_endpoint: String,
    pub artifact_path: String,
    pub init_config: Option<RuntimeConfig>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfigureRequest {
    pub mnemonic: String,
    pub ws_endpoint: String,
    pub pruntime_endpoint: String,
    pub artifact_path: String,
    pub action: String,
    pub config: RuntimeConfig,
}

/// Seam between the orchestrator and the chains it deploys to. The
/// orchestrator depends only on these four operations.
#[async_trait]
pub trait ContractDeployer: Send + Sync {
    fn load_anchor_artifact(&self, path: &str) -> Result<ContractArtifact, DeployError>;

    async fn deploy_with_http_provider(
        &self,
        endpoint: &str,
        mnemonic: &str,
        artifact: &ContractArtifact,
        args: &AnchorConstructorArgs,
    ) -> Result<String, DeployError>;

    async fn deploy_runtime_contract(
        &self,
        req: &RuntimeDeployRequest,
    ) -> Result<String, DeployError>;

    async fn configure_runtime_contract(
        &self,
        req: &RuntimeConfigureRequest,
    ) -> Result<(), DeployError>;
}

/// Live deployer: anchor contracts go out through an EVM JSON-RPC
/// provider, runtime contracts through the chain's pruntime gateway.
#[derive(Debug, Default)]
pub struct RpcDeployer;

#[async_trait]
impl ContractDeployer for RpcDeployer {
    fn load_anchor_artifact(&self, path: &str) -> Result<ContractArtifact, DeployError> {
        anchor_service::load_anchor_artifact(path)
    }

    async fn deploy_with_http_provider(
        &self,
        endpoint: &str,
        mnemonic: &str,
        artifact: &ContractArtifact,
        args: &AnchorConstructorArgs,
    ) -> Result<String, DeployError> {
        anchor_service::deploy_with_http_provider(endpoint, mnemonic, artifact, args).await
    }

    async fn deploy_runtime_contract(
        &self,
        req: &RuntimeDeployRequest,
    ) -> Result<String, DeployError> {
        phala_service::deploy_runtime_contract(req).await
    }

    async fn configure_runtime_contract(
        &self,
        req: &RuntimeConfigureRequest,
    ) -> Result<(), DeployError> {
        phala_service::configure_runtime_contract(req).await
    }
}
