use crate::app::AppState;
use crate::config::environment::AppConfig;
use crate::module::chain;
use crate::module::chain::model::{ChainRecord, ChainType};
use crate::module::dapi::crud;
use crate::module::dapi::model::DapiRecord;
use crate::module::dapi::schema::JobStatus;
use crate::service::anchor_service;
use crate::service::deployer_service::{
    AnchorConstructorArgs, DeployError, RuntimeConfig, RuntimeConfigureRequest,
    RuntimeDeployRequest,
};
use crate::service::events_service;
use crate::service::metrics_service;
use chrono::Utc;
use std::time::Instant;
use tracing::{error, info};

/// The original backend shipped two divergent renditions of this
/// workflow; they survive here as explicit variants instead of an
/// implicit pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployVariant {
    /// Deploy the runtime, deploy the anchor, then push the wiring in
    /// a separate configure call.
    Staged,
    /// Deploy the anchor first and hand the full wiring to the runtime
    /// as instantiation arguments; no separate configure call.
    Bundled,
}

impl DeployVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::Bundled => "bundled",
        }
    }
}

pub fn resolve_variant(config: &AppConfig, requested: Option<&str>) -> DeployVariant {
    let name = requested.unwrap_or(&config.deploy_variant);
    match name.to_ascii_lowercase().as_str() {
        "bundled" => DeployVariant::Bundled,
        _ => DeployVariant::Staged,
    }
}

pub fn spawn_deployment(state: AppState, job_id: String, variant: DeployVariant) {
    tokio::spawn(async move {
        metrics_service::inc_deployments_started();
        let started = Instant::now();
        match run_deployment(&state, &job_id, variant).await {
            Ok(()) => {
                metrics_service::record_deploy_duration_ms(started.elapsed().as_millis() as u64);
                metrics_service::inc_deployments_completed();
                info!(job_id = %job_id, variant = variant.as_str(), "deployment finished");
            }
            Err(e) => {
                metrics_service::inc_deployments_failed();
                metrics_service::set_last_error_ts(Utc::now().timestamp());
                error!(job_id = %job_id, variant = variant.as_str(), error = %e, "deployment failed");
            }
        }
    });
}

/// Drives one job through the deployment sequence. Every step is keyed
/// off the persisted status, so a re-run resumes after the last
/// completed milestone instead of repeating it.
pub async fn run_deployment(
    state: &AppState,
    job_id: &str,
    variant: DeployVariant,
) -> Result<(), DeployError> {
    let job = crud::get_dapi_record(state, job_id).await?;
    if job.status == JobStatus::Done {
        return Ok(());
    }

    let source = chain::crud::find_by_chain_id(state, job.oracle_info.source_chain_id)?
        .ok_or(DeployError::ChainNotFound(job.oracle_info.source_chain_id))?;
    let target = chain::crud::find_by_chain_id(state, job.oracle_info.target_chain_id)?
        .ok_or(DeployError::ChainNotFound(job.oracle_info.target_chain_id))?;

    if source.chain_type != ChainType::Phala {
        info!(job_id = %job_id, source_chain = source.chain_id, "source chain has no runtime cluster; nothing to deploy");
        return Ok(());
    }

    let mnemonic = state
        .config
        .sponsor_mnemonic
        .clone()
        .ok_or_else(|| DeployError::Config("SPONSOR_MNEMONIC is required".to_string()))?;

    match variant {
        DeployVariant::Staged => run_staged(state, job, &source, &target, &mnemonic).await,
        DeployVariant::Bundled => run_bundled(state, job, &source, &target, &mnemonic).await,
    }
}

async fn run_staged(
    state: &AppState,
    mut job: DapiRecord,
    source: &ChainRecord,
    target: &ChainRecord,
    mnemonic: &str,
) -> Result<(), DeployError> {
    let job_id = job.id.clone();

    if job.status.ordinal() < JobStatus::RuntimeDeployed.ordinal() {
        events_service::emit_status(state, &job_id, JobStatus::DeployingRuntime).await?;
        let contract_id = state
            .deployer
            .deploy_runtime_contract(&RuntimeDeployRequest {
                mnemonic: mnemonic.to_string(),
                cluster_id: source.cluster_id.clone(),
                ws_endpoint: source.ws_provider.clone(),
                pruntime_endpoint: source.pruntime.clone(),
                artifact_path: state.config.druntime_fat_v2_path.clone(),
                init_config: None,
            })
            .await?;
        crud::set_oracle_address(state, &job_id, &contract_id).await?;
        job = events_service::emit_status(state, &job_id, JobStatus::RuntimeDeployed).await?;
    }

    if job.status.ordinal() < JobStatus::DeployingAnchor.ordinal() {
        job = events_service::emit_status(state, &job_id, JobStatus::DeployingAnchor).await?;
    }

    if target.chain_type == ChainType::Evm
        && job.status.ordinal() < JobStatus::AnchorDeployed.ordinal()
    {
        let artifact = state
            .deployer
            .load_anchor_artifact(&state.config.phala_anchor_path)?;
        let args = AnchorConstructorArgs {
            owner_address: job.owner_address.clone(),
            protocol_address: state.config.protocol_address.clone(),
            init_params: anchor_service::anchor_init_params(),
        };
        let anchor = state
            .deployer
            .deploy_with_http_provider(&target.http_provider, mnemonic, &artifact, &args)
            .await?;
        crud::set_anchor_address(state, &job_id, &anchor).await?;
        job = events_service::emit_status(state, &job_id, JobStatus::AnchorDeployed).await?;
    }

    if job.status.ordinal() < JobStatus::Configured.ordinal() {
        if job.status.ordinal() < JobStatus::Configuring.ordinal() {
            events_service::emit_status(state, &job_id, JobStatus::Configuring).await?;
        }
        // re-read so the configure payload carries the stored anchor
        job = crud::get_dapi_record(state, &job_id).await?;
        state
            .deployer
            .configure_runtime_contract(&RuntimeConfigureRequest {
                mnemonic: mnemonic.to_string(),
                ws_endpoint: source.ws_provider.clone(),
                pruntime_endpoint: source.pruntime.clone(),
                artifact_path: state.config.druntime_fat_v2_path.clone(),
                action: "config".to_string(),
                config: runtime_config(&job, target, &job.oracle_info.anchor, &state.config),
            })
            .await?;
        job = events_service::emit_status(state, &job_id, JobStatus::Configured).await?;
    }

    if job.status.ordinal() < JobStatus::Verifying.ordinal() {
        job = events_service::emit_status(state, &job_id, JobStatus::Verifying).await?;
    }
    verify_wiring(&job, target)?;
    events_service::emit_status(state, &job_id, JobStatus::Done).await?;
    Ok(())
}

async fn run_bundled(
    state: &AppState,
    mut job: DapiRecord,
    source: &ChainRecord,
    target: &ChainRecord,
    mnemonic: &str,
) -> Result<(), DeployError> {
    let job_id = job.id.clone();

    // anchor first so the runtime can be instantiated with its address
    if target.chain_type == ChainType::Evm && job.oracle_info.anchor.is_empty() {
        let artifact = state
            .deployer
            .load_anchor_artifact(&state.config.phala_anchor_path)?;
        let args = AnchorConstructorArgs {
            owner_address: job.owner_address.clone(),
            protocol_address: state.config.protocol_address.clone(),
            init_params: anchor_service::anchor_init_params(),
        };
        let anchor = state
            .deployer
            .deploy_with_http_provider(&target.http_provider, mnemonic, &artifact, &args)
            .await?;
        job = crud::set_anchor_address(state, &job_id, &anchor).await?;
    }

    if job.status.ordinal() < JobStatus::RuntimeDeployed.ordinal() {
        events_service::emit_status(state, &job_id, JobStatus::DeployingRuntime).await?;
        let init = runtime_config(&job, target, &job.oracle_info.anchor, &state.config);
        let contract_id = state
            .deployer
            .deploy_runtime_contract(&RuntimeDeployRequest {
                mnemonic: mnemonic.to_string(),
                cluster_id: source.cluster_id.clone(),
                ws_endpoint: source.ws_provider.clone(),
                pruntime_endpoint: source.pruntime.clone(),
                artifact_path: state.config.druntime_fat_path.clone(),
                init_config: Some(init),
            })
            .await?;
        crud::set_oracle_address(state, &job_id, &contract_id).await?;
        job = events_service::emit_status(state, &job_id, JobStatus::RuntimeDeployed).await?;
    }

    verify_wiring(&job, target)?;
    events_service::emit_status(state, &job_id, JobStatus::Done).await?;
    Ok(())
}

/// Resumes every job the mirror still holds short of Done. Called once
/// at startup after the store is warmed.
pub fn resume_incomplete_deployments(state: &AppState) -> Result<usize, DeployError> {
    let variant = resolve_variant(&state.config, None);
    let mut resumed = 0;
    for job in crud::find_all_dapis(state)? {
        if job.status != JobStatus::Done {
            spawn_deployment(state.clone(), job.id, variant);
            resumed += 1;
        }
    }
    Ok(resumed)
}

fn runtime_config(
    job: &DapiRecord,
    target: &ChainRecord,
    anchor: &str,
    config: &AppConfig,
) -> RuntimeConfig {
    RuntimeConfig {
        target_chain_rpc: target.http_provider.clone(),
        anchor_contract_addr: anchor.to_string(),
        submit_key: None,
        web2_api_url_prefix: job.oracle_info.web2_info.uri.clone(),
        js_engine_code_hash: config.js_engine_code_hash.clone(),
        method: job.oracle_info.web2_info.method.to_uppercase(),
        auth: job.oracle_info.web2_info.auth.as_str().to_string(),
        api_key: String::new(),
    }
}

fn verify_wiring(job: &DapiRecord, target: &ChainRecord) -> Result<(), DeployError> {
    if job.oracle_info.address.is_empty() {
        return Err(DeployError::Runtime(
            "runtime contract id was not recorded".to_string(),
        ));
    }
    if target.chain_type == ChainType::Evm && job.oracle_info.anchor.is_empty() {
        return Err(DeployError::Anchor(
            "anchor address was not recorded".to_string(),
        ));
    }
    Ok(())
}
