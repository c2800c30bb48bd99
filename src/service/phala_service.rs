use crate::service::deployer_service::{DeployError, RuntimeConfigureRequest, RuntimeDeployRequest};
use crate::service::hash_service::sha256_hex_bytes;
use serde_json::{Value, json};

/// Uploads and instantiates the druntime contract in the source
/// chain's cluster. Returns the instantiated contract id.
pub async fn deploy_runtime_contract(req: &RuntimeDeployRequest) -> Result<String, DeployError> {
    let code = tokio::fs::read(&req.artifact_path)
        .await
        .map_err(|e| DeployError::Artifact(format!("failed to read {}: {e}", req.artifact_path)))?;
    let code_hash = format!("0x{}", sha256_hex_bytes(&code));

    let payload = json!({
        "cluster_id": req.cluster_id,
        "chain_ws_endpoint": req.ws_endpoint,
        "sponsor_mnemonic": req.mnemonic,
        "code_hash": code_hash,
        "code": hex::encode(&code),
        "init_config": req.init_config,
    });

    let body = post_pruntime(&req.pruntime_endpoint, "contracts/instantiate", &payload)
        .await
        .map_err(DeployError::Runtime)?;

    body.get("contract_id")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| DeployError::Runtime("missing contract_id in pruntime response".to_string()))
}

/// Pushes the target-chain wiring into an already instantiated
/// runtime contract.
pub async fn configure_runtime_contract(req: &RuntimeConfigureRequest) -> Result<(), DeployError> {
    let code = tokio::fs::read(&req.artifact_path)
        .await
        .map_err(|e| DeployError::Artifact(format!("failed to read {}: {e}", req.artifact_path)))?;
    let code_hash = format!("0x{}", sha256_hex_bytes(&code));

    let payload = json!({
        "chain_ws_endpoint": req.ws_endpoint,
        "sponsor_mnemonic": req.mnemonic,
        "code_hash": code_hash,
        "action": req.action,
        "config": req.config,
    });

    let body = post_pruntime(&req.pruntime_endpoint, "contracts/call", &payload)
        .await
        .map_err(DeployError::Configure)?;

    let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
    if !ok {
        return Err(DeployError::Configure(format!(
            "pruntime rejected {}: {body}",
            req.action
        )));
    }
    Ok(())
}

async fn post_pruntime(endpoint: &str, path: &str, payload: &Value) -> Result<Value, String> {
    let client = reqwest::Client::new();
    let url = format!("{}/{path}", endpoint.trim_end_matches('/'));
    let response = client
        .post(&url)
        .json(payload)
        .send()
        .await
        .map_err(|e| format!("pruntime request failed: {e}"))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| format!("pruntime response decode failed: {e}"))?;
    if !status.is_success() {
        return Err(format!("pruntime returned {status}: {body}"));
    }
    Ok(body)
}
