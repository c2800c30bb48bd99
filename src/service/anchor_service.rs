use crate::service::deployer_service::{AnchorConstructorArgs, ContractArtifact, DeployError};
use ethers::abi::{Abi, Token};
use ethers::contract::ContractFactory;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, MnemonicBuilder, Signer, coins_bip39::English};
use ethers::types::{Address, Bytes};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

// Third constructor argument of the anchor contract: abi-encoded
// bridge parameters shared by every deployment.
const ANCHOR_INIT_PARAMS_HEX: &str =
    "0000000000000000000000000000000000000000000000000000000000000001";

pub fn anchor_init_params() -> Vec<u8> {
    hex::decode(ANCHOR_INIT_PARAMS_HEX).unwrap_or_default()
}

pub fn load_anchor_artifact(path: &str) -> Result<ContractArtifact, DeployError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| DeployError::Artifact(format!("failed to read {path}: {e}")))?;
    let parsed: Value = serde_json::from_str(&raw)
        .map_err(|e| DeployError::Artifact(format!("failed to parse {path}: {e}")))?;

    let abi = parsed
        .get("abi")
        .cloned()
        .ok_or_else(|| DeployError::Artifact(format!("{path} is missing an abi field")))?;
    let bytecode = parsed
        .get("bytecode")
        .and_then(|b| {
            b.as_str()
                .map(ToOwned::to_owned)
                .or_else(|| b.get("object").and_then(Value::as_str).map(ToOwned::to_owned))
        })
        .filter(|b| !b.is_empty())
        .ok_or_else(|| DeployError::Artifact(format!("{path} is missing bytecode")))?;

    Ok(ContractArtifact { abi, bytecode })
}

pub async fn deploy_with_http_provider(
    endpoint: &str,
    mnemonic: &str,
    artifact: &ContractArtifact,
    args: &AnchorConstructorArgs,
) -> Result<String, DeployError> {
    let provider = Provider::<Http>::try_from(endpoint)
        .map_err(|e| DeployError::Anchor(format!("provider init failed: {e}")))?;
    let chain_id = provider
        .get_chainid()
        .await
        .map_err(|e| DeployError::Anchor(format!("chain id query failed: {e}")))?;

    let wallet: LocalWallet = MnemonicBuilder::<English>::default()
        .phrase(mnemonic)
        .build()
        .map_err(|e| DeployError::Anchor(format!("invalid sponsor mnemonic: {e}")))?
        .with_chain_id(chain_id.as_u64());
    let client = Arc::new(SignerMiddleware::new(provider, wallet));

    let abi: Abi = serde_json::from_value(artifact.abi.clone())
        .map_err(|e| DeployError::Artifact(format!("invalid anchor abi: {e}")))?;
    let stripped = artifact
        .bytecode
        .strip_prefix("0x")
        .unwrap_or(&artifact.bytecode);
    let bytecode = Bytes::from(
        hex::decode(stripped)
            .map_err(|e| DeployError::Artifact(format!("invalid anchor bytecode: {e}")))?,
    );

    let owner = Address::from_str(&args.owner_address)
        .map_err(|e| DeployError::Anchor(format!("invalid owner address: {e}")))?;
    let protocol = Address::from_str(&args.protocol_address)
        .map_err(|e| DeployError::Anchor(format!("invalid protocol address: {e}")))?;

    let factory = ContractFactory::new(abi, bytecode, client);
    let deployer = factory
        .deploy_tokens(vec![
            Token::Address(owner),
            Token::Address(protocol),
            Token::Bytes(args.init_params.clone()),
        ])
        .map_err(|e| DeployError::Anchor(format!("constructor encoding failed: {e}")))?;
    let contract = deployer
        .send()
        .await
        .map_err(|e| DeployError::Anchor(format!("deployment tx failed: {e}")))?;

    Ok(format!("{:#x}", contract.address()))
}
