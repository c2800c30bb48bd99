use async_trait::async_trait;
use dapi_coordinator::app::AppState;
use dapi_coordinator::config::environment::AppConfig;
use dapi_coordinator::module::chain;
use dapi_coordinator::module::chain::model::{ChainRecord, ChainType};
use dapi_coordinator::module::dapi::crud;
use dapi_coordinator::module::dapi::schema::{
    AuthType, JobStatus, OracleInfoInput, SubmitDapiRequest, Web2InfoInput,
};
use dapi_coordinator::service::deploy_service::{self, DeployVariant};
use dapi_coordinator::service::deployer_service::{
    AnchorConstructorArgs, ContractArtifact, ContractDeployer, DeployError, RuntimeConfig,
    RuntimeConfigureRequest, RuntimeDeployRequest,
};
use dapi_coordinator::service::events_service::StatusEvent;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

#[derive(Default)]
struct MockDeployer {
    runtime_calls: AtomicUsize,
    anchor_calls: AtomicUsize,
    runtime_inits: Mutex<Vec<Option<RuntimeConfig>>>,
    configure_calls: Mutex<Vec<RuntimeConfig>>,
    fail_next_anchor: AtomicBool,
}

#[async_trait]
impl ContractDeployer for MockDeployer {
    fn load_anchor_artifact(&self, _path: &str) -> Result<ContractArtifact, DeployError> {
        Ok(ContractArtifact {
            abi: serde_json::json!([]),
            bytecode: "0x00".to_string(),
        })
    }

    async fn deploy_with_http_provider(
        &self,
        _endpoint: &str,
        _mnemonic: &str,
        _artifact: &ContractArtifact,
        _args: &AnchorConstructorArgs,
    ) -> Result<String, DeployError> {
        self.anchor_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_anchor.swap(false, Ordering::SeqCst) {
            return Err(DeployError::Anchor("simulated revert".to_string()));
        }
        Ok("0xBBB".to_string())
    }

    async fn deploy_runtime_contract(
        &self,
        req: &RuntimeDeployRequest,
    ) -> Result<String, DeployError> {
        self.runtime_calls.fetch_add(1, Ordering::SeqCst);
        self.runtime_inits
            .lock()
            .expect("mock lock")
            .push(req.init_config.clone());
        Ok("0xAAA".to_string())
    }

    async fn configure_runtime_contract(
        &self,
        req: &RuntimeConfigureRequest,
    ) -> Result<(), DeployError> {
        self.configure_calls
            .lock()
            .expect("mock lock")
            .push(req.config.clone());
        Ok(())
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        rust_env: "test".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        redis_url: None,
        sponsor_mnemonic: Some(
            "test test test test test test test test test test test junk".to_string(),
        ),
        phala_anchor_path: "./artifacts/anchor.json".to_string(),
        druntime_fat_path: "./artifacts/druntime.contract".to_string(),
        druntime_fat_v2_path: "./artifacts/druntime_v2.contract".to_string(),
        js_engine_code_hash: "0x00aa".to_string(),
        protocol_address: "0x2222222222222222222222222222222222222222".to_string(),
        deploy_enabled: false,
        deploy_variant: "staged".to_string(),
        chain_registry_path: None,
        events_channel_capacity: 64,
    }
}

fn test_state(mock: Arc<MockDeployer>) -> AppState {
    let state = AppState::new(test_config(), None).with_deployer(mock);
    chain::crud::register_chain(
        &state,
        ChainRecord {
            chain_id: 1,
            name: "phala-test".to_string(),
            chain_type: ChainType::Phala,
            http_provider: String::new(),
            ws_provider: "wss://phala.test/ws".to_string(),
            cluster_id: "0x01".to_string(),
            pruntime: "https://phala.test/pruntime".to_string(),
        },
    )
    .expect("register source chain");
    chain::crud::register_chain(
        &state,
        ChainRecord {
            chain_id: 2,
            name: "evm-test".to_string(),
            chain_type: ChainType::Evm,
            http_provider: "http://evm.test".to_string(),
            ws_provider: String::new(),
            cluster_id: String::new(),
            pruntime: String::new(),
        },
    )
    .expect("register target chain");
    chain::crud::register_chain(
        &state,
        ChainRecord {
            chain_id: 3,
            name: "phala-target".to_string(),
            chain_type: ChainType::Phala,
            http_provider: String::new(),
            ws_provider: "wss://phala-target.test/ws".to_string(),
            cluster_id: "0x02".to_string(),
            pruntime: "https://phala-target.test/pruntime".to_string(),
        },
    )
    .expect("register phala target chain");
    state
}

fn submit_request(source_chain_id: i64, target_chain_id: i64) -> SubmitDapiRequest {
    SubmitDapiRequest {
        owner_address: "0x1111111111111111111111111111111111111111".to_string(),
        oracle_info: OracleInfoInput {
            source_chain_id,
            target_chain_id,
            web2_info: Web2InfoInput {
                uri: "https://api.example.com/price".to_string(),
                method: "get".to_string(),
                auth: AuthType::ApiKey,
            },
        },
    }
}

fn drain_events(rx: &mut broadcast::Receiver<StatusEvent>) -> Vec<StatusEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn staged_run_wires_runtime_anchor_and_configure() {
    let mock = Arc::new(MockDeployer::default());
    let state = test_state(mock.clone());
    let mut rx = state.events.subscribe();

    let submitted = crud::submit_dapi(&state, submit_request(1, 2))
        .await
        .expect("submit");

    deploy_service::run_deployment(&state, &submitted.job_id, DeployVariant::Staged)
        .await
        .expect("deployment");

    let job = crud::get_dapi_record(&state, &submitted.job_id)
        .await
        .expect("job");
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.oracle_info.address, "0xAAA");
    assert_eq!(job.oracle_info.anchor, "0xBBB");

    assert_eq!(mock.runtime_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.anchor_calls.load(Ordering::SeqCst), 1);

    let configures = mock.configure_calls.lock().expect("mock lock");
    assert_eq!(configures.len(), 1);
    assert_eq!(configures[0].anchor_contract_addr, "0xBBB");
    assert_eq!(configures[0].method, "GET");
    assert_eq!(configures[0].auth, "api_key");
    assert!(configures[0].api_key.is_empty());
    assert!(configures[0].submit_key.is_none());
    assert_eq!(configures[0].target_chain_rpc, "http://evm.test");

    let events = drain_events(&mut rx);
    let names = events.iter().map(|e| e.status.as_str()).collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "DEPLOYING_RUNTIME",
            "RUNTIME_DEPLOYED",
            "DEPLOYING_ANCHOR",
            "ANCHOR_DEPLOYED",
            "CONFIGURING",
            "CONFIGURED",
            "VERIFYING",
            "DONE",
        ]
    );
    for event in &events {
        let status = JobStatus::from_name(&event.status).expect("known status");
        assert_eq!(event.progress, status.ordinal() * 10);
        assert_eq!(event.job_id, submitted.job_id);
    }

    // persisted history is non-decreasing and ends at Done
    let ordinals = job
        .transitions
        .iter()
        .map(|t| t.to_status.ordinal())
        .collect::<Vec<_>>();
    assert!(ordinals.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(job.transitions.last().map(|t| t.to_status), Some(JobStatus::Done));
}

#[tokio::test]
async fn non_evm_target_skips_anchor_deployment() {
    let mock = Arc::new(MockDeployer::default());
    let state = test_state(mock.clone());
    let mut rx = state.events.subscribe();

    let submitted = crud::submit_dapi(&state, submit_request(1, 3))
        .await
        .expect("submit");

    deploy_service::run_deployment(&state, &submitted.job_id, DeployVariant::Staged)
        .await
        .expect("deployment");

    assert_eq!(mock.anchor_calls.load(Ordering::SeqCst), 0);

    let job = crud::get_dapi_record(&state, &submitted.job_id)
        .await
        .expect("job");
    assert_eq!(job.status, JobStatus::Done);
    assert!(job.oracle_info.anchor.is_empty());

    let configures = mock.configure_calls.lock().expect("mock lock");
    assert_eq!(configures.len(), 1);
    assert!(configures[0].anchor_contract_addr.is_empty());

    let names = drain_events(&mut rx)
        .into_iter()
        .map(|e| e.status)
        .collect::<Vec<_>>();
    assert!(names.contains(&"DEPLOYING_ANCHOR".to_string()));
    assert!(!names.contains(&"ANCHOR_DEPLOYED".to_string()));
}

#[tokio::test]
async fn failed_anchor_resumes_without_second_runtime_deploy() {
    let mock = Arc::new(MockDeployer {
        fail_next_anchor: AtomicBool::new(true),
        ..MockDeployer::default()
    });
    let state = test_state(mock.clone());

    let submitted = crud::submit_dapi(&state, submit_request(1, 2))
        .await
        .expect("submit");

    let first = deploy_service::run_deployment(&state, &submitted.job_id, DeployVariant::Staged).await;
    assert!(first.is_err());

    let stuck = crud::get_dapi_record(&state, &submitted.job_id)
        .await
        .expect("job");
    assert_eq!(stuck.status, JobStatus::DeployingAnchor);
    assert_eq!(stuck.oracle_info.address, "0xAAA");
    assert!(stuck.oracle_info.anchor.is_empty());

    deploy_service::run_deployment(&state, &submitted.job_id, DeployVariant::Staged)
        .await
        .expect("resumed deployment");

    // the runtime step was not repeated on resume
    assert_eq!(mock.runtime_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.anchor_calls.load(Ordering::SeqCst), 2);

    let job = crud::get_dapi_record(&state, &submitted.job_id)
        .await
        .expect("job");
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.oracle_info.anchor, "0xBBB");
}

#[tokio::test]
async fn bundled_variant_passes_wiring_as_init_args() {
    let mock = Arc::new(MockDeployer::default());
    let state = test_state(mock.clone());

    let submitted = crud::submit_dapi(&state, submit_request(1, 2))
        .await
        .expect("submit");

    deploy_service::run_deployment(&state, &submitted.job_id, DeployVariant::Bundled)
        .await
        .expect("deployment");

    assert!(mock.configure_calls.lock().expect("mock lock").is_empty());

    let inits = mock.runtime_inits.lock().expect("mock lock");
    assert_eq!(inits.len(), 1);
    let init = inits[0].as_ref().expect("init config");
    assert_eq!(init.anchor_contract_addr, "0xBBB");
    assert_eq!(init.target_chain_rpc, "http://evm.test");
    assert_eq!(init.method, "GET");

    let job = crud::get_dapi_record(&state, &submitted.job_id)
        .await
        .expect("job");
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.oracle_info.address, "0xAAA");
    assert_eq!(job.oracle_info.anchor, "0xBBB");
}

#[tokio::test]
async fn non_phala_source_is_left_untouched() {
    let mock = Arc::new(MockDeployer::default());
    let state = test_state(mock.clone());

    let submitted = crud::submit_dapi(&state, submit_request(2, 1))
        .await
        .expect("submit");

    deploy_service::run_deployment(&state, &submitted.job_id, DeployVariant::Staged)
        .await
        .expect("no-op deployment");

    assert_eq!(mock.runtime_calls.load(Ordering::SeqCst), 0);
    assert_eq!(mock.anchor_calls.load(Ordering::SeqCst), 0);

    let job = crud::get_dapi_record(&state, &submitted.job_id)
        .await
        .expect("job");
    assert_eq!(job.status, JobStatus::Created);
}

#[tokio::test]
async fn missing_sponsor_mnemonic_fails_before_any_transition() {
    let mock = Arc::new(MockDeployer::default());
    let mut config = test_config();
    config.sponsor_mnemonic = None;
    let state = {
        let state = AppState::new(config, None).with_deployer(mock.clone());
        chain::crud::register_chain(
            &state,
            ChainRecord {
                chain_id: 1,
                name: "phala-test".to_string(),
                chain_type: ChainType::Phala,
                http_provider: String::new(),
                ws_provider: "wss://phala.test/ws".to_string(),
                cluster_id: "0x01".to_string(),
                pruntime: "https://phala.test/pruntime".to_string(),
            },
        )
        .expect("register source chain");
        chain::crud::register_chain(
            &state,
            ChainRecord {
                chain_id: 2,
                name: "evm-test".to_string(),
                chain_type: ChainType::Evm,
                http_provider: "http://evm.test".to_string(),
                ws_provider: String::new(),
                cluster_id: String::new(),
                pruntime: String::new(),
            },
        )
        .expect("register target chain");
        state
    };

    let submitted = crud::submit_dapi(&state, submit_request(1, 2))
        .await
        .expect("submit");

    let result =
        deploy_service::run_deployment(&state, &submitted.job_id, DeployVariant::Staged).await;
    assert!(matches!(result, Err(DeployError::Config(_))));

    let job = crud::get_dapi_record(&state, &submitted.job_id)
        .await
        .expect("job");
    assert_eq!(job.status, JobStatus::Created);
    assert_eq!(mock.runtime_calls.load(Ordering::SeqCst), 0);
}
