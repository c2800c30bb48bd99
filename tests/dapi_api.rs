use axum::body::{Body, to_bytes};
use dapi_coordinator::app::{AppState, build_router};
use dapi_coordinator::config::environment::AppConfig;
use dapi_coordinator::module::chain;
use dapi_coordinator::module::chain::model::{ChainRecord, ChainType};
use dapi_coordinator::module::dapi::crud;
use dapi_coordinator::module::dapi::model::{DapiRecord, OracleInfoRecord, Web2InfoRecord};
use dapi_coordinator::module::dapi::schema::{
    AuthType, DapiPageResponse, DeleteDapiResponse, GetDapiResponse, HealthResponse, JobStatus,
    OracleInfoInput, SubmitDapiRequest, SubmitDapiResponse, UpdateDapiStatusRequest,
    UpdateDapiStatusResponse, Web2InfoInput,
};
use http::Request;
use std::collections::HashSet;
use tower::util::ServiceExt;

fn test_config() -> AppConfig {
    AppConfig {
        rust_env: "test".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        redis_url: None,
        sponsor_mnemonic: None,
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

fn test_state() -> AppState {
    let state = AppState::new(test_config(), None);
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
}

fn submit_request(source_chain_id: i64, target_chain_id: i64) -> SubmitDapiRequest {
    SubmitDapiRequest {
        owner_address: "0x1111111111111111111111111111111111111111".to_string(),
        oracle_info: OracleInfoInput {
            source_chain_id,
            target_chain_id,
            web2_info: Web2InfoInput {
                uri: "https://api.example.com/price".to_string(),
                method: "GET".to_string(),
                auth: AuthType::None,
            },
        },
    }
}

fn done_job(n: usize) -> DapiRecord {
    DapiRecord {
        id: format!("job-{n:02}"),
        owner_address: "0x1111111111111111111111111111111111111111".to_string(),
        status: JobStatus::Done,
        created_at: 1_700_000_000,
        updated_at: 1_700_000_000,
        oracle_info: OracleInfoRecord {
            id: format!("oracle-{n:02}"),
            source_chain_id: 1,
            target_chain_id: 2,
            address: "0xAAA".to_string(),
            anchor: "0xBBB".to_string(),
            web2_info: Web2InfoRecord {
                id: format!("web2-{n:02}"),
                uri: "https://api.example.com/price".to_string(),
                method: "GET".to_string(),
                auth: AuthType::None,
            },
        },
        transitions: Vec::new(),
    }
}

async fn post_json<B: serde::Serialize, R: serde::de::DeserializeOwned>(
    app: axum::Router,
    uri: &str,
    body: &B,
) -> (http::StatusCode, R) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize")))
        .expect("build request");
    send(app, request).await
}

async fn get_json<R: serde::de::DeserializeOwned>(
    app: axum::Router,
    uri: &str,
) -> (http::StatusCode, R) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    send(app, request).await
}

async fn delete_json<R: serde::de::DeserializeOwned>(
    app: axum::Router,
    uri: &str,
) -> (http::StatusCode, R) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    send(app, request).await
}

async fn send<R: serde::de::DeserializeOwned>(
    app: axum::Router,
    request: Request<Body>,
) -> (http::StatusCode, R) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let payload: R = serde_json::from_slice(&body).expect("parse body");
    (status, payload)
}

#[tokio::test]
async fn submit_accepts_valid_job() {
    let state = test_state();
    let app = build_router(state);

    let (status, body): (_, SubmitDapiResponse) =
        post_json(app, "/v1/dapis", &submit_request(1, 2)).await;

    assert_eq!(status, http::StatusCode::OK);
    assert!(body.accepted);
    assert!(!body.job_id.is_empty());
    assert_eq!(body.status, Some(JobStatus::Created));
}

#[tokio::test]
async fn submit_with_unknown_chain_writes_nothing() {
    let state = test_state();
    let app = build_router(state.clone());
    let before = crud::count_dapis(&state).expect("count");

    let (status, body): (_, SubmitDapiResponse) =
        post_json(app, "/v1/dapis", &submit_request(1, 99)).await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert!(!body.accepted);
    assert_eq!(body.error_code.as_deref(), Some("CHAIN_NOT_SUPPORTED"));
    assert_eq!(crud::count_dapis(&state).expect("count"), before);
}

#[tokio::test]
async fn get_returns_submitted_job() {
    let state = test_state();
    let app = build_router(state.clone());

    let (_, submitted): (_, SubmitDapiResponse) =
        post_json(app.clone(), "/v1/dapis", &submit_request(1, 2)).await;

    let (status, body): (_, GetDapiResponse) =
        get_json(app, &format!("/v1/dapis/{}", submitted.job_id)).await;

    assert_eq!(status, http::StatusCode::OK);
    assert!(body.found);
    let view = body.dapi.expect("view");
    assert_eq!(view.id, submitted.job_id);
    assert_eq!(view.oracle_info.source_chain_id, 1);
    assert_eq!(view.oracle_info.target_chain_id, 2);
    assert!(view.oracle_info.address.is_empty());
}

#[tokio::test]
async fn pagination_reports_ceiling_and_partitions_records() {
    let state = test_state();
    for n in 0..7 {
        crud::save_dapi(&state, done_job(n)).await.expect("save");
    }
    let app = build_router(state);

    let mut seen = HashSet::new();
    let mut counts = Vec::new();
    for page in 1..=3 {
        let (status, body): (_, DapiPageResponse) =
            get_json(app.clone(), &format!("/v1/dapis?page={page}&size=3")).await;
        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(body.total, 7);
        assert_eq!(body.all, 3);
        assert_eq!(body.page, page);
        counts.push(body.count);
        for view in body.list {
            assert!(seen.insert(view.id), "page overlap");
        }
    }

    assert_eq!(counts, vec![3, 3, 1]);
    assert_eq!(seen.len(), 7);

    let (status, beyond): (_, DapiPageResponse) =
        get_json(app, "/v1/dapis?page=4&size=3").await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(beyond.count, 0);
}

#[tokio::test]
async fn pagination_rejects_zero_size() {
    let state = test_state();
    let app = build_router(state);

    let (status, body): (_, DapiPageResponse) = get_json(app, "/v1/dapis?page=1&size=0").await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(body.error_code.as_deref(), Some("INVALID_PAGE_SIZE"));
}

#[tokio::test]
async fn listing_defaults_to_done_jobs_only() {
    let state = test_state();
    crud::save_dapi(&state, done_job(0)).await.expect("save");
    let app = build_router(state.clone());

    let (_, submitted): (_, SubmitDapiResponse) =
        post_json(app.clone(), "/v1/dapis", &submit_request(1, 2)).await;
    assert!(submitted.accepted);

    let (_, done_only): (_, DapiPageResponse) = get_json(app.clone(), "/v1/dapis?page=1&size=10").await;
    assert_eq!(done_only.total, 1);

    let (_, all): (_, DapiPageResponse) =
        get_json(app, "/v1/dapis?page=1&size=10&status=ALL").await;
    assert_eq!(all.total, 2);
}

#[tokio::test]
async fn status_update_rejects_regression() {
    let state = test_state();
    let app = build_router(state);

    let (_, submitted): (_, SubmitDapiResponse) =
        post_json(app.clone(), "/v1/dapis", &submit_request(1, 2)).await;

    let (status, body): (_, UpdateDapiStatusResponse) = post_json(
        app.clone(),
        &format!("/v1/dapis/{}/status", submitted.job_id),
        &UpdateDapiStatusRequest {
            next_status: JobStatus::DeployingRuntime,
        },
    )
    .await;
    assert_eq!(status, http::StatusCode::OK);
    assert!(body.updated);
    assert!(!body.idempotent);

    let (status, body): (_, UpdateDapiStatusResponse) = post_json(
        app,
        &format!("/v1/dapis/{}/status", submitted.job_id),
        &UpdateDapiStatusRequest {
            next_status: JobStatus::Created,
        },
    )
    .await;
    assert_eq!(status, http::StatusCode::CONFLICT);
    assert_eq!(body.error_code.as_deref(), Some("STATUS_REGRESSION"));
}

#[tokio::test]
async fn status_update_same_status_is_idempotent() {
    let state = test_state();
    let app = build_router(state);

    let (_, submitted): (_, SubmitDapiResponse) =
        post_json(app.clone(), "/v1/dapis", &submit_request(1, 2)).await;

    let (status, body): (_, UpdateDapiStatusResponse) = post_json(
        app,
        &format!("/v1/dapis/{}/status", submitted.job_id),
        &UpdateDapiStatusRequest {
            next_status: JobStatus::Created,
        },
    )
    .await;
    assert_eq!(status, http::StatusCode::OK);
    assert!(body.updated);
    assert!(body.idempotent);
}

#[tokio::test]
async fn delete_removes_the_job() {
    let state = test_state();
    let app = build_router(state);

    let (_, submitted): (_, SubmitDapiResponse) =
        post_json(app.clone(), "/v1/dapis", &submit_request(1, 2)).await;

    let (status, deleted): (_, DeleteDapiResponse) =
        delete_json(app.clone(), &format!("/v1/dapis/{}", submitted.job_id)).await;
    assert_eq!(status, http::StatusCode::OK);
    assert!(deleted.deleted);

    let (status, body): (_, GetDapiResponse) =
        get_json(app, &format!("/v1/dapis/{}", submitted.job_id)).await;
    assert_eq!(status, http::StatusCode::NOT_FOUND);
    assert!(!body.found);
}

#[tokio::test]
async fn update_replaces_the_record_and_stamps_updated_at() {
    let state = test_state();

    let submitted = crud::submit_dapi(&state, submit_request(1, 2))
        .await
        .expect("submit");
    let mut record = crud::get_dapi_record(&state, &submitted.job_id)
        .await
        .expect("record");

    record.oracle_info.web2_info.uri = "https://api.example.com/v2/price".to_string();
    let updated = crud::update_dapi(&state, record).await.expect("update");
    assert!(updated.updated_at >= updated.created_at);

    let reloaded = crud::get_dapi_record(&state, &submitted.job_id)
        .await
        .expect("record");
    assert_eq!(
        reloaded.oracle_info.web2_info.uri,
        "https://api.example.com/v2/price"
    );

    let mut missing = done_job(42);
    missing.id = "no-such-job".to_string();
    let err = crud::update_dapi(&state, missing).await.unwrap_err();
    assert_eq!(err.code, "JOB_NOT_FOUND");
}

#[tokio::test]
async fn find_all_matches_count() {
    let state = test_state();
    for n in 0..4 {
        crud::save_dapi(&state, done_job(n)).await.expect("save");
    }

    assert_eq!(crud::count_dapis(&state).expect("count"), 4);
    assert_eq!(crud::find_all_dapis(&state).expect("find all").len(), 4);
}

#[tokio::test]
async fn health_reports_deploy_flag_and_no_redis() {
    let state = test_state();
    let app = build_router(state);

    let (status, body): (_, HealthResponse) = get_json(app, "/v1/dapis/health").await;

    assert_eq!(status, http::StatusCode::OK);
    assert!(body.ok);
    assert!(!body.redis_available);
    assert!(!body.deploy_enabled);
}
