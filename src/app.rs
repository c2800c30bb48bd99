use crate::config::environment::AppConfig;
use crate::infra::InfraClients;
use crate::module::chain::crud::ChainStore;
use crate::module::dapi::crud::DapiStore;
use crate::module::user::crud::UserStore;
use crate::module::{chain, dapi, user};
use crate::service::deployer_service::{ContractDeployer, RpcDeployer};
use crate::service::events_service::{self, StatusChannel};
use axum::Router;
use axum::http::Method;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dapis: Arc<DapiStore>,
    pub users: Arc<UserStore>,
    pub chains: Arc<ChainStore>,
    pub infra: Option<InfraClients>,
    pub events: StatusChannel,
    pub deployer: Arc<dyn ContractDeployer>,
}

impl AppState {
    pub fn new(config: AppConfig, infra: Option<InfraClients>) -> Self {
        let events = StatusChannel::new(config.events_channel_capacity);
        Self {
            config,
            dapis: Arc::new(DapiStore::default()),
            users: Arc::new(UserStore::default()),
            chains: Arc::new(ChainStore::default()),
            infra,
            events,
            deployer: Arc::new(RpcDeployer),
        }
    }

    pub fn with_deployer(mut self, deployer: Arc<dyn ContractDeployer>) -> Self {
        self.deployer = deployer;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().expect("valid origin"),
            "http://127.0.0.1:3000".parse().expect("valid origin"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .merge(dapi::route::routes())
        .merge(user::route::routes())
        .merge(chain::route::routes())
        .route("/v1/events/status", get(events_service::ws_status))
        .with_state(state)
        .layer(cors)
}
