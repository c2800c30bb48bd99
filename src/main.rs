use dapi_coordinator::app::{AppState, build_router};
use dapi_coordinator::config::environment::AppConfig;
use dapi_coordinator::infra::init_infra;
use dapi_coordinator::module::{chain, dapi};
use dapi_coordinator::service::deploy_service;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    init_logging();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "config error");
            std::process::exit(1);
        }
    };

    let bind_addr = format!("{}:{}", config.api_host, config.api_port);
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, bind_addr = %bind_addr, "server bind error");
            std::process::exit(1);
        }
    };

    let infra = match init_infra(&config).await {
        Ok(i) => i,
        Err(e) => {
            warn!(error = %e, "infra init failed; running without the redis mirror");
            None
        }
    };
    let state = AppState::new(config, infra);

    match chain::crud::seed_registry(&state) {
        Ok(count) => info!(chains = count, "chain registry seeded"),
        Err(e) => {
            error!(error = %e.message, "chain registry seeding failed");
            std::process::exit(1);
        }
    }

    match dapi::crud::warm_store_from_redis(&state).await {
        Ok(warmed) if warmed > 0 => info!(jobs = warmed, "dapi store warmed from redis"),
        Ok(_) => {}
        Err(e) => warn!(error = %e.message, "dapi store warm-up failed"),
    }

    if state.config.deploy_enabled {
        match deploy_service::resume_incomplete_deployments(&state) {
            Ok(resumed) if resumed > 0 => info!(jobs = resumed, "incomplete deployments resumed"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "deployment resume failed"),
        }
    }

    info!(
        env = %state.config.rust_env,
        host = %state.config.api_host,
        port = state.config.api_port,
        deploy_enabled = state.config.deploy_enabled,
        "dapi-coordinator started"
    );

    let app = build_router(state);
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server runtime error");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
