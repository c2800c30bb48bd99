use super::controller;
use crate::app::AppState;
use axum::Router;
use axum::routing::get;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/chains", get(controller::list_chains))
        .route("/v1/chains/:chain_id", get(controller::get_chain))
}
