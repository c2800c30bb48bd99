use super::controller;
use crate::app::AppState;
use axum::Router;
use axum::routing::{delete, get, post};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/dapis", post(controller::submit_dapi))
        .route("/v1/dapis", get(controller::list_dapis))
        .route("/v1/dapis/health", get(controller::health))
        .route("/v1/dapis/:job_id", get(controller::get_dapi))
        .route("/v1/dapis/:job_id", delete(controller::delete_dapi))
        .route(
            "/v1/dapis/:job_id/status",
            post(controller::update_dapi_status),
        )
        .route("/v1/dapis/:job_id/deploy", post(controller::deploy_dapi))
}
