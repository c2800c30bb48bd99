use super::controller;
use crate::app::AppState;
use axum::Router;
use axum::routing::{delete, get, post};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/users", post(controller::save_user))
        .route("/v1/users", get(controller::list_users))
        .route(
            "/v1/users/address/:address",
            get(controller::get_user_by_address),
        )
        .route("/v1/users/:user_id", get(controller::get_user))
        .route("/v1/users/:user_id", delete(controller::delete_user))
}
