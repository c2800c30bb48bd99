use super::crud;
use super::schema::{ChainView, GetChainResponse, ListChainsResponse};
use crate::app::AppState;
use crate::module::error::AppError;
use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

pub async fn list_chains(State(state): State<AppState>) -> impl IntoResponse {
    match crud::list_chains(&state) {
        Ok(chains) => {
            let views = chains.iter().map(ChainView::from_record).collect::<Vec<_>>();
            (
                axum::http::StatusCode::OK,
                Json(ListChainsResponse {
                    count: views.len(),
                    chains: views,
                    error_code: None,
                    reason: "chains listed".to_string(),
                }),
            )
        }
        Err(err) => (
            err.status,
            Json(ListChainsResponse {
                count: 0,
                chains: Vec::new(),
                error_code: Some(err.code.to_string()),
                reason: err.message,
            }),
        ),
    }
}

pub async fn get_chain(
    State(state): State<AppState>,
    Path(chain_id): Path<i64>,
) -> impl IntoResponse {
    match crud::find_by_chain_id(&state, chain_id) {
        Ok(Some(chain)) => (
            axum::http::StatusCode::OK,
            Json(GetChainResponse {
                found: true,
                chain: Some(ChainView::from_record(&chain)),
                error_code: None,
                reason: "chain found".to_string(),
            }),
        ),
        Ok(None) => error_get(AppError::not_found(
            "CHAIN_NOT_FOUND",
            "chain is not registered",
        )),
        Err(err) => error_get(err),
    }
}

fn error_get(err: AppError) -> (axum::http::StatusCode, Json<GetChainResponse>) {
    (
        err.status,
        Json(GetChainResponse {
            found: false,
            chain: None,
            error_code: Some(err.code.to_string()),
            reason: err.message,
        }),
    )
}
