use super::crud;
use super::schema::{
    DapiPageResponse, DeleteDapiResponse, DeployDapiResponse, GetDapiResponse, HealthMetricsView,
    HealthResponse, JobStatus, SubmitDapiRequest, SubmitDapiResponse, UpdateDapiStatusRequest,
    UpdateDapiStatusResponse,
};
use crate::app::AppState;
use crate::module::error::AppError;
use crate::service::deploy_service;
use crate::service::metrics_service;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use redis::AsyncCommands;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeployQuery {
    pub variant: Option<String>,
}

pub async fn submit_dapi(
    State(state): State<AppState>,
    Json(req): Json<SubmitDapiRequest>,
) -> impl IntoResponse {
    match crud::submit_dapi(&state, req).await {
        Ok(resp) => {
            info!(job_id = %resp.job_id, "dapi job accepted");
            if state.config.deploy_enabled {
                let variant = deploy_service::resolve_variant(&state.config, None);
                deploy_service::spawn_deployment(state.clone(), resp.job_id.clone(), variant);
            }
            (axum::http::StatusCode::OK, Json(resp))
        }
        Err(err) => error_submit(err),
    }
}

pub async fn list_dapis(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let page = query.page.unwrap_or(1);
    let size = query.size.unwrap_or(10);
    // listings default to finished jobs, matching the public catalogue
    let filter = match query.status.as_deref() {
        None => Some(JobStatus::Done),
        Some("ALL") => None,
        Some(name) => match JobStatus::from_name(name) {
            Some(status) => Some(status),
            None => {
                return error_page(AppError::bad_request(
                    "INVALID_STATUS_FILTER",
                    format!("unknown status: {name}"),
                ));
            }
        },
    };

    match crud::page_dapis(&state, page, size, filter) {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)),
        Err(err) => error_page(err),
    }
}

pub async fn get_dapi(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    match crud::find_dapi(&state, &job_id).await {
        Ok(Some(job)) => (
            axum::http::StatusCode::OK,
            Json(GetDapiResponse {
                found: true,
                dapi: Some(crud::to_view(&job)),
                error_code: None,
                reason: "dapi job found".to_string(),
            }),
        ),
        Ok(None) => error_get(AppError::not_found("JOB_NOT_FOUND", "dapi job not found")),
        Err(err) => error_get(err),
    }
}

pub async fn update_dapi_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(req): Json<UpdateDapiStatusRequest>,
) -> impl IntoResponse {
    match crud::update_status(&state, &job_id, req.next_status).await {
        Ok((job, idempotent)) => (
            axum::http::StatusCode::OK,
            Json(UpdateDapiStatusResponse {
                updated: true,
                idempotent,
                dapi: Some(crud::to_view(&job)),
                error_code: None,
                reason: if idempotent {
                    "status update is idempotent".to_string()
                } else {
                    "status updated".to_string()
                },
            }),
        ),
        Err(err) => (
            err.status,
            Json(UpdateDapiStatusResponse {
                updated: false,
                idempotent: false,
                dapi: None,
                error_code: Some(err.code.to_string()),
                reason: err.message,
            }),
        ),
    }
}

pub async fn deploy_dapi(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<DeployQuery>,
) -> impl IntoResponse {
    let variant = deploy_service::resolve_variant(&state.config, query.variant.as_deref());
    match crud::find_dapi(&state, &job_id).await {
        Ok(Some(job)) => {
            info!(job_id = %job.id, variant = variant.as_str(), "deployment requested");
            deploy_service::spawn_deployment(state.clone(), job.id.clone(), variant);
            (
                axum::http::StatusCode::OK,
                Json(DeployDapiResponse {
                    accepted: true,
                    job_id: job.id,
                    variant: variant.as_str().to_string(),
                    error_code: None,
                    reason: "deployment scheduled".to_string(),
                }),
            )
        }
        Ok(None) => error_deploy(
            AppError::not_found("JOB_NOT_FOUND", "dapi job not found"),
            &job_id,
            variant.as_str(),
        ),
        Err(err) => error_deploy(err, &job_id, variant.as_str()),
    }
}

pub async fn delete_dapi(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    match crud::delete_dapi(&state, &job_id).await {
        Ok(true) => (
            axum::http::StatusCode::OK,
            Json(DeleteDapiResponse {
                deleted: true,
                error_code: None,
                reason: "dapi job deleted".to_string(),
            }),
        ),
        Ok(false) => {
            let err = AppError::not_found("JOB_NOT_FOUND", "dapi job not found");
            (
                err.status,
                Json(DeleteDapiResponse {
                    deleted: false,
                    error_code: Some(err.code.to_string()),
                    reason: err.message,
                }),
            )
        }
        Err(err) => (
            err.status,
            Json(DeleteDapiResponse {
                deleted: false,
                error_code: Some(err.code.to_string()),
                reason: err.message,
            }),
        ),
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let redis_available = match &state.infra {
        Some(infra) => match infra.redis.get_multiplexed_async_connection().await {
            Ok(mut conn) => conn.get::<_, Option<String>>("health:probe").await.is_ok(),
            Err(_) => false,
        },
        None => false,
    };

    let snapshot = metrics_service::snapshot();
    (
        axum::http::StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            redis_available,
            deploy_enabled: state.config.deploy_enabled,
            metrics: HealthMetricsView {
                jobs_submitted: snapshot.jobs_submitted,
                deployments_started: snapshot.deployments_started,
                deployments_completed: snapshot.deployments_completed,
                deployments_failed: snapshot.deployments_failed,
                status_events_broadcast: snapshot.status_events_broadcast,
                deploy_duration_count: snapshot.deploy_duration_count,
                deploy_duration_avg_ms: snapshot.deploy_duration_avg_ms,
                last_error_ts: snapshot.last_error_ts,
            },
            error_code: None,
            reason: "ok".to_string(),
        }),
    )
}

fn error_submit(err: AppError) -> (axum::http::StatusCode, Json<SubmitDapiResponse>) {
    (
        err.status,
        Json(SubmitDapiResponse {
            accepted: false,
            job_id: String::new(),
            status: None,
            error_code: Some(err.code.to_string()),
            reason: err.message,
        }),
    )
}

fn error_page(err: AppError) -> (axum::http::StatusCode, Json<DapiPageResponse>) {
    (
        err.status,
        Json(DapiPageResponse {
            size: 0,
            page: 0,
            count: 0,
            list: Vec::new(),
            total: 0,
            all: 0,
            error_code: Some(err.code.to_string()),
            reason: err.message,
        }),
    )
}

fn error_get(err: AppError) -> (axum::http::StatusCode, Json<GetDapiResponse>) {
    (
        err.status,
        Json(GetDapiResponse {
            found: false,
            dapi: None,
            error_code: Some(err.code.to_string()),
            reason: err.message,
        }),
    )
}

fn error_deploy(
    err: AppError,
    job_id: &str,
    variant: &str,
) -> (axum::http::StatusCode, Json<DeployDapiResponse>) {
    (
        err.status,
        Json(DeployDapiResponse {
            accepted: false,
            job_id: job_id.to_string(),
            variant: variant.to_string(),
            error_code: Some(err.code.to_string()),
            reason: err.message,
        }),
    )
}
