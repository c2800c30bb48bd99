use super::crud;
use super::schema::{
    DeleteUserResponse, GetUserResponse, SaveUserRequest, SaveUserResponse, UserPageResponse,
    UserView,
};
use crate::app::AppState;
use crate::module::error::AppError;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

pub async fn save_user(
    State(state): State<AppState>,
    Json(req): Json<SaveUserRequest>,
) -> impl IntoResponse {
    match crud::save_user(&state, req).await {
        Ok(resp) => {
            info!(user_id = %resp.user_id, "user saved");
            (axum::http::StatusCode::OK, Json(resp))
        }
        Err(err) => (
            err.status,
            Json(SaveUserResponse {
                accepted: false,
                user_id: String::new(),
                error_code: Some(err.code.to_string()),
                reason: err.message,
            }),
        ),
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let page = query.page.unwrap_or(1);
    let size = query.size.unwrap_or(10);
    match crud::page_users(&state, page, size) {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)),
        Err(err) => (
            err.status,
            Json(UserPageResponse {
                size: 0,
                page: 0,
                count: 0,
                list: Vec::new(),
                total: 0,
                all: 0,
                error_code: Some(err.code.to_string()),
                reason: err.message,
            }),
        ),
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match crud::find_user(&state, &user_id).await {
        Ok(Some(user)) => (
            axum::http::StatusCode::OK,
            Json(GetUserResponse {
                found: true,
                user: Some(UserView::from_record(&user)),
                error_code: None,
                reason: "user found".to_string(),
            }),
        ),
        Ok(None) => error_get(AppError::not_found("USER_NOT_FOUND", "user not found")),
        Err(err) => error_get(err),
    }
}

pub async fn get_user_by_address(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    match crud::find_user_by_address(&state, &address) {
        Ok(Some(user)) => (
            axum::http::StatusCode::OK,
            Json(GetUserResponse {
                found: true,
                user: Some(UserView::from_record(&user)),
                error_code: None,
                reason: "user found".to_string(),
            }),
        ),
        Ok(None) => error_get(AppError::not_found(
            "USER_NOT_FOUND",
            "no user owns this wallet",
        )),
        Err(err) => error_get(err),
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match crud::delete_user(&state, &user_id).await {
        Ok(true) => (
            axum::http::StatusCode::OK,
            Json(DeleteUserResponse {
                deleted: true,
                error_code: None,
                reason: "user deleted".to_string(),
            }),
        ),
        Ok(false) => {
            let err = AppError::not_found("USER_NOT_FOUND", "user not found");
            (
                err.status,
                Json(DeleteUserResponse {
                    deleted: false,
                    error_code: Some(err.code.to_string()),
                    reason: err.message,
                }),
            )
        }
        Err(err) => (
            err.status,
            Json(DeleteUserResponse {
                deleted: false,
                error_code: Some(err.code.to_string()),
                reason: err.message,
            }),
        ),
    }
}

fn error_get(err: AppError) -> (axum::http::StatusCode, Json<GetUserResponse>) {
    (
        err.status,
        Json(GetUserResponse {
            found: false,
            user: None,
            error_code: Some(err.code.to_string()),
            reason: err.message,
        }),
    )
}
