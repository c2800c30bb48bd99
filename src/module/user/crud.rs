use super::model::{UserRecord, WalletRecord};
use super::schema::{SaveUserRequest, SaveUserResponse, UserPageResponse, UserView};
use crate::app::AppState;
use crate::infra::{USERS_COLLECTION, USERS_INDEX_KEY};
use crate::module::error::AppError;
use chrono::Utc;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct UserStore {
    inner: Mutex<UserStoreInner>,
}

#[derive(Debug, Default)]
struct UserStoreInner {
    users_by_id: HashMap<String, UserRecord>,
}

pub async fn save_user(
    state: &AppState,
    req: SaveUserRequest,
) -> Result<SaveUserResponse, AppError> {
    if req.wallets.is_empty() {
        return Err(AppError::bad_request(
            "INVALID_WALLETS",
            "at least one wallet is required",
        ));
    }
    for wallet in &req.wallets {
        if wallet.address.trim().is_empty() {
            return Err(AppError::bad_request(
                "INVALID_WALLET_ADDRESS",
                "wallet address is required",
            ));
        }
    }

    let now = Utc::now().timestamp();
    let user = UserRecord {
        id: Uuid::new_v4().to_string(),
        created_at: now,
        updated_at: now,
        wallets: req
            .wallets
            .iter()
            .map(|w| WalletRecord {
                id: Uuid::new_v4().to_string(),
                address: w.address.clone(),
                chain_id: w.chain_id,
            })
            .collect(),
        dapi_ids: Vec::new(),
    };

    {
        let mut inner = lock_store(&state.users)?;
        inner.users_by_id.insert(user.id.clone(), user.clone());
    }
    persist_user(state, &user).await?;

    Ok(SaveUserResponse {
        accepted: true,
        user_id: user.id,
        error_code: None,
        reason: "user saved".to_string(),
    })
}

pub async fn get_user_record(state: &AppState, user_id: &str) -> Result<UserRecord, AppError> {
    if let Some(user) = get_local_user(state, user_id)? {
        return Ok(user);
    }
    if let Some(user) = load_user_from_redis(state, user_id).await? {
        warm_user_in_memory(state, &user)?;
        return Ok(user);
    }
    Err(AppError::not_found("USER_NOT_FOUND", "user not found"))
}

pub async fn find_user(state: &AppState, user_id: &str) -> Result<Option<UserRecord>, AppError> {
    match get_user_record(state, user_id).await {
        Ok(user) => Ok(Some(user)),
        Err(err) if err.code == "USER_NOT_FOUND" => Ok(None),
        Err(err) => Err(err),
    }
}

pub fn find_user_by_address(
    state: &AppState,
    address: &str,
) -> Result<Option<UserRecord>, AppError> {
    let inner = lock_store(&state.users)?;
    Ok(inner
        .users_by_id
        .values()
        .find(|u| u.wallets.iter().any(|w| w.address == address))
        .cloned())
}

pub fn find_all_users(state: &AppState) -> Result<Vec<UserRecord>, AppError> {
    let inner = lock_store(&state.users)?;
    Ok(inner.users_by_id.values().cloned().collect())
}

pub fn count_users(state: &AppState) -> Result<i64, AppError> {
    let inner = lock_store(&state.users)?;
    Ok(inner.users_by_id.len() as i64)
}

pub fn page_users(state: &AppState, page: i64, size: i64) -> Result<UserPageResponse, AppError> {
    if size <= 0 {
        return Err(AppError::bad_request(
            "INVALID_PAGE_SIZE",
            "size must be a positive integer",
        ));
    }
    if page < 1 {
        return Err(AppError::bad_request(
            "INVALID_PAGE_INDEX",
            "page index is 1-based",
        ));
    }

    let mut users = {
        let inner = lock_store(&state.users)?;
        inner.users_by_id.values().cloned().collect::<Vec<_>>()
    };
    users.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let total = users.len() as i64;
    let list = users
        .into_iter()
        .skip(((page - 1) * size) as usize)
        .take(size as usize)
        .map(|u| UserView::from_record(&u))
        .collect::<Vec<_>>();

    Ok(UserPageResponse {
        size,
        page,
        count: list.len(),
        list,
        total,
        all: (total + size - 1) / size,
        error_code: None,
        reason: "users listed".to_string(),
    })
}

pub async fn update_user(state: &AppState, mut user: UserRecord) -> Result<UserRecord, AppError> {
    user.updated_at = Utc::now().timestamp();
    {
        let mut inner = lock_store(&state.users)?;
        if !inner.users_by_id.contains_key(&user.id) {
            return Err(AppError::not_found("USER_NOT_FOUND", "user not found"));
        }
        inner.users_by_id.insert(user.id.clone(), user.clone());
    }
    persist_user(state, &user).await?;
    Ok(user)
}

pub async fn delete_user(state: &AppState, user_id: &str) -> Result<bool, AppError> {
    let removed = {
        let mut inner = lock_store(&state.users)?;
        inner.users_by_id.remove(user_id).is_some()
    };
    if removed {
        delete_user_from_redis(state, user_id).await?;
    }
    Ok(removed)
}

/// Links a freshly submitted job to the user owning the wallet, when
/// one is registered. Jobs from unregistered wallets stay unlinked.
pub fn attach_dapi_to_owner(
    state: &AppState,
    owner_address: &str,
    job_id: &str,
) -> Result<bool, AppError> {
    let mut inner = lock_store(&state.users)?;
    let Some(user) = inner
        .users_by_id
        .values_mut()
        .find(|u| u.wallets.iter().any(|w| w.address == owner_address))
    else {
        return Ok(false);
    };
    if !user.dapi_ids.iter().any(|id| id == job_id) {
        user.dapi_ids.push(job_id.to_string());
        user.updated_at = Utc::now().timestamp();
    }
    Ok(true)
}

fn lock_store(store: &UserStore) -> Result<MutexGuard<'_, UserStoreInner>, AppError> {
    store
        .inner
        .lock()
        .map_err(|_| AppError::internal("STORE_LOCK_ERROR", "user store lock poisoned"))
}

fn get_local_user(state: &AppState, user_id: &str) -> Result<Option<UserRecord>, AppError> {
    let inner = lock_store(&state.users)?;
    Ok(inner.users_by_id.get(user_id).cloned())
}

fn warm_user_in_memory(state: &AppState, user: &UserRecord) -> Result<(), AppError> {
    let mut inner = lock_store(&state.users)?;
    inner.users_by_id.insert(user.id.clone(), user.clone());
    Ok(())
}

async fn load_user_from_redis(
    state: &AppState,
    user_id: &str,
) -> Result<Option<UserRecord>, AppError> {
    let Some(infra) = &state.infra else {
        return Ok(None);
    };
    let mut conn = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::internal("REDIS_CONNECT_FAILED", e.to_string()))?;
    let key = format!("{USERS_COLLECTION}:{user_id}");
    let raw: Option<String> = conn
        .get(key)
        .await
        .map_err(|e| AppError::internal("REDIS_QUERY_FAILED", e.to_string()))?;
    raw.map(|s| serde_json::from_str::<UserRecord>(&s))
        .transpose()
        .map_err(|e| AppError::internal("REDIS_DECODE_FAILED", e.to_string()))
}

async fn persist_user(state: &AppState, user: &UserRecord) -> Result<(), AppError> {
    let Some(infra) = &state.infra else {
        return Ok(());
    };
    let mut conn = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::internal("REDIS_CONNECT_FAILED", e.to_string()))?;
    let key = format!("{USERS_COLLECTION}:{}", user.id);
    let payload = serde_json::to_string(user)
        .map_err(|e| AppError::internal("SERIALIZATION_ERROR", e.to_string()))?;
    let _: () = conn
        .set(key, payload)
        .await
        .map_err(|e| AppError::internal("REDIS_WRITE_FAILED", e.to_string()))?;
    let _: usize = conn
        .sadd(USERS_INDEX_KEY, &user.id)
        .await
        .map_err(|e| AppError::internal("REDIS_WRITE_FAILED", e.to_string()))?;
    Ok(())
}

async fn delete_user_from_redis(state: &AppState, user_id: &str) -> Result<(), AppError> {
    let Some(infra) = &state.infra else {
        return Ok(());
    };
    let mut conn = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::internal("REDIS_CONNECT_FAILED", e.to_string()))?;
    let _: usize = conn
        .del(format!("{USERS_COLLECTION}:{user_id}"))
        .await
        .map_err(|e| AppError::internal("REDIS_WRITE_FAILED", e.to_string()))?;
    let _: usize = conn
        .srem(USERS_INDEX_KEY, user_id)
        .await
        .map_err(|e| AppError::internal("REDIS_WRITE_FAILED", e.to_string()))?;
    Ok(())
}
