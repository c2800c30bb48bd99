use super::model::{DapiRecord, OracleInfoRecord, Web2InfoRecord};
use super::schema::{
    DapiPageResponse, DapiView, JobStatus, JobStatusTransition, OracleInfoView, SubmitDapiRequest,
    SubmitDapiResponse, Web2InfoView,
};
use crate::app::AppState;
use crate::infra::{DAPIS_COLLECTION, DAPIS_INDEX_KEY, DAPI_STATUS_ATTEMPTS_COLLECTION};
use crate::module::error::AppError;
use crate::module::{chain, user};
use crate::service::hash_service::sha256_hex;
use crate::service::metrics_service;
use crate::service::validation_service::validate_submit_request;
use chrono::Utc;
use redis::AsyncCommands;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct DapiStore {
    inner: Mutex<DapiStoreInner>,
}

#[derive(Debug, Default)]
struct DapiStoreInner {
    jobs_by_id: HashMap<String, DapiRecord>,
}

pub async fn submit_dapi(
    state: &AppState,
    req: SubmitDapiRequest,
) -> Result<SubmitDapiResponse, AppError> {
    validate_submit_request(&req)?;

    let source = chain::crud::find_by_chain_id(state, req.oracle_info.source_chain_id)?;
    let target = chain::crud::find_by_chain_id(state, req.oracle_info.target_chain_id)?;
    if source.is_none() || target.is_none() {
        return Err(AppError::bad_request(
            "CHAIN_NOT_SUPPORTED",
            "this chain is not supported",
        ));
    }

    let now = Utc::now().timestamp();
    let job = DapiRecord {
        id: Uuid::new_v4().to_string(),
        owner_address: req.owner_address.clone(),
        status: JobStatus::Created,
        created_at: now,
        updated_at: now,
        oracle_info: OracleInfoRecord {
            id: Uuid::new_v4().to_string(),
            source_chain_id: req.oracle_info.source_chain_id,
            target_chain_id: req.oracle_info.target_chain_id,
            address: String::new(),
            anchor: String::new(),
            web2_info: Web2InfoRecord {
                id: Uuid::new_v4().to_string(),
                uri: req.oracle_info.web2_info.uri.clone(),
                method: req.oracle_info.web2_info.method.clone(),
                auth: req.oracle_info.web2_info.auth,
            },
        },
        transitions: vec![JobStatusTransition {
            from_status: None,
            to_status: JobStatus::Created,
            transitioned_at: now,
        }],
    };

    // The embedded oracle and web2 records land with the job in one
    // insert; either all three exist afterwards or none do.
    {
        let mut inner = lock_store(&state.dapis)?;
        inner.jobs_by_id.insert(job.id.clone(), job.clone());
    }

    persist_dapi(state, &job).await?;
    persist_status_attempt(state, &job.id, None, JobStatus::Created).await?;
    if let Err(err) = user::crud::attach_dapi_to_owner(state, &req.owner_address, &job.id) {
        warn!(job_id = %job.id, error = %err.message, "owner linkage failed");
    }
    metrics_service::inc_jobs_submitted();

    Ok(SubmitDapiResponse {
        accepted: true,
        job_id: job.id,
        status: Some(JobStatus::Created),
        error_code: None,
        reason: "dapi job accepted".to_string(),
    })
}

pub async fn get_dapi_record(state: &AppState, job_id: &str) -> Result<DapiRecord, AppError> {
    if let Some(job) = get_local_job(state, job_id)? {
        return Ok(job);
    }
    if let Some(job) = load_dapi_from_redis(state, job_id).await? {
        warm_dapi_in_memory(state, &job)?;
        return Ok(job);
    }
    Err(AppError::not_found("JOB_NOT_FOUND", "dapi job not found"))
}

pub async fn find_dapi(state: &AppState, job_id: &str) -> Result<Option<DapiRecord>, AppError> {
    match get_dapi_record(state, job_id).await {
        Ok(job) => Ok(Some(job)),
        Err(err) if err.code == "JOB_NOT_FOUND" => Ok(None),
        Err(err) => Err(err),
    }
}

pub fn find_all_dapis(state: &AppState) -> Result<Vec<DapiRecord>, AppError> {
    let inner = lock_store(&state.dapis)?;
    Ok(inner.jobs_by_id.values().cloned().collect())
}

pub fn count_dapis(state: &AppState) -> Result<i64, AppError> {
    let inner = lock_store(&state.dapis)?;
    Ok(inner.jobs_by_id.len() as i64)
}

pub fn page_dapis(
    state: &AppState,
    page: i64,
    size: i64,
    filter: Option<JobStatus>,
) -> Result<DapiPageResponse, AppError> {
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

    let mut jobs = {
        let inner = lock_store(&state.dapis)?;
        inner
            .jobs_by_id
            .values()
            .filter(|j| filter.map_or(true, |s| j.status == s))
            .cloned()
            .collect::<Vec<_>>()
    };
    // id tiebreak keeps same-second records from straddling page borders
    jobs.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let total = jobs.len() as i64;
    let list = jobs
        .into_iter()
        .skip(((page - 1) * size) as usize)
        .take(size as usize)
        .map(|j| to_view(&j))
        .collect::<Vec<_>>();

    Ok(DapiPageResponse {
        size,
        page,
        count: list.len(),
        list,
        total,
        all: page_count(total, size),
        error_code: None,
        reason: "dapi jobs listed".to_string(),
    })
}

pub async fn save_dapi(state: &AppState, job: DapiRecord) -> Result<(), AppError> {
    {
        let mut inner = lock_store(&state.dapis)?;
        inner.jobs_by_id.insert(job.id.clone(), job.clone());
    }
    persist_dapi(state, &job).await
}

pub async fn update_dapi(state: &AppState, mut job: DapiRecord) -> Result<DapiRecord, AppError> {
    job.updated_at = Utc::now().timestamp();
    {
        let mut inner = lock_store(&state.dapis)?;
        if !inner.jobs_by_id.contains_key(&job.id) {
            return Err(AppError::not_found("JOB_NOT_FOUND", "dapi job not found"));
        }
        inner.jobs_by_id.insert(job.id.clone(), job.clone());
    }
    persist_dapi(state, &job).await?;
    Ok(job)
}

/// Moves a job's status forward. Regressions are rejected; re-applying
/// the current status is an idempotent no-op. A persistence failure is
/// a hard error for the caller, not a logged aside.
pub async fn update_status(
    state: &AppState,
    job_id: &str,
    next_status: JobStatus,
) -> Result<(DapiRecord, bool), AppError> {
    let (job, from_status, idempotent) = {
        let mut inner = lock_store(&state.dapis)?;
        let job = inner
            .jobs_by_id
            .get_mut(job_id)
            .ok_or_else(|| AppError::not_found("JOB_NOT_FOUND", "dapi job not found"))?;

        if next_status == job.status {
            (job.clone(), None, true)
        } else {
            if next_status.ordinal() < job.status.ordinal() {
                return Err(AppError::conflict(
                    "STATUS_REGRESSION",
                    format!(
                        "cannot move from {} back to {}",
                        job.status.as_str(),
                        next_status.as_str()
                    ),
                ));
            }
            let now = Utc::now().timestamp();
            let previous = job.status;
            job.status = next_status;
            job.updated_at = now;
            job.transitions.push(JobStatusTransition {
                from_status: Some(previous),
                to_status: next_status,
                transitioned_at: now,
            });
            (job.clone(), Some(previous), false)
        }
    };

    if !idempotent {
        persist_dapi(state, &job).await?;
        persist_status_attempt(state, job_id, from_status, next_status).await?;
    }
    Ok((job, idempotent))
}

pub async fn set_oracle_address(
    state: &AppState,
    job_id: &str,
    address: &str,
) -> Result<DapiRecord, AppError> {
    let job = {
        let mut inner = lock_store(&state.dapis)?;
        let job = inner
            .jobs_by_id
            .get_mut(job_id)
            .ok_or_else(|| AppError::not_found("JOB_NOT_FOUND", "dapi job not found"))?;
        job.oracle_info.address = address.to_string();
        job.updated_at = Utc::now().timestamp();
        job.clone()
    };
    persist_dapi(state, &job).await?;
    Ok(job)
}

pub async fn set_anchor_address(
    state: &AppState,
    job_id: &str,
    anchor: &str,
) -> Result<DapiRecord, AppError> {
    let job = {
        let mut inner = lock_store(&state.dapis)?;
        let job = inner
            .jobs_by_id
            .get_mut(job_id)
            .ok_or_else(|| AppError::not_found("JOB_NOT_FOUND", "dapi job not found"))?;
        job.oracle_info.anchor = anchor.to_string();
        job.updated_at = Utc::now().timestamp();
        job.clone()
    };
    persist_dapi(state, &job).await?;
    Ok(job)
}

pub async fn delete_dapi(state: &AppState, job_id: &str) -> Result<bool, AppError> {
    let removed = {
        let mut inner = lock_store(&state.dapis)?;
        inner.jobs_by_id.remove(job_id).is_some()
    };
    if removed {
        delete_dapi_from_redis(state, job_id).await?;
    }
    Ok(removed)
}

/// Rebuilds the in-memory store from the Redis mirror after a restart
/// so listings and resumable deployments see pre-restart jobs.
pub async fn warm_store_from_redis(state: &AppState) -> Result<usize, AppError> {
    let Some(infra) = &state.infra else {
        return Ok(0);
    };
    let mut conn = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::internal("REDIS_CONNECT_FAILED", e.to_string()))?;
    let job_ids: Vec<String> = conn
        .smembers(DAPIS_INDEX_KEY)
        .await
        .map_err(|e| AppError::internal("REDIS_QUERY_FAILED", e.to_string()))?;

    let mut warmed = 0;
    for job_id in job_ids {
        if let Some(job) = load_dapi_from_redis(state, &job_id).await? {
            warm_dapi_in_memory(state, &job)?;
            warmed += 1;
        }
    }
    Ok(warmed)
}

pub fn to_view(job: &DapiRecord) -> DapiView {
    DapiView {
        id: job.id.clone(),
        owner_address: job.owner_address.clone(),
        status: job.status,
        progress: job.status.progress(),
        created_at: job.created_at,
        updated_at: job.updated_at,
        oracle_info: OracleInfoView {
            id: job.oracle_info.id.clone(),
            source_chain_id: job.oracle_info.source_chain_id,
            target_chain_id: job.oracle_info.target_chain_id,
            address: job.oracle_info.address.clone(),
            anchor: job.oracle_info.anchor.clone(),
            web2_info: Web2InfoView {
                id: job.oracle_info.web2_info.id.clone(),
                uri: job.oracle_info.web2_info.uri.clone(),
                method: job.oracle_info.web2_info.method.clone(),
                auth: job.oracle_info.web2_info.auth,
            },
        },
        transitions: job.transitions.clone(),
    }
}

fn page_count(total: i64, size: i64) -> i64 {
    (total + size - 1) / size
}

fn lock_store(store: &DapiStore) -> Result<MutexGuard<'_, DapiStoreInner>, AppError> {
    store
        .inner
        .lock()
        .map_err(|_| AppError::internal("STORE_LOCK_ERROR", "dapi store lock poisoned"))
}

fn get_local_job(state: &AppState, job_id: &str) -> Result<Option<DapiRecord>, AppError> {
    let inner = lock_store(&state.dapis)?;
    Ok(inner.jobs_by_id.get(job_id).cloned())
}

fn warm_dapi_in_memory(state: &AppState, job: &DapiRecord) -> Result<(), AppError> {
    let mut inner = lock_store(&state.dapis)?;
    inner.jobs_by_id.insert(job.id.clone(), job.clone());
    Ok(())
}

async fn load_dapi_from_redis(
    state: &AppState,
    job_id: &str,
) -> Result<Option<DapiRecord>, AppError> {
    let Some(infra) = &state.infra else {
        return Ok(None);
    };
    let mut conn = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::internal("REDIS_CONNECT_FAILED", e.to_string()))?;
    let key = format!("{DAPIS_COLLECTION}:{job_id}");
    let raw: Option<String> = conn
        .get(key)
        .await
        .map_err(|e| AppError::internal("REDIS_QUERY_FAILED", e.to_string()))?;
    raw.map(|s| serde_json::from_str::<DapiRecord>(&s))
        .transpose()
        .map_err(|e| AppError::internal("REDIS_DECODE_FAILED", e.to_string()))
}

async fn persist_dapi(state: &AppState, job: &DapiRecord) -> Result<(), AppError> {
    let Some(infra) = &state.infra else {
        return Ok(());
    };
    let mut conn = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::internal("REDIS_CONNECT_FAILED", e.to_string()))?;
    let key = format!("{DAPIS_COLLECTION}:{}", job.id);
    let payload = serde_json::to_string(job)
        .map_err(|e| AppError::internal("SERIALIZATION_ERROR", e.to_string()))?;
    let _: () = conn
        .set(key, payload)
        .await
        .map_err(|e| AppError::internal("REDIS_WRITE_FAILED", e.to_string()))?;
    let _: usize = conn
        .sadd(DAPIS_INDEX_KEY, &job.id)
        .await
        .map_err(|e| AppError::internal("REDIS_WRITE_FAILED", e.to_string()))?;
    Ok(())
}

async fn persist_status_attempt(
    state: &AppState,
    job_id: &str,
    from_status: Option<JobStatus>,
    to_status: JobStatus,
) -> Result<(), AppError> {
    let Some(infra) = &state.infra else {
        return Ok(());
    };
    let mut conn = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::internal("REDIS_CONNECT_FAILED", e.to_string()))?;
    let now = Utc::now().timestamp();
    let from_status_str = from_status.as_ref().map(|s| s.as_str().to_string());
    let record = json!({
        "job_id": job_id,
        "from_status": from_status_str,
        "to_status": to_status.as_str(),
        "transitioned_at": now,
        "evidence_hash": sha256_hex(&format!("{job_id}:{now}:{:?}:{:?}", from_status, to_status)),
    });
    let key = format!("{DAPI_STATUS_ATTEMPTS_COLLECTION}:{job_id}");
    let payload = serde_json::to_string(&record)
        .map_err(|e| AppError::internal("SERIALIZATION_ERROR", e.to_string()))?;
    let _: usize = conn
        .lpush(key, payload)
        .await
        .map_err(|e| AppError::internal("REDIS_WRITE_FAILED", e.to_string()))?;
    Ok(())
}

async fn delete_dapi_from_redis(state: &AppState, job_id: &str) -> Result<(), AppError> {
    let Some(infra) = &state.infra else {
        return Ok(());
    };
    let mut conn = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::internal("REDIS_CONNECT_FAILED", e.to_string()))?;
    let _: usize = conn
        .del(format!("{DAPIS_COLLECTION}:{job_id}"))
        .await
        .map_err(|e| AppError::internal("REDIS_WRITE_FAILED", e.to_string()))?;
    let _: usize = conn
        .srem(DAPIS_INDEX_KEY, job_id)
        .await
        .map_err(|e| AppError::internal("REDIS_WRITE_FAILED", e.to_string()))?;
    Ok(())
}
