use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

static JOBS_SUBMITTED: AtomicU64 = AtomicU64::new(0);
static DEPLOYMENTS_STARTED: AtomicU64 = AtomicU64::new(0);
static DEPLOYMENTS_COMPLETED: AtomicU64 = AtomicU64::new(0);
static DEPLOYMENTS_FAILED: AtomicU64 = AtomicU64::new(0);
static STATUS_EVENTS_BROADCAST: AtomicU64 = AtomicU64::new(0);

static DEPLOY_DURATION_COUNT: AtomicU64 = AtomicU64::new(0);
static DEPLOY_DURATION_TOTAL_MS: AtomicU64 = AtomicU64::new(0);

static LAST_ERROR_TS: AtomicI64 = AtomicI64::new(0);

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub jobs_submitted: u64,
    pub deployments_started: u64,
    pub deployments_completed: u64,
    pub deployments_failed: u64,
    pub status_events_broadcast: u64,
    pub deploy_duration_count: u64,
    pub deploy_duration_avg_ms: u64,
    pub last_error_ts: i64,
}

pub fn inc_jobs_submitted() {
    JOBS_SUBMITTED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_deployments_started() {
    DEPLOYMENTS_STARTED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_deployments_completed() {
    DEPLOYMENTS_COMPLETED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_deployments_failed() {
    DEPLOYMENTS_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_status_events_broadcast() {
    STATUS_EVENTS_BROADCAST.fetch_add(1, Ordering::Relaxed);
}

pub fn record_deploy_duration_ms(duration_ms: u64) {
    DEPLOY_DURATION_COUNT.fetch_add(1, Ordering::Relaxed);
    DEPLOY_DURATION_TOTAL_MS.fetch_add(duration_ms, Ordering::Relaxed);
}

pub fn set_last_error_ts(ts: i64) {
    LAST_ERROR_TS.store(ts, Ordering::Relaxed);
}

pub fn snapshot() -> MetricsSnapshot {
    let deploy_count = DEPLOY_DURATION_COUNT.load(Ordering::Relaxed);

    MetricsSnapshot {
        jobs_submitted: JOBS_SUBMITTED.load(Ordering::Relaxed),
        deployments_started: DEPLOYMENTS_STARTED.load(Ordering::Relaxed),
        deployments_completed: DEPLOYMENTS_COMPLETED.load(Ordering::Relaxed),
        deployments_failed: DEPLOYMENTS_FAILED.load(Ordering::Relaxed),
        status_events_broadcast: STATUS_EVENTS_BROADCAST.load(Ordering::Relaxed),
        deploy_duration_count: deploy_count,
        deploy_duration_avg_ms: if deploy_count > 0 {
            DEPLOY_DURATION_TOTAL_MS.load(Ordering::Relaxed) / deploy_count
        } else {
            0
        },
        last_error_ts: LAST_ERROR_TS.load(Ordering::Relaxed),
    }
}
