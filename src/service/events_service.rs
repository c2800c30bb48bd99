use crate::app::AppState;
use crate::module::dapi::crud;
use crate::module::dapi::model::DapiRecord;
use crate::module::dapi::schema::JobStatus;
use crate::module::error::AppError;
use crate::service::metrics_service;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub job_id: String,
    pub status: String,
    pub progress: i64,
}

/// Fan-out channel for job status updates. Delivery is best-effort:
/// slow subscribers are lagged out, disconnected ones are dropped.
#[derive(Debug, Clone)]
pub struct StatusChannel {
    tx: broadcast::Sender<StatusEvent>,
}

impl StatusChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }

    pub fn broadcast(&self, event: StatusEvent) -> usize {
        metrics_service::inc_status_events_broadcast();
        match self.tx.send(event) {
            Ok(subscribers) => subscribers,
            Err(_) => 0,
        }
    }
}

/// Persists the transition first, then broadcasts it, so subscribers
/// never observe a status the store does not hold.
pub async fn emit_status(
    state: &AppState,
    job_id: &str,
    status: JobStatus,
) -> Result<DapiRecord, AppError> {
    let (job, idempotent) = crud::update_status(state, job_id, status).await?;
    if !idempotent {
        let subscribers = state.events.broadcast(StatusEvent {
            job_id: job_id.to_string(),
            status: status.as_str().to_string(),
            progress: status.progress(),
        });
        debug!(job_id = %job_id, status = status.as_str(), subscribers, "status broadcast");
    }
    Ok(job)
}

pub async fn ws_status(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_status(socket, state))
}

async fn stream_status(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut rx = state.events.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "status subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
