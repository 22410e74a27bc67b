//! Route handlers translating HTTP calls into registry requests.

use std::collections::BTreeMap;
use std::time::Duration;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::actor::AskError;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::registry::{GroupId, LeafId, Reading, RequestId};

/// Upper bound accepted for a per-request aggregate deadline.
pub const MAX_AGGREGATE_TIMEOUT_MS: u64 = 60_000;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct GroupsResponse {
    pub request_id: RequestId,
    pub groups: Vec<GroupId>,
}

#[derive(Serialize)]
pub struct DevicesResponse {
    pub request_id: RequestId,
    pub devices: Vec<LeafId>,
}

#[derive(Serialize)]
pub struct TrackedResponse {
    pub group: GroupId,
    pub device: LeafId,
}

#[derive(Deserialize)]
pub struct RecordBody {
    pub value: f64,
}

#[derive(Serialize)]
pub struct RecordedResponse {
    pub request_id: RequestId,
}

#[derive(Serialize)]
pub struct ReadingResponse {
    pub request_id: RequestId,
    pub device: LeafId,
    pub value: Option<f64>,
}

#[derive(Deserialize)]
pub struct ReadingsQuery {
    pub timeout_ms: Option<u64>,
}

#[derive(Serialize)]
pub struct ReadingsResponse {
    pub request_id: RequestId,
    pub readings: BTreeMap<LeafId, Reading>,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn list_groups(State(state): State<AppState>) -> Result<Json<GroupsResponse>, ApiError> {
    let list = state.client.list_groups().await?;
    Ok(Json(GroupsResponse {
        request_id: list.request_id,
        groups: list.ids.into_iter().collect(),
    }))
}

pub async fn list_devices(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Json<DevicesResponse>, ApiError> {
    let list = state.client.list_leaves(&group).await?;
    Ok(Json(DevicesResponse {
        request_id: list.request_id,
        devices: list.ids.into_iter().collect(),
    }))
}

pub async fn track_device(
    State(state): State<AppState>,
    Path((group, device)): Path<(String, String)>,
) -> Result<(StatusCode, Json<TrackedResponse>), ApiError> {
    state.client.track(&group, &device).await?;
    tracing::debug!(group = %group, device = %device, "Device tracked");
    Ok((StatusCode::CREATED, Json(TrackedResponse { group, device })))
}

pub async fn record_reading(
    State(state): State<AppState>,
    Path((group, device)): Path<(String, String)>,
    Json(body): Json<RecordBody>,
) -> Result<Json<RecordedResponse>, ApiError> {
    if !body.value.is_finite() {
        return Err(ApiError::BadRequest("value must be a finite number".to_string()));
    }
    let leaf = state.client.track(&group, &device).await?;
    let ack = state.client.record(&leaf, body.value).await?;
    Ok(Json(RecordedResponse {
        request_id: ack.request_id,
    }))
}

pub async fn read_device(
    State(state): State<AppState>,
    Path((group, device)): Path<(String, String)>,
) -> Result<Json<ReadingResponse>, ApiError> {
    let Some(leaf) = state.client.find(&group, &device).await? else {
        return Err(ApiError::DeviceNotFound { group, device });
    };
    match state.client.read(&leaf).await {
        Ok(result) => Ok(Json(ReadingResponse {
            request_id: result.request_id,
            device: result.leaf_id,
            value: result.value,
        })),
        // The device stopped between the lookup and the read.
        Err(AskError::Closed) | Err(AskError::NoReply) => Err(ApiError::DeviceNotFound { group, device }),
        Err(e) => Err(e.into()),
    }
}

pub async fn passivate_device(
    State(state): State<AppState>,
    Path((group, device)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let Some(leaf) = state.client.find(&group, &device).await? else {
        return Err(ApiError::DeviceNotFound { group, device });
    };
    if !state.client.passivate(&leaf) {
        return Err(ApiError::DeviceNotFound { group, device });
    }
    tracing::debug!(group = %group, device = %device, "Device passivated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn group_readings(
    State(state): State<AppState>,
    Path(group): Path<String>,
    Query(query): Query<ReadingsQuery>,
) -> Result<Json<ReadingsResponse>, ApiError> {
    let timeout = match query.timeout_ms {
        Some(0) => return Err(ApiError::BadRequest("timeout_ms must be greater than zero".to_string())),
        Some(ms) if ms > MAX_AGGREGATE_TIMEOUT_MS => {
            return Err(ApiError::BadRequest(format!(
                "timeout_ms must not exceed {}",
                MAX_AGGREGATE_TIMEOUT_MS
            )))
        }
        Some(ms) => Some(Duration::from_millis(ms)),
        None => None,
    };

    if !state.client.list_groups().await?.ids.contains(&group) {
        return Err(ApiError::GroupNotFound(group));
    }

    match state.client.aggregate(&group, timeout).await {
        Ok(result) => Ok(Json(ReadingsResponse {
            request_id: result.request_id,
            readings: result.readings,
        })),
        // The group stopped between the lookup and the read.
        Err(AskError::NoReply) => Err(ApiError::GroupNotFound(group)),
        Err(e) => Err(e.into()),
    }
}
