//! Redemption API endpoints

use api_types::redemption::{
    RedemptionList, RedemptionListResponse, RedemptionNew, RedemptionStatus as ApiStatus,
    RedemptionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{FixedOffset, Utc};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_status(status: engine::RedemptionStatus) -> ApiStatus {
    match status {
        engine::RedemptionStatus::Requested => ApiStatus::Requested,
        engine::RedemptionStatus::Approved => ApiStatus::Approved,
        engine::RedemptionStatus::Rejected => ApiStatus::Rejected,
        engine::RedemptionStatus::Accepted => ApiStatus::Accepted,
        engine::RedemptionStatus::Fulfilled => ApiStatus::Fulfilled,
        engine::RedemptionStatus::Cancelled => ApiStatus::Cancelled,
    }
}

fn redemption_view(request: engine::RedemptionRequest) -> Result<RedemptionView, ServerError> {
    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    Ok(RedemptionView {
        id: request.id,
        subject_id: request.subject_id,
        requested_points: request.requested_points,
        rate_per_point_minor: request.rate_per_point_minor,
        note: request.note,
        status: map_status(request.status),
        requested_at: request.requested_at.with_timezone(&utc),
        decided_at: request.decided_at.map(|dt| dt.with_timezone(&utc)),
        accepted_at: request.accepted_at.map(|dt| dt.with_timezone(&utc)),
        fulfilled_at: request.fulfilled_at.map(|dt| dt.with_timezone(&utc)),
    })
}

pub async fn create(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<RedemptionNew>,
) -> Result<(StatusCode, Json<RedemptionView>), ServerError> {
    let request = state
        .engine
        .create_redemption(
            &payload.subject_id,
            payload.points,
            payload.note.as_deref(),
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(redemption_view(request)?)))
}

pub async fn list(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<RedemptionList>,
) -> Result<Json<RedemptionListResponse>, ServerError> {
    let requests = state.engine.list_redemptions(&payload.subject_id).await?;
    Ok(Json(RedemptionListResponse {
        redemptions: requests
            .into_iter()
            .map(redemption_view)
            .collect::<Result<Vec<_>, _>>()?,
    }))
}

pub async fn get(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RedemptionView>, ServerError> {
    let request = state.engine.redemption(id).await?;
    Ok(Json(redemption_view(request)?))
}

pub async fn approve(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RedemptionView>, ServerError> {
    let request = state.engine.approve(id, Utc::now()).await?;
    Ok(Json(redemption_view(request)?))
}

pub async fn accept(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RedemptionView>, ServerError> {
    let request = state.engine.accept(id, Utc::now()).await?;
    Ok(Json(redemption_view(request)?))
}

pub async fn fulfill(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RedemptionView>, ServerError> {
    let request = state.engine.fulfill(id, Utc::now()).await?;
    Ok(Json(redemption_view(request)?))
}

pub async fn reject(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RedemptionView>, ServerError> {
    let request = state.engine.reject(id, Utc::now()).await?;
    Ok(Json(redemption_view(request)?))
}

pub async fn cancel(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RedemptionView>, ServerError> {
    let request = state.engine.cancel(id, Utc::now()).await?;
    Ok(Json(redemption_view(request)?))
}
