//! Usage counter API endpoints

use api_types::usage::{UsageCountGet, UsageCountResponse, UsageNew, UsageWindow as ApiWindow};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{ServerError, server::ServerState, user, wallet::caller_offset};

fn map_window(window: ApiWindow) -> engine::UsageWindow {
    match window {
        ApiWindow::Day => engine::UsageWindow::Day,
        ApiWindow::Month => engine::UsageWindow::Month,
    }
}

pub async fn record(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<UsageNew>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .record_usage(&payload.subject_id, &payload.action_kind, Utc::now())
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn count(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<UsageCountGet>,
) -> Result<Json<UsageCountResponse>, ServerError> {
    let offset = caller_offset(payload.tz_offset_minutes, &state.engine)?;
    let count = state
        .engine
        .usage_count(
            &payload.subject_id,
            &payload.action_kind,
            map_window(payload.window),
            Utc::now(),
            offset,
        )
        .await?;
    Ok(Json(UsageCountResponse { count }))
}
