//! Wallet API endpoint

use api_types::wallet::{WalletGet, WalletView};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::{FixedOffset, Utc};

use crate::{ServerError, entries::map_category, server::ServerState, user};

/// Offset for "today" bucketing: the caller's, or the engine's default.
pub(crate) fn caller_offset(
    tz_offset_minutes: Option<i32>,
    engine: &engine::Engine,
) -> Result<FixedOffset, ServerError> {
    match tz_offset_minutes {
        Some(minutes) => FixedOffset::east_opt(minutes * 60)
            .ok_or_else(|| ServerError::Generic("invalid tz_offset_minutes".to_string())),
        None => Ok(engine.policy().day_offset()),
    }
}

pub async fn get(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<WalletGet>,
) -> Result<Json<WalletView>, ServerError> {
    let offset = caller_offset(payload.tz_offset_minutes, &state.engine)?;
    let snapshot = state
        .engine
        .compute_wallet(&payload.subject_id, Utc::now(), offset)
        .await?;

    Ok(Json(WalletView {
        total_earned: snapshot.total_earned,
        total_spent: snapshot.total_spent,
        reserved: snapshot.reserved,
        available: snapshot.available,
        balance: snapshot.balance,
        per_category: snapshot
            .per_category
            .into_iter()
            .map(|(category, total)| (map_category(category), total))
            .collect(),
        game_points_today: snapshot.game_points_today,
        game_excess_today: snapshot.game_excess_today,
    }))
}
