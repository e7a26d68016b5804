//! Ledger entry API endpoints

use api_types::entry::{AwardNew, EntryList, EntryListResponse, EntryView};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{FixedOffset, Utc};

use crate::{ServerError, server::ServerState, user};

pub(crate) fn map_category(category: engine::Category) -> api_types::Category {
    match category {
        engine::Category::Daily => api_types::Category::Daily,
        engine::Category::Checklists => api_types::Category::Checklists,
        engine::Category::Games => api_types::Category::Games,
        engine::Category::Targets => api_types::Category::Targets,
        engine::Category::Wishlist => api_types::Category::Wishlist,
        engine::Category::RewardEncourage => api_types::Category::RewardEncourage,
        engine::Category::RewardRedemption => api_types::Category::RewardRedemption,
        engine::Category::Other => api_types::Category::Other,
    }
}

fn entry_view(entry: engine::LedgerEntry, offset: FixedOffset) -> EntryView {
    EntryView {
        id: entry.id,
        subject_id: entry.subject_id,
        amount: entry.amount,
        category: map_category(engine::classify(&entry.reason)),
        reason: entry.reason,
        created_at: entry.created_at.with_timezone(&offset),
        evidence_count: entry.evidence_count,
        source_key: entry.source_key,
        source: entry.source.as_str().to_string(),
    }
}

pub async fn award(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AwardNew>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let created_at = payload
        .created_at
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let entry = state
        .engine
        .award(engine::AwardCmd {
            subject_id: payload.subject_id,
            amount: payload.amount,
            reason: payload.reason,
            source_key: payload.source_key,
            evidence_count: payload.evidence_count.unwrap_or(0),
            created_at,
        })
        .await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    Ok((StatusCode::CREATED, Json(entry_view(entry, utc))))
}

pub async fn list(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<EntryList>,
) -> Result<Json<EntryListResponse>, ServerError> {
    let since = payload.since.map(|dt| dt.with_timezone(&Utc));
    let entries = state
        .engine
        .load_entries_for(&payload.subject_id, since)
        .await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    Ok(Json(EntryListResponse {
        entries: entries
            .into_iter()
            .map(|entry| entry_view(entry, utc))
            .collect(),
    }))
}
