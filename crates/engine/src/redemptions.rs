//! Redemption request primitives.
//!
//! A `RedemptionRequest` represents a subject's request to convert points
//! into an external reward/payment. Points are deducted from the ledger at
//! the `Accepted` step; `Fulfilled` is purely informational.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Requested,
    Approved,
    Rejected,
    Accepted,
    Fulfilled,
    Cancelled,
}

impl RedemptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Accepted => "accepted",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal requests never change again; transitions on them are no-ops.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Fulfilled | Self::Rejected | Self::Cancelled)
    }

    /// States that still hold a reservation against the wallet.
    pub fn reserves_points(self) -> bool {
        matches!(self, Self::Requested | Self::Approved)
    }
}

impl TryFrom<&str> for RedemptionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "requested" => Ok(Self::Requested),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "accepted" => Ok(Self::Accepted),
            "fulfilled" => Ok(Self::Fulfilled),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidTransition(format!(
                "invalid redemption status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub id: Uuid,
    pub subject_id: String,
    pub requested_points: i64,
    /// Payout rate in minor currency units per point.
    pub rate_per_point_minor: i64,
    pub note: Option<String>,
    pub status: RedemptionStatus,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl RedemptionRequest {
    pub fn new(
        subject_id: String,
        requested_points: i64,
        rate_per_point_minor: i64,
        note: Option<String>,
        requested_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if requested_points <= 0 {
            return Err(EngineError::InvalidAmount(
                "requested_points must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            subject_id,
            requested_points,
            rate_per_point_minor,
            note,
            status: RedemptionStatus::Requested,
            requested_at,
            decided_at: None,
            accepted_at: None,
            fulfilled_at: None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "redemption_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub subject_id: String,
    pub requested_points: i64,
    pub rate_per_point_minor: i64,
    pub note: Option<String>,
    pub status: String,
    pub requested_at: DateTimeUtc,
    pub decided_at: Option<DateTimeUtc>,
    pub accepted_at: Option<DateTimeUtc>,
    pub fulfilled_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RedemptionRequest> for ActiveModel {
    fn from(request: &RedemptionRequest) -> Self {
        Self {
            id: ActiveValue::Set(request.id.to_string()),
            subject_id: ActiveValue::Set(request.subject_id.clone()),
            requested_points: ActiveValue::Set(request.requested_points),
            rate_per_point_minor: ActiveValue::Set(request.rate_per_point_minor),
            note: ActiveValue::Set(request.note.clone()),
            status: ActiveValue::Set(request.status.as_str().to_string()),
            requested_at: ActiveValue::Set(request.requested_at),
            decided_at: ActiveValue::Set(request.decided_at),
            accepted_at: ActiveValue::Set(request.accepted_at),
            fulfilled_at: ActiveValue::Set(request.fulfilled_at),
        }
    }
}

impl TryFrom<Model> for RedemptionRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("redemption not exists".to_string()))?,
            subject_id: model.subject_id,
            requested_points: model.requested_points,
            rate_per_point_minor: model.rate_per_point_minor,
            note: model.note,
            status: RedemptionStatus::try_from(model.status.as_str())?,
            requested_at: model.requested_at,
            decided_at: model.decided_at,
            accepted_at: model.accepted_at,
            fulfilled_at: model.fulfilled_at,
        })
    }
}
