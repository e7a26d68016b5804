//! Cash-out request workflow.
//!
//! `Requested -> Approved -> Accepted -> Fulfilled`, with `Rejected` from
//! `Requested` and `Cancelled` from `Requested|Approved`. Points leave the
//! ledger at `Accepted` (the step the rest of the system treats as "points
//! deducted"); `Fulfilled` only records that the payout was delivered.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use uuid::Uuid;

use crate::events::{ChangeEvent, ChangeOp};
use crate::redemptions::{RedemptionRequest, RedemptionStatus};
use crate::{EngineError, LedgerEntry, ResultEngine, entries, redemptions, wallet};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Creates a `Requested` cash-out. No ledger entry is written yet; the
    /// request only reserves points until it is decided.
    pub async fn create_redemption(
        &self,
        raw_key: &str,
        points: i64,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> ResultEngine<RedemptionRequest> {
        if points < self.policy.redemption_minimum {
            return Err(EngineError::InsufficientBalance(
                "requested points below minimum".to_string(),
            ));
        }

        let ids = self.resolve_identities(raw_key).await?;
        let snapshot = self
            .compute_wallet(&ids.canonical, now, self.policy.day_offset())
            .await?;
        if points > snapshot.available {
            return Err(EngineError::InsufficientBalance(
                "requested points exceed available balance".to_string(),
            ));
        }

        let request = RedemptionRequest::new(
            ids.canonical,
            points,
            self.policy.rate_per_point_minor,
            normalize_optional_text(note),
            now,
        )?;
        redemptions::ActiveModel::from(&request)
            .insert(&self.database)
            .await?;

        tracing::info!(
            subject_id = %request.subject_id,
            points,
            "redemption requested"
        );
        self.publish(ChangeEvent {
            subject_id: request.subject_id.clone(),
            table: "redemption_requests",
            op: ChangeOp::Insert,
        });
        Ok(request)
    }

    /// `Requested -> Approved`. Re-checks that the requested points still
    /// fit in the available balance (ignoring this request's own
    /// reservation), since awards and other requests may have moved it.
    pub async fn approve(&self, request_id: Uuid, now: DateTime<Utc>) -> ResultEngine<RedemptionRequest> {
        let request = self.require_request(request_id).await?;
        if request.status.is_terminal() || request.status == RedemptionStatus::Approved {
            return Ok(request);
        }
        if request.status != RedemptionStatus::Requested {
            return Err(invalid_transition("approve", request.status));
        }

        let ids = self.resolve_identities(&request.subject_id).await?;
        let entries = self.load_entries(&ids, None).await?;
        let reserved = self
            .reserved_points(&ids.canonical, Some(&request.id.to_string()))
            .await?;
        let snapshot = wallet::compute_wallet(
            &entries,
            reserved,
            self.policy.games_daily_cap,
            now,
            self.policy.day_offset(),
        );
        if request.requested_points > snapshot.available {
            return Err(EngineError::InsufficientBalance(
                "requested points exceed available balance".to_string(),
            ));
        }

        self.update_status(
            &request,
            RedemptionStatus::Approved,
            redemptions::ActiveModel {
                decided_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            },
        )
        .await
    }

    /// `Approved -> Accepted`. Appends the spend entry and flips the status
    /// inside one DB transaction; the spend carries a `redemption:<id>`
    /// idempotency key so a retried accept cannot double-deduct.
    pub async fn accept(&self, request_id: Uuid, now: DateTime<Utc>) -> ResultEngine<RedemptionRequest> {
        let request = self.require_request(request_id).await?;
        if request.status.is_terminal() || request.status == RedemptionStatus::Accepted {
            return Ok(request);
        }
        if request.status != RedemptionStatus::Approved {
            return Err(invalid_transition("accept", request.status));
        }

        let spend_key = format!("redemption:{}", request.id);
        let spend = LedgerEntry::new(
            request.subject_id.clone(),
            -request.requested_points,
            format!("Accepted cash-out #{}", request.id),
            now,
            0,
            Some(spend_key.clone()),
        )?;

        with_tx!(self, |db_tx| {
            async {
                let existing = entries::Entity::find()
                    .filter(entries::Column::SubjectId.eq(spend.subject_id.clone()))
                    .filter(entries::Column::SourceKey.eq(spend_key.clone()))
                    .one(&db_tx)
                    .await?;
                if existing.is_none() {
                    entries::ActiveModel::from(&spend).insert(&db_tx).await?;
                }

                let active = redemptions::ActiveModel {
                    id: ActiveValue::Set(request.id.to_string()),
                    status: ActiveValue::Set(RedemptionStatus::Accepted.as_str().to_string()),
                    accepted_at: ActiveValue::Set(Some(now)),
                    ..Default::default()
                };
                active.update(&db_tx).await?;
                Ok::<(), EngineError>(())
            }
            .await
        })?;

        tracing::info!(
            subject_id = %request.subject_id,
            points = request.requested_points,
            "redemption accepted, points deducted"
        );
        self.publish(ChangeEvent {
            subject_id: request.subject_id.clone(),
            table: "ledger_entries",
            op: ChangeOp::Insert,
        });
        self.publish(ChangeEvent {
            subject_id: request.subject_id.clone(),
            table: "redemption_requests",
            op: ChangeOp::Update,
        });
        self.require_request(request_id).await
    }

    /// `Accepted -> Fulfilled`. Informational only, no ledger effect.
    pub async fn fulfill(&self, request_id: Uuid, now: DateTime<Utc>) -> ResultEngine<RedemptionRequest> {
        let request = self.require_request(request_id).await?;
        if request.status.is_terminal() {
            return Ok(request);
        }
        if request.status != RedemptionStatus::Accepted {
            return Err(invalid_transition("fulfill", request.status));
        }

        self.update_status(
            &request,
            RedemptionStatus::Fulfilled,
            redemptions::ActiveModel {
                fulfilled_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            },
        )
        .await
    }

    /// `Requested -> Rejected`. Terminal, releases the reservation.
    pub async fn reject(&self, request_id: Uuid, now: DateTime<Utc>) -> ResultEngine<RedemptionRequest> {
        let request = self.require_request(request_id).await?;
        if request.status.is_terminal() {
            return Ok(request);
        }
        if request.status != RedemptionStatus::Requested {
            return Err(invalid_transition("reject", request.status));
        }

        self.update_status(
            &request,
            RedemptionStatus::Rejected,
            redemptions::ActiveModel {
                decided_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            },
        )
        .await
    }

    /// `Requested|Approved -> Cancelled`. Terminal, releases the reservation.
    pub async fn cancel(&self, request_id: Uuid, now: DateTime<Utc>) -> ResultEngine<RedemptionRequest> {
        let request = self.require_request(request_id).await?;
        if request.status.is_terminal() {
            return Ok(request);
        }
        if !request.status.reserves_points() {
            return Err(invalid_transition("cancel", request.status));
        }

        self.update_status(
            &request,
            RedemptionStatus::Cancelled,
            redemptions::ActiveModel {
                decided_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            },
        )
        .await
    }

    /// Lists a subject's requests, newest first.
    pub async fn list_redemptions(&self, raw_key: &str) -> ResultEngine<Vec<RedemptionRequest>> {
        let ids = self.resolve_identities(raw_key).await?;
        let rows = redemptions::Entity::find()
            .filter(redemptions::Column::SubjectId.eq(ids.canonical))
            .order_by_desc(redemptions::Column::RequestedAt)
            .all(&self.database)
            .await?;
        rows.into_iter().map(RedemptionRequest::try_from).collect()
    }

    pub async fn redemption(&self, request_id: Uuid) -> ResultEngine<RedemptionRequest> {
        self.require_request(request_id).await
    }

    async fn require_request(&self, request_id: Uuid) -> ResultEngine<RedemptionRequest> {
        let model = redemptions::Entity::find_by_id(request_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("redemption not exists".to_string()))?;
        RedemptionRequest::try_from(model)
    }

    async fn update_status(
        &self,
        request: &RedemptionRequest,
        status: RedemptionStatus,
        patch: redemptions::ActiveModel,
    ) -> ResultEngine<RedemptionRequest> {
        let active = redemptions::ActiveModel {
            id: ActiveValue::Set(request.id.to_string()),
            status: ActiveValue::Set(status.as_str().to_string()),
            ..patch
        };
        active.update(&self.database).await?;

        self.publish(ChangeEvent {
            subject_id: request.subject_id.clone(),
            table: "redemption_requests",
            op: ChangeOp::Update,
        });
        self.require_request(request.id).await
    }
}

fn invalid_transition(action: &str, from: RedemptionStatus) -> EngineError {
    EngineError::InvalidTransition(format!(
        "cannot {action} a {} request",
        from.as_str()
    ))
}
