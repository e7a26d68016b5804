use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use crate::events::{ChangeEvent, ChangeOp};
use crate::usage::UsageWindow;
use crate::{EngineError, ResultEngine, usage};

use super::Engine;

impl Engine {
    /// Records one discrete capped action (e.g. a premium image generation).
    pub async fn record_usage(
        &self,
        raw_key: &str,
        action_kind: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let ids = self.resolve_identities(raw_key).await?;
        let model = usage::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            subject_id: ActiveValue::Set(ids.canonical.clone()),
            action_kind: ActiveValue::Set(action_kind.to_string()),
            occurred_at: ActiveValue::Set(now),
        };
        model.insert(&self.database).await?;

        self.publish(ChangeEvent {
            subject_id: ids.canonical,
            table: "usage_events",
            op: ChangeOp::Insert,
        });
        Ok(())
    }

    /// Counts a subject's actions of one kind inside the current window.
    ///
    /// This is the count half of the non-points monthly cap; the caller
    /// compares the count against its limit.
    pub async fn usage_count(
        &self,
        raw_key: &str,
        action_kind: &str,
        window: UsageWindow,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> ResultEngine<u64> {
        let ids = self.resolve_identities(raw_key).await?;
        let (start, end) = window_bounds(window, now, offset)?;

        let count = usage::Entity::find()
            .filter(usage::Column::SubjectId.eq(ids.canonical))
            .filter(usage::Column::ActionKind.eq(action_kind))
            .filter(usage::Column::OccurredAt.gte(start))
            .filter(usage::Column::OccurredAt.lt(end))
            .count(&self.database)
            .await?;
        Ok(count)
    }
}

/// `[start, end)` of the window containing `now`, on the caller's calendar.
fn window_bounds(
    window: UsageWindow,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
    let local_day = now.with_timezone(&offset).date_naive();
    let start_day = match window {
        UsageWindow::Day => local_day,
        UsageWindow::Month => local_day
            .with_day(1)
            .ok_or_else(|| invalid_window(window))?,
    };
    let end_day = match window {
        UsageWindow::Day => start_day.checked_add_days(Days::new(1)),
        UsageWindow::Month => start_day.checked_add_months(Months::new(1)),
    }
    .ok_or_else(|| invalid_window(window))?;

    Ok((
        day_start_utc(start_day, offset).ok_or_else(|| invalid_window(window))?,
        day_start_utc(end_day, offset).ok_or_else(|| invalid_window(window))?,
    ))
}

fn day_start_utc(day: NaiveDate, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let midnight = day.and_hms_opt(0, 0, 0)?;
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn invalid_window(window: UsageWindow) -> EngineError {
    EngineError::InvalidAmount(format!("invalid usage window: {}", window.as_str()))
}
