//! Domain event emitters.
//!
//! Business operations call these after committing their own changes. Each
//! emitter formats the final message and appends one event against the
//! account it concerns.
//!
//! Field-changed emitters are no-ops when the value did not change: they
//! return `Ok(None)` and write nothing. Enumerated fields (lead source,
//! deal stage) compare case-insensitively; free text (decision makers)
//! compares exactly. An unset value (`None`) equals only another unset
//! value, so clearing a field to `""` is recorded as a change.

use chrono::{DateTime, Timelike, Utc};
use crm_types::{ActivityKind, EntityType};
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::ActivityError;
use crate::event::{ActivityEvent, NewActivity};
use crate::store::append;

const NOT_SET: &str = "Not set";
const EMPTY: &str = "(empty)";
const UNNAMED_CONTACT: &str = "(unnamed contact)";

/// Who is acting on which account, and within which request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountScope {
    pub actor_id: Option<Uuid>,
    pub account_id: Uuid,
    pub correlation_id: Option<Uuid>,
}

impl AccountScope {
    pub fn new(actor_id: Option<Uuid>, account_id: Uuid) -> Self {
        Self {
            actor_id,
            account_id,
            correlation_id: None,
        }
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    fn emit(
        &self,
        conn: &Connection,
        kind: ActivityKind,
        message: String,
    ) -> Result<ActivityEvent, ActivityError> {
        let event = NewActivity::new(
            self.actor_id,
            EntityType::Account,
            Some(self.account_id),
            kind,
            message,
        )
        .with_correlation(self.correlation_id);
        append(conn, &event)
    }
}

/// The account fields whose changes are recorded in the activity log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountKeyFields {
    pub lead_source: Option<String>,
    pub deal_stage: Option<String>,
    pub decision_makers: Option<String>,
}

fn label<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

fn opt_label<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    label(value.unwrap_or_default(), placeholder)
}

/// A missing value only equals another missing value; `None` and `""` differ.
fn same_code(old: Option<&str>, new: Option<&str>) -> bool {
    match (old, new) {
        (Some(old), Some(new)) => old.to_uppercase() == new.to_uppercase(),
        (None, None) => true,
        _ => false,
    }
}

fn field_changed(
    conn: &Connection,
    scope: &AccountScope,
    kind: ActivityKind,
    field: &str,
    old: Option<&str>,
    new: Option<&str>,
    placeholder: &str,
) -> Result<Option<ActivityEvent>, ActivityError> {
    let message = format!(
        "{field} changed from '{}' to '{}'",
        opt_label(old, placeholder),
        opt_label(new, placeholder)
    );
    scope.emit(conn, kind, message).map(Some)
}

/// Records a lead source change. No-op if the codes match ignoring case.
pub fn lead_source_changed(
    conn: &Connection,
    scope: &AccountScope,
    old: Option<&str>,
    new: Option<&str>,
) -> Result<Option<ActivityEvent>, ActivityError> {
    if same_code(old, new) {
        tracing::trace!(account_id = %scope.account_id, "lead source unchanged");
        return Ok(None);
    }
    field_changed(
        conn,
        scope,
        ActivityKind::LeadSourceChanged,
        "Lead source",
        old,
        new,
        NOT_SET,
    )
}

/// Records a deal stage change. No-op if the codes match ignoring case.
pub fn deal_stage_changed(
    conn: &Connection,
    scope: &AccountScope,
    old: Option<&str>,
    new: Option<&str>,
) -> Result<Option<ActivityEvent>, ActivityError> {
    if same_code(old, new) {
        tracing::trace!(account_id = %scope.account_id, "deal stage unchanged");
        return Ok(None);
    }
    field_changed(
        conn,
        scope,
        ActivityKind::DealStageChanged,
        "Deal stage",
        old,
        new,
        NOT_SET,
    )
}

/// Records a decision makers change. No-op only on an exact match.
pub fn decision_makers_changed(
    conn: &Connection,
    scope: &AccountScope,
    old: Option<&str>,
    new: Option<&str>,
) -> Result<Option<ActivityEvent>, ActivityError> {
    if old == new {
        tracing::trace!(account_id = %scope.account_id, "decision makers unchanged");
        return Ok(None);
    }
    field_changed(
        conn,
        scope,
        ActivityKind::DecisionMakersChanged,
        "Decision makers",
        old,
        new,
        EMPTY,
    )
}

/// Records every key-field difference between two snapshots of an account,
/// in the order lead source, deal stage, decision makers.
///
/// Returns the number of events written.
pub fn record_account_field_changes(
    conn: &Connection,
    scope: &AccountScope,
    before: &AccountKeyFields,
    after: &AccountKeyFields,
) -> Result<usize, ActivityError> {
    let written = [
        lead_source_changed(
            conn,
            scope,
            before.lead_source.as_deref(),
            after.lead_source.as_deref(),
        )?,
        deal_stage_changed(
            conn,
            scope,
            before.deal_stage.as_deref(),
            after.deal_stage.as_deref(),
        )?,
        decision_makers_changed(
            conn,
            scope,
            before.decision_makers.as_deref(),
            after.decision_makers.as_deref(),
        )?,
    ];
    Ok(written.iter().flatten().count())
}

// ── Contact lifecycle ────────────────────────────────────────────────

pub fn contact_added(
    conn: &Connection,
    scope: &AccountScope,
    contact_name: &str,
) -> Result<ActivityEvent, ActivityError> {
    let message = format!("Contact added: {}", label(contact_name, UNNAMED_CONTACT));
    scope.emit(conn, ActivityKind::ContactAdded, message)
}

pub fn contact_updated(
    conn: &Connection,
    scope: &AccountScope,
    contact_name: &str,
) -> Result<ActivityEvent, ActivityError> {
    let message = format!("Contact updated: {}", label(contact_name, UNNAMED_CONTACT));
    scope.emit(conn, ActivityKind::ContactUpdated, message)
}

pub fn contact_deleted(
    conn: &Connection,
    scope: &AccountScope,
    contact_name: &str,
) -> Result<ActivityEvent, ActivityError> {
    let message = format!("Contact deleted: {}", label(contact_name, UNNAMED_CONTACT));
    scope.emit(conn, ActivityKind::ContactDeleted, message)
}

// ── Demo lifecycle ───────────────────────────────────────────────────

/// Round-trip form with seven fractional digits and an explicit `+00:00`
/// offset, e.g. `2025-11-24T12:00:00.0000000+00:00`.
fn format_ts(ts: DateTime<Utc>) -> String {
    // Leap-second nanos (>= 1e9) are clamped so the fraction stays 7 digits.
    let ticks = ts.nanosecond().min(999_999_999) / 100;
    format!("{}.{:07}+00:00", ts.format("%Y-%m-%dT%H:%M:%S"), ticks)
}

pub fn demo_scheduled(
    conn: &Connection,
    scope: &AccountScope,
    scheduled_at: DateTime<Utc>,
) -> Result<ActivityEvent, ActivityError> {
    let message = format!("Demo scheduled at {}", format_ts(scheduled_at));
    scope.emit(conn, ActivityKind::DemoScheduled, message)
}

pub fn demo_updated(
    conn: &Connection,
    scope: &AccountScope,
) -> Result<ActivityEvent, ActivityError> {
    scope.emit(conn, ActivityKind::DemoUpdated, "Demo details updated".to_string())
}

/// Records a completed demo. The message mentions the completion time
/// only when one is known.
pub fn demo_completed(
    conn: &Connection,
    scope: &AccountScope,
    scheduled_at: DateTime<Utc>,
    done_at: Option<DateTime<Utc>>,
) -> Result<ActivityEvent, ActivityError> {
    let message = match done_at {
        Some(done) => format!(
            "Demo completed (scheduled at {}, completed at {})",
            format_ts(scheduled_at),
            format_ts(done)
        ),
        None => format!("Demo completed (scheduled at {})", format_ts(scheduled_at)),
    };
    scope.emit(conn, ActivityKind::DemoCompleted, message)
}

pub fn demo_cancelled(
    conn: &Connection,
    scope: &AccountScope,
) -> Result<ActivityEvent, ActivityError> {
    scope.emit(conn, ActivityKind::DemoCancelled, "Demo cancelled".to_string())
}
