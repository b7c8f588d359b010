//! Record and view types for the activity log.

use chrono::{DateTime, Utc};
use crm_types::{ActivityKind, EntityType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used when an event has no actor, or the actor row is gone.
pub const SYSTEM_ACTOR_NAME: &str = "System";

/// A row from the `activity_types` registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventKind {
    /// Stable identifier referenced by `activity_logs.activity_type_id`.
    pub id: Uuid,
    /// Case-sensitive unique name, e.g. `DEAL_STAGE_CHANGED`.
    pub name: String,
}

/// An event to be appended to the log.
#[derive(Debug, Clone)]
pub struct NewActivity {
    /// The acting user, or `None` for system-initiated events.
    pub actor_id: Option<Uuid>,
    /// The kind of record the event is about.
    pub entity_type: EntityType,
    /// The record the event is about. Not checked for existence.
    pub entity_id: Option<Uuid>,
    /// Event kind name; registered on first use.
    pub kind: String,
    /// Final, human-readable description.
    pub message: String,
    /// Groups events raised by one logical request.
    pub correlation_id: Option<Uuid>,
}

impl NewActivity {
    /// Builds an event for one of the built-in kinds.
    pub fn new(
        actor_id: Option<Uuid>,
        entity_type: EntityType,
        entity_id: Option<Uuid>,
        kind: ActivityKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            actor_id,
            entity_type,
            entity_id,
            kind: kind.as_str().to_string(),
            message: message.into(),
            correlation_id: None,
        }
    }

    /// Attaches a correlation id.
    pub fn with_correlation(mut self, correlation_id: Option<Uuid>) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}

/// A persisted row of the `activity_logs` table.
///
/// Rows are immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub entity_type: EntityType,
    pub entity_id: Option<Uuid>,
    pub kind_id: Uuid,
    pub kind: String,
    pub message: String,
    pub correlation_id: Option<Uuid>,
    /// Creation time, microsecond resolution.
    pub created_at: DateTime<Utc>,
}

/// One item of an activity feed page, with the kind name and actor
/// display name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Option<Uuid>,
    /// Registry name of the event kind.
    pub event_type: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
    /// The actor's full name, or [`SYSTEM_ACTOR_NAME`].
    pub actor_name: String,
    pub correlation_id: Option<Uuid>,
}

/// A page of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    /// Newest first.
    pub items: Vec<ActivityEntry>,
    /// Opaque cursor for the next page; `None` at the end of the feed.
    pub next_cursor: Option<String>,
}

/// A row of the unpaginated per-entity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}
