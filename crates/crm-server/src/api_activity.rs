//! Account activity feed handlers.
//!
//! Provides:
//! - `GET /api/accounts/{id}/activity`: filtered, cursor-paginated feed
//! - `GET /api/accounts/{id}/activity-log`: every event, newest first
//! - `GET /api/activity/kinds`: registered event kinds

use crate::api::{with_conn, ApiError};
use crate::AppState;
use axum::extract::{Extension, Json, Path, Query};
use chrono::{DateTime, Utc};
use crm_activity::{
    list_entity_log, list_kinds, parse_event_kinds, query_feed, ActivityEntry,
    ActivityFeedQuery, EventKind, LogEntry,
};
use crm_types::EntityType;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Query parameters for `GET /api/accounts/{id}/activity`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityParams {
    /// Comma-separated event kind names, matched case-insensitively.
    pub event_types: Option<String>,
    /// Inclusive lower bound, RFC 3339 with offset.
    pub from: Option<String>,
    /// Inclusive upper bound, RFC 3339 with offset.
    pub to: Option<String>,
    /// Only events by this user.
    pub actor_id: Option<String>,
    /// Opaque cursor from a previous response.
    pub cursor: Option<String>,
    /// Page size (default 50, max 100).
    pub limit: Option<i64>,
}

/// One feed item as exposed over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntryView {
    pub id: Uuid,
    pub account_id: Uuid,
    pub event_type: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
    pub actor_name: String,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub correlation_id: Option<Uuid>,
}

impl ActivityLogEntryView {
    fn from_entry(account_id: Uuid, entry: ActivityEntry) -> Self {
        Self {
            id: entry.id,
            account_id,
            event_type: entry.event_type,
            description: entry.message,
            timestamp: entry.created_at,
            actor_id: entry.actor_id,
            actor_name: entry.actor_name,
            related_entity_type: Some(entry.entity_type.as_str().to_string()),
            related_entity_id: entry.entity_id,
            correlation_id: entry.correlation_id,
        }
    }
}

/// Response body for the activity feed.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFeedResponse {
    pub items: Vec<ActivityLogEntryView>,
    pub next_cursor: Option<String>,
}

/// Response body for the unpaginated activity log.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityLogResponse {
    pub data: Vec<LogEntry>,
}

/// Response body for the kind listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityKindsResponse {
    pub kinds: Vec<EventKind>,
}

fn parse_account_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid account id: {}", raw)))
}

fn parse_timestamp(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            DateTime::parse_from_rfc3339(s.trim())
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| ApiError::BadRequest(format!("invalid {}: {}", field, e)))
        })
        .transpose()
}

fn parse_actor_id(raw: Option<&str>) -> Result<Option<Uuid>, ApiError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            Uuid::parse_str(s.trim())
                .map_err(|_| ApiError::BadRequest(format!("invalid actorId: {}", s)))
        })
        .transpose()
}

fn ensure_account(conn: &Connection, account_id: Uuid) -> Result<(), ApiError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = ?1 AND is_deleted = 0)",
        params![account_id.to_string()],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(ApiError::NotFound("account not found".to_string()))
    }
}

/// Handler for `GET /api/accounts/{id}/activity`.
///
/// A malformed `cursor` is not an error: the feed restarts from the newest
/// event.
pub async fn get_account_activity_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(account_id): Path<String>,
    Query(params): Query<ActivityParams>,
) -> Result<Json<ActivityFeedResponse>, ApiError> {
    let account_id = parse_account_id(&account_id)?;

    let query = ActivityFeedQuery {
        event_kinds: params.event_types.as_deref().map(parse_event_kinds),
        from: parse_timestamp("from", params.from.as_deref())?,
        to: parse_timestamp("to", params.to.as_deref())?,
        actor_id: parse_actor_id(params.actor_id.as_deref())?,
        cursor: params.cursor,
        limit: params.limit,
        ..ActivityFeedQuery::for_entity(EntityType::Account, account_id)
    };

    let page = with_conn(&state, move |conn| {
        ensure_account(conn, account_id)?;
        Ok(query_feed(conn, &query)?)
    })
    .await?;

    tracing::debug!(
        account_id = %account_id,
        items = page.items.len(),
        has_more = page.next_cursor.is_some(),
        "served account activity page"
    );

    Ok(Json(ActivityFeedResponse {
        items: page
            .items
            .into_iter()
            .map(|entry| ActivityLogEntryView::from_entry(account_id, entry))
            .collect(),
        next_cursor: page.next_cursor,
    }))
}

/// Handler for `GET /api/accounts/{id}/activity-log`.
pub async fn get_account_activity_log_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<ActivityLogResponse>, ApiError> {
    let account_id = parse_account_id(&account_id)?;

    let data = with_conn(&state, move |conn| {
        ensure_account(conn, account_id)?;
        Ok(list_entity_log(conn, EntityType::Account, account_id)?)
    })
    .await?;

    Ok(Json(ActivityLogResponse { data }))
}

/// Handler for `GET /api/activity/kinds`.
pub async fn get_activity_kinds_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ActivityKindsResponse>, ApiError> {
    let kinds = with_conn(&state, |conn| Ok(list_kinds(conn)?)).await?;
    Ok(Json(ActivityKindsResponse { kinds }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_accept_offsets_and_normalise_to_utc() {
        let ts = parse_timestamp("from", Some("2025-11-24T14:00:00+02:00"))
            .expect("valid timestamp")
            .expect("present");
        assert_eq!(ts.to_rfc3339(), "2025-11-24T12:00:00+00:00");
        assert_eq!(parse_timestamp("from", Some("  ")).expect("blank"), None);
        assert_eq!(parse_timestamp("from", None).expect("absent"), None);
    }

    #[test]
    fn invalid_timestamps_are_rejected() {
        let err = parse_timestamp("to", Some("last tuesday")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.starts_with("invalid to")));
    }

    #[test]
    fn actor_ids_must_be_uuids() {
        assert!(parse_actor_id(Some("not-a-uuid")).is_err());
        assert_eq!(parse_actor_id(Some("")).expect("blank"), None);
        let id = Uuid::new_v4();
        assert_eq!(
            parse_actor_id(Some(&id.to_string())).expect("valid"),
            Some(id)
        );
    }
}
