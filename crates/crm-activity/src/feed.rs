//! Activity feed queries.
//!
//! [`query_feed`] returns one page of an entity's events, newest first,
//! with keyset pagination over `(created_at DESC, id DESC)`. That order is
//! total even when several events share a timestamp, so successive pages
//! never repeat or skip a row that existed when the first page was read.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use crm_types::EntityType;
use rusqlite::{params, types::ToSql, Connection, Row};
use uuid::Uuid;

use crate::columns::{
    entity_type_at, lower_bound_micros, opt_uuid_at, timestamp_at, to_micros, uuid_at,
};
use crate::cursor::FeedCursor;
use crate::error::ActivityError;
use crate::event::{ActivityEntry, ActivityPage, LogEntry, SYSTEM_ACTOR_NAME};
use crate::registry::list_kinds;

/// Page size used when the caller gives none, or a non-positive one.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a caller can request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Filter and pagination parameters for [`query_feed`].
#[derive(Debug, Clone)]
pub struct ActivityFeedQuery {
    /// Kind of the subject record. Required.
    pub entity_type: EntityType,
    /// Id of the subject record. Required.
    pub entity_id: Uuid,
    /// Restrict to these kind names, compared case-insensitively.
    /// `None` or an effectively empty list disables the filter.
    pub event_kinds: Option<Vec<String>>,
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
    /// Only events by this actor.
    pub actor_id: Option<Uuid>,
    /// Opaque cursor from a previous page. Malformed values are ignored.
    pub cursor: Option<String>,
    /// Requested page size; see [`clamp_limit`].
    pub limit: Option<i64>,
}

impl ActivityFeedQuery {
    /// An unfiltered first-page query for one entity.
    pub fn for_entity(entity_type: EntityType, entity_id: Uuid) -> Self {
        Self {
            entity_type,
            entity_id,
            event_kinds: None,
            from: None,
            to: None,
            actor_id: None,
            cursor: None,
            limit: None,
        }
    }
}

/// Applies the page-size policy: non-positive or missing values become
/// [`DEFAULT_PAGE_SIZE`], anything larger than [`MAX_PAGE_SIZE`] is capped.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(n) if n > 0 => n.min(MAX_PAGE_SIZE),
        _ => DEFAULT_PAGE_SIZE,
    }
}

/// Splits a comma-separated list of kind names into normalized filter
/// values: trimmed, upper-cased, empty entries dropped.
pub fn parse_event_kinds(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}

/// Returns one page of the activity feed for an entity.
///
/// # Errors
///
/// Returns `ActivityError::Database` on SQL failure.
pub fn query_feed(
    conn: &Connection,
    query: &ActivityFeedQuery,
) -> Result<ActivityPage, ActivityError> {
    let mut clauses = vec![
        "l.entity_type = ?1".to_string(),
        "l.entity_id = ?2".to_string(),
    ];
    let mut param_values: Vec<Box<dyn ToSql>> = vec![
        Box::new(query.entity_type.as_str()),
        Box::new(query.entity_id.to_string()),
    ];
    let mut idx = 3u32;

    let wanted: HashSet<String> = query
        .event_kinds
        .iter()
        .flatten()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(str::to_uppercase)
        .collect();
    if !wanted.is_empty() {
        // Registry names are folded here rather than in SQL: SQLite's
        // UPPER only handles ASCII.
        let kind_ids: Vec<Uuid> = list_kinds(conn)?
            .into_iter()
            .filter(|k| wanted.contains(&k.name.to_uppercase()))
            .map(|k| k.id)
            .collect();
        if kind_ids.is_empty() {
            tracing::debug!(kinds = ?wanted, "kind filter matches no registered kind");
            return Ok(ActivityPage {
                items: Vec::new(),
                next_cursor: None,
            });
        }
        let mut placeholders = Vec::with_capacity(kind_ids.len());
        for id in kind_ids {
            placeholders.push(format!("?{idx}"));
            param_values.push(Box::new(id.to_string()));
            idx += 1;
        }
        clauses.push(format!(
            "l.activity_type_id IN ({})",
            placeholders.join(", ")
        ));
    }

    if let Some(from) = query.from {
        clauses.push(format!("l.created_at >= ?{idx}"));
        param_values.push(Box::new(lower_bound_micros(from)));
        idx += 1;
    }

    if let Some(to) = query.to {
        clauses.push(format!("l.created_at <= ?{idx}"));
        param_values.push(Box::new(to_micros(to)));
        idx += 1;
    }

    if let Some(actor) = query.actor_id {
        clauses.push(format!("l.actor_user_id = ?{idx}"));
        param_values.push(Box::new(actor.to_string()));
        idx += 1;
    }

    if let Some(cursor) = FeedCursor::decode_lenient(query.cursor.as_deref()) {
        let ts = idx;
        let id = idx + 1;
        clauses.push(format!(
            "(l.created_at < ?{ts} OR (l.created_at = ?{ts} AND l.id < ?{id}))"
        ));
        param_values.push(Box::new(to_micros(cursor.created_at)));
        param_values.push(Box::new(cursor.id.to_string()));
        idx += 2;
    }

    let page_size = clamp_limit(query.limit);
    let where_clause = clauses.join(" AND ");
    let sql = format!(
        "SELECT l.id, l.entity_type, l.entity_id, t.name, l.message, l.created_at,
                l.actor_user_id, u.full_name, l.correlation_id
         FROM activity_logs l
         JOIN activity_types t ON t.id = l.activity_type_id
         LEFT JOIN users u ON u.id = l.actor_user_id
         WHERE {where_clause}
         ORDER BY l.created_at DESC, l.id DESC
         LIMIT ?{idx}"
    );
    // One extra row tells us whether another page exists.
    param_values.push(Box::new(page_size + 1));

    let params_refs: Vec<&dyn ToSql> = param_values.iter().map(|p| &**p).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), map_entry)?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }

    let page_size = page_size as usize;
    let has_more = items.len() > page_size;
    items.truncate(page_size);

    let next_cursor = match items.last() {
        Some(last) if has_more => Some(FeedCursor::new(last.created_at, last.id).encode()),
        _ => None,
    };

    Ok(ActivityPage { items, next_cursor })
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<ActivityEntry> {
    let actor_name: Option<String> = row.get(7)?;
    Ok(ActivityEntry {
        id: uuid_at(row, 0)?,
        entity_type: entity_type_at(row, 1)?,
        entity_id: opt_uuid_at(row, 2)?,
        event_type: row.get(3)?,
        message: row.get(4)?,
        created_at: timestamp_at(row, 5)?,
        actor_id: opt_uuid_at(row, 6)?,
        actor_name: actor_name.unwrap_or_else(|| SYSTEM_ACTOR_NAME.to_string()),
        correlation_id: opt_uuid_at(row, 8)?,
    })
}

/// Returns every event for an entity, newest first, without filters or
/// pagination.
///
/// # Errors
///
/// Returns `ActivityError::Database` on SQL failure.
pub fn list_entity_log(
    conn: &Connection,
    entity_type: EntityType,
    entity_id: Uuid,
) -> Result<Vec<LogEntry>, ActivityError> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.created_at, t.name, l.message
         FROM activity_logs l
         JOIN activity_types t ON t.id = l.activity_type_id
         WHERE l.entity_type = ?1 AND l.entity_id = ?2
         ORDER BY l.created_at DESC, l.id DESC",
    )?;
    let rows = stmt.query_map(params![entity_type.as_str(), entity_id.to_string()], |row| {
        Ok(LogEntry {
            id: uuid_at(row, 0)?,
            timestamp: timestamp_at(row, 1)?,
            kind: row.get(2)?,
            description: row.get(3)?,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}
