//! Event writer for the activity log.
//!
//! All writes go through [`append`] (or [`append_at`] for records with a
//! known historical timestamp). Each call resolves the event kind through
//! the registry and inserts exactly one `activity_logs` row, inside a
//! single write scope so that a failure leaves nothing behind.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::columns::{from_micros, now_micros, to_micros};
use crate::error::ActivityError;
use crate::event::{ActivityEvent, NewActivity};
use crate::registry::resolve_or_create;

const SAVEPOINT: &str = "crm_activity_append";

/// Appends an event stamped with the current time.
///
/// # Errors
///
/// Returns `ActivityError::InvalidKind` if `event.kind` is blank, or
/// `ActivityError::Database` on SQL failure.
pub fn append(conn: &Connection, event: &NewActivity) -> Result<ActivityEvent, ActivityError> {
    append_at(conn, event, now_micros())
}

/// Appends an event with an explicit creation time.
///
/// Used when importing records whose time of occurrence is already known.
/// The timestamp is truncated to microseconds.
///
/// # Errors
///
/// Returns `ActivityError::InvalidKind` if `event.kind` is blank, or
/// `ActivityError::Database` on SQL failure.
pub fn append_at(
    conn: &Connection,
    event: &NewActivity,
    created_at: DateTime<Utc>,
) -> Result<ActivityEvent, ActivityError> {
    if event.kind.trim().is_empty() {
        return Err(ActivityError::InvalidKind(event.kind.clone()));
    }

    let micros = to_micros(created_at);
    let created_at = from_micros(micros).unwrap_or(created_at);
    let id = Uuid::new_v4();

    let kind_id = with_write_scope(conn, || {
        let kind_id = resolve_or_create(conn, &event.kind)?;
        conn.execute(
            "INSERT INTO activity_logs
                (id, actor_user_id, entity_type, entity_id, activity_type_id, message, correlation_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id.to_string(),
                event.actor_id.map(|a| a.to_string()),
                event.entity_type.as_str(),
                event.entity_id.map(|e| e.to_string()),
                kind_id.to_string(),
                event.message,
                event.correlation_id.map(|c| c.to_string()),
                micros,
            ],
        )?;
        Ok(kind_id)
    })?;

    tracing::debug!(
        event_id = %id,
        kind = %event.kind,
        entity_type = event.entity_type.as_str(),
        entity_id = ?event.entity_id,
        "appended activity event"
    );

    Ok(ActivityEvent {
        id,
        actor_id: event.actor_id,
        entity_type: event.entity_type,
        entity_id: event.entity_id,
        kind_id,
        kind: event.kind.clone(),
        message: event.message.clone(),
        correlation_id: event.correlation_id,
        created_at,
    })
}

/// Runs `f` atomically.
///
/// Outside a transaction this takes the write lock up front
/// (`BEGIN IMMEDIATE`), so the registry lookup and the inserts see one
/// consistent snapshot and wait on `busy_timeout` instead of failing with
/// `SQLITE_BUSY`. Inside a caller's transaction it nests as a savepoint.
fn with_write_scope<T>(
    conn: &Connection,
    f: impl FnOnce() -> Result<T, ActivityError>,
) -> Result<T, ActivityError> {
    let nested = !conn.is_autocommit();
    if nested {
        conn.execute_batch(&format!("SAVEPOINT {SAVEPOINT}"))?;
    } else {
        conn.execute_batch("BEGIN IMMEDIATE")?;
    }

    let finish = match f() {
        Ok(value) => {
            let commit = if nested {
                conn.execute_batch(&format!("RELEASE {SAVEPOINT}"))
            } else {
                conn.execute_batch("COMMIT")
            };
            commit.map(|()| value).map_err(ActivityError::from)
        }
        Err(e) => Err(e),
    };

    if finish.is_err() {
        let rollback = if nested {
            conn.execute_batch(&format!(
                "ROLLBACK TO {SAVEPOINT}; RELEASE {SAVEPOINT}"
            ))
        } else {
            conn.execute_batch("ROLLBACK")
        };
        if let Err(e) = rollback {
            tracing::warn!(error = %e, "failed to roll back activity append");
        }
    }

    finish
}
