//! Event kind registry.
//!
//! Kinds are created lazily the first time a name is appended and are never
//! updated or removed. Lookups by name are exact (case-sensitive); the feed
//! query does its own case-insensitive matching.

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use uuid::Uuid;

use crate::columns::uuid_at;
use crate::error::ActivityError;
use crate::event::EventKind;

/// Returns the id of the kind called `name`, registering it if needed.
///
/// Two writers racing to register the same new name are reconciled by the
/// `UNIQUE(name)` constraint: the loser's insert fails and it re-reads the
/// winner's row instead of failing.
///
/// # Errors
///
/// Returns `ActivityError::InvalidKind` for a blank name and
/// `ActivityError::Database` on any other SQL failure.
pub fn resolve_or_create(conn: &Connection, name: &str) -> Result<Uuid, ActivityError> {
    if name.trim().is_empty() {
        return Err(ActivityError::InvalidKind(name.to_string()));
    }

    if let Some(kind) = find_kind(conn, name)? {
        return Ok(kind.id);
    }

    insert_or_reread(conn, name)
}

/// Inserts a new kind row, falling back to the existing row on a
/// uniqueness conflict.
pub(crate) fn insert_or_reread(conn: &Connection, name: &str) -> Result<Uuid, ActivityError> {
    let id = Uuid::new_v4();

    match conn.execute(
        "INSERT INTO activity_types (id, name) VALUES (?1, ?2)",
        params![id.to_string(), name],
    ) {
        Ok(_) => {
            tracing::info!(kind = name, %id, "registered new activity kind");
            Ok(id)
        }
        Err(err) if is_unique_violation(&err) => {
            tracing::warn!(
                kind = name,
                "activity kind was registered concurrently, using existing row"
            );
            match find_kind(conn, name)? {
                Some(kind) => Ok(kind.id),
                None => Err(ActivityError::Database(err)),
            }
        }
        Err(err) => Err(err.into()),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Looks up a kind by exact name.
///
/// # Errors
///
/// Returns `ActivityError::Database` on SQL failure.
pub fn find_kind(conn: &Connection, name: &str) -> Result<Option<EventKind>, ActivityError> {
    let kind = conn
        .query_row(
            "SELECT id, name FROM activity_types WHERE name = ?1",
            params![name],
            |row| {
                Ok(EventKind {
                    id: uuid_at(row, 0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(kind)
}

/// Lists every registered kind, ordered by name.
///
/// # Errors
///
/// Returns `ActivityError::Database` on SQL failure.
pub fn list_kinds(conn: &Connection) -> Result<Vec<EventKind>, ActivityError> {
    let mut stmt = conn.prepare("SELECT id, name FROM activity_types ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(EventKind {
            id: uuid_at(row, 0)?,
            name: row.get(1)?,
        })
    })?;

    let mut kinds = Vec::new();
    for row in rows {
        kinds.push(row?);
    }
    Ok(kinds)
}
