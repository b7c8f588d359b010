//! Conversions between Rust values and the column encodings used by the
//! activity tables: UUIDs as canonical text, timestamps as integer
//! microseconds since the Unix epoch.

use chrono::{DateTime, Utc};
use crm_types::EntityType;
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

/// Current time truncated to the storage resolution.
pub(crate) fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    from_micros(now.timestamp_micros()).unwrap_or(now)
}

pub(crate) fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

pub(crate) fn from_micros(micros: i64) -> Option<DateTime<Utc>> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = micros.rem_euclid(1_000_000) * 1_000;
    DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?)
}

/// Smallest stored tick that is not earlier than `ts`.
///
/// Lower bounds round up so that a sub-microsecond `from` never admits an
/// event from the preceding tick.
pub(crate) fn lower_bound_micros(ts: DateTime<Utc>) -> i64 {
    let micros = ts.timestamp_micros();
    if ts.timestamp_subsec_nanos() % 1_000 == 0 {
        micros
    } else {
        micros.saturating_add(1)
    }
}

pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        Uuid::parse_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let micros: i64 = row.get(idx)?;
    from_micros(micros).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, micros))
}

pub(crate) fn entity_type_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<EntityType> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
