//! Opaque keyset cursor for the activity feed.
//!
//! A cursor names the last item a client has seen, as the pair
//! `(created_at, id)`. It is encoded as `<micros>_<uuid>`: the timestamp as
//! integer microseconds since the Unix epoch (UTC) and the id in canonical
//! hyphenated form. Neither component can contain `_`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::columns::{from_micros, to_micros};

const DELIMITER: char = '_';

/// A decoded feed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedCursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

/// Reasons a cursor string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("cursor is empty")]
    Empty,

    #[error("cursor must have 2 segments, found {0}")]
    SegmentCount(usize),

    #[error("cursor timestamp is not a valid tick count: {0:?}")]
    Timestamp(String),

    #[error("cursor id is not a valid uuid: {0:?}")]
    Id(String),
}

impl FeedCursor {
    /// Builds a cursor positioned at the given item.
    ///
    /// The timestamp is truncated to microseconds, the resolution stored in
    /// the database.
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        let created_at = from_micros(to_micros(created_at)).unwrap_or(created_at);
        Self { created_at, id }
    }

    /// Encodes the cursor into its opaque string form.
    pub fn encode(&self) -> String {
        format!("{}{}{}", to_micros(self.created_at), DELIMITER, self.id)
    }

    /// Decodes a cursor string.
    ///
    /// # Errors
    ///
    /// Returns a [`CursorError`] for blank input, a segment count other than
    /// two, a non-integer timestamp, or a malformed id.
    pub fn decode(raw: &str) -> Result<Self, CursorError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CursorError::Empty);
        }

        let segments: Vec<&str> = raw.split(DELIMITER).collect();
        let [ticks, id] = segments.as_slice() else {
            return Err(CursorError::SegmentCount(segments.len()));
        };

        let created_at = ticks
            .parse::<i64>()
            .ok()
            .and_then(from_micros)
            .ok_or_else(|| CursorError::Timestamp(ticks.to_string()))?;
        let id = Uuid::parse_str(id).map_err(|_| CursorError::Id(id.to_string()))?;

        Ok(Self { created_at, id })
    }

    /// Decodes an optional cursor, treating anything malformed as absent.
    ///
    /// A bad cursor restarts the feed from the newest item rather than
    /// failing the request. This can hide client bugs; the rejection is
    /// logged at debug level.
    pub fn decode_lenient(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        match Self::decode(raw) {
            Ok(cursor) => Some(cursor),
            Err(e) => {
                tracing::debug!(cursor = raw, error = %e, "ignoring malformed feed cursor");
                None
            }
        }
    }
}

impl std::fmt::Display for FeedCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl std::str::FromStr for FeedCursor {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
