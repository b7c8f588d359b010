//! Activity log for the CRM backend.
//!
//! An append-only ledger of what happened to which record, and a paginated
//! feed to read it back. Business operations record events through the
//! emitters in [`emit`] after committing their own changes; the HTTP layer
//! reads them through [`query_feed`].
//!
//! # Components
//!
//! | Component | Entry points |
//! |-----------|--------------|
//! | Event kind registry | [`resolve_or_create`], [`find_kind`], [`list_kinds`] |
//! | Event writer | [`append`], [`append_at`] |
//! | Cursor codec | [`FeedCursor::encode`], [`FeedCursor::decode`] |
//! | Feed query | [`query_feed`], [`list_entity_log`] |
//! | Domain emitters | [`emit`] |
//!
//! Every operation takes the caller's `&rusqlite::Connection`, so one
//! request's reads and writes share a single unit of work.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crm_activity::emit::{self, AccountScope};
//!
//! let scope = AccountScope::new(Some(user_id), account_id);
//! emit::deal_stage_changed(&conn, &scope, Some("NEW_LEAD"), Some("QUALIFIED"))?;
//!
//! let page = crm_activity::query_feed(
//!     &conn,
//!     &ActivityFeedQuery::for_entity(EntityType::Account, account_id),
//! )?;
//! ```

mod columns;
mod cursor;
pub mod emit;
mod error;
mod event;
mod feed;
mod registry;
mod store;

pub use cursor::{CursorError, FeedCursor};
pub use error::ActivityError;
pub use event::{
    ActivityEntry, ActivityEvent, ActivityPage, EventKind, LogEntry, NewActivity,
    SYSTEM_ACTOR_NAME,
};
pub use feed::{
    clamp_limit, list_entity_log, parse_event_kinds, query_feed, ActivityFeedQuery,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use registry::{find_kind, list_kinds, resolve_or_create};
pub use store::{append, append_at};
