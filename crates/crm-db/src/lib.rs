//! Database layer for the CRM backend.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. Every table the backend reads or writes is
//! created through versioned migrations managed by this crate.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: readers of the activity feed never block the
//!   writers appending to it.
//! - **`r2d2` connection pool**: each request checks out one connection and
//!   passes it explicitly to the code that needs it. There is no shared,
//!   process-wide database context.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, so the schema cannot drift from the code using it.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{configure_connection, create_pool, DbPool, DbRuntimeSettings, PoolError};
