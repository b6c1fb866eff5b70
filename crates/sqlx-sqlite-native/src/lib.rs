//! # sqlx-sqlite-native
//!
//! The native layer underneath a statement executor: a database handle that
//! opens SQLite databases and runs raw SQL, and forward-only row cursors over
//! the results.
//!
//! ## Core Types
//!
//! - **[`NativeHandle`]**: open / execute / query / close contract
//! - **[`RowCursor`]**: row count, positioning, and per-column access
//! - **[`SqlxHandle`]** / **[`SqliteCursor`]**: implementations backed by one sqlx connection
//! - **[`CursorGuard`]**: RAII guard closing a cursor on every exit path
//! - **[`Rows`]**: lazy, single-pass sequence of projected rows
//! - **[`OpenFlags`]**: how a handle opens its database
//! - **[`Error`]**: error type for native operations
//!
//! ## Usage
//!
//! ```no_run
//! use sqlx_sqlite_native::{CursorGuard, NativeHandle, OpenFlags, RowCursor, SqlxHandle};
//!
//! #[tokio::main]
//! async fn main() -> sqlx_sqlite_native::Result<()> {
//!     let mut handle = SqlxHandle::open("example.db", OpenFlags::CREATE_IF_NECESSARY).await?;
//!     handle.execute("CREATE TABLE IF NOT EXISTS users (name TEXT)", &[]).await?;
//!
//!     let mut cursor = CursorGuard::new(handle.query("SELECT name FROM users", &[]).await?);
//!     for name in cursor.rows(|c| c.column_value(0)) {
//!         println!("{}", name?);
//!     }
//!     drop(cursor);
//!
//!     handle.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! Values bound to statements are always text or NULL; columns come back as
//! `serde_json::Value` in their native storage class (see [`decode::to_json`]).
//!
mod config;
mod cursor;
pub mod decode;
mod error;
mod handle;

// Re-export public types
pub use config::OpenFlags;
pub use cursor::{CursorGuard, RowCursor, Rows, SqliteCursor};
pub use error::Error;
pub use handle::{MEMORY_DATABASE, NativeHandle, SqlxHandle, TEMPORARY_DATABASE};

/// A type alias for Results with our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
