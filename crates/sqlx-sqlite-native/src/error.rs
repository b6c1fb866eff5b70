//! Error types for sqlx-sqlite-native

use thiserror::Error;

/// Errors that may occur when working with a native handle or its cursors
#[derive(Error, Debug)]
pub enum Error {
   /// IO error when accessing database files. Standard library IO errors
   /// are converted to this variant.
   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   /// Error from the sqlx library. The message is the engine's own.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// SQLite type that cannot be mapped to a JSON value
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// Column access attempted while the cursor is not positioned on a row
   #[error("cursor is not positioned on a row")]
   NoCurrentRow,

   /// Column index past the end of the row
   #[error("column index {index} out of range for row with {count} columns")]
   ColumnOutOfRange { index: usize, count: usize },

   /// Cursor has been closed and cannot be read
   #[error("cursor has been closed")]
   CursorClosed,
}
