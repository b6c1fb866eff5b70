use serde::{Serialize, Serializer};

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for hosts that forward errors to a UI.
#[derive(Serialize)]
struct ErrorResponse {
   code: String,
   message: String,
}

/// Error types for session and statement operations.
///
/// Every failure is returned through `Result` (and handed to any supplied
/// callback); nothing in this crate panics across the public boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Operation attempted on a closed session.
   #[error("database is not open")]
   NotOpen,

   /// The native handle failed to open.
   #[error("unable to open database: {0}")]
   Open(String),

   /// The native handle failed to close.
   #[error("unable to close database: {0}")]
   Close(String),

   /// A query or the projection of its rows failed. The engine's message is kept verbatim.
   #[error("{0}")]
   Query(String),

   /// A statement failed to execute. The engine's message is kept verbatim.
   #[error("{0}")]
   Exec(String),

   /// `each()` was called without a row callback.
   #[error("each() requires a row callback")]
   CallbackRequired,

   /// I/O error when preparing, copying or deleting database files.
   #[error("io error: {0}")]
   Io(#[from] std::io::Error),

   /// Error from the native handle or cursor.
   #[error(transparent)]
   Native(#[from] sqlx_sqlite_native::Error),
}

impl Error {
   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> &'static str {
      match self {
         Error::NotOpen => "NOT_OPEN",
         Error::Open(_) => "OPEN_ERROR",
         Error::Close(_) => "CLOSE_ERROR",
         Error::Query(_) => "QUERY_ERROR",
         Error::Exec(_) => "EXEC_ERROR",
         Error::CallbackRequired => "CALLBACK_REQUIRED",
         Error::Io(_) => "IO_ERROR",
         Error::Native(_) => "NATIVE_ERROR",
      }
   }
}

impl Serialize for Error {
   fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
   where
      S: Serializer,
   {
      let response = ErrorResponse {
         code: self.error_code().to_string(),
         message: self.to_string(),
      };
      response.serialize(serializer)
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_not_open() {
      assert_eq!(Error::NotOpen.error_code(), "NOT_OPEN");
      assert_eq!(Error::NotOpen.to_string(), "database is not open");
   }

   #[test]
   fn test_query_and_exec_messages_are_verbatim() {
      let err = Error::Query("no such table: t".into());
      assert_eq!(err.error_code(), "QUERY_ERROR");
      assert_eq!(err.to_string(), "no such table: t");

      let err = Error::Exec("near \"CREAT\": syntax error".into());
      assert_eq!(err.error_code(), "EXEC_ERROR");
      assert_eq!(err.to_string(), "near \"CREAT\": syntax error");
   }

   #[test]
   fn test_error_code_lifecycle() {
      assert_eq!(Error::Open("locked".into()).error_code(), "OPEN_ERROR");
      assert_eq!(Error::Close("busy".into()).error_code(), "CLOSE_ERROR");
      assert_eq!(Error::CallbackRequired.error_code(), "CALLBACK_REQUIRED");
   }

   #[test]
   fn test_error_code_native() {
      let err = Error::Native(sqlx_sqlite_native::Error::NoCurrentRow);
      assert_eq!(err.error_code(), "NATIVE_ERROR");
      assert_eq!(err.to_string(), "cursor is not positioned on a row");
   }

   #[test]
   fn test_serialize_as_code_and_message() {
      let json = serde_json::to_value(Error::NotOpen).unwrap();
      assert_eq!(
         json,
         serde_json::json!({ "code": "NOT_OPEN", "message": "database is not open" })
      );
   }
}
