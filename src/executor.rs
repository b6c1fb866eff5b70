//! Statement execution against a session's native handle
//!
//! Each function holds the session's handle lock for the whole statement, so
//! a cursor walk is never interleaved with another statement on the same
//! session. Cursors are wrapped in a [`CursorGuard`] and therefore closed on
//! every exit path.

use serde_json::Value as JsonValue;
use sqlx_sqlite_native::{CursorGuard, NativeHandle, RowCursor};
use tracing::error;

use crate::params::{Params, coerce};
use crate::projection::{ProjectionFn, ProjectionMode, Row, default_projection, resolve_engine};
use crate::session::Session;
use crate::{Error, Result};

const LAST_INSERT_ROWID: &str = "select last_insert_rowid()";
const CHANGES: &str = "select changes()";

/// How `exec_sql` reports on a statement after running it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatementKind {
   /// Report the generated row id
   Insert,
   /// Report the number of changed rows
   UpdateOrDelete,
   /// Report nothing
   Other,
}

impl StatementKind {
   /// Classify by the first seven characters of the trimmed statement
   pub(crate) fn classify(sql: &str) -> Self {
      let head = sql.trim().chars().take(7).collect::<String>().to_lowercase();
      match head.as_str() {
         "insert " => StatementKind::Insert,
         "update " | "delete " => StatementKind::UpdateOrDelete,
         _ => StatementKind::Other,
      }
   }

   fn introspection(self) -> Option<&'static str> {
      match self {
         StatementKind::Insert => Some(LAST_INSERT_ROWID),
         StatementKind::UpdateOrDelete => Some(CHANGES),
         StatementKind::Other => None,
      }
   }
}

fn query_failed(sql: &str, err: impl std::fmt::Display) -> Error {
   error!(sql = %sql, error = %err, "Query failed");
   Error::Query(err.to_string())
}

fn exec_failed(sql: &str, err: impl std::fmt::Display) -> Error {
   error!(sql = %sql, error = %err, "Statement failed");
   Error::Exec(err.to_string())
}

/// Run a query and project its first row, or `None` for an empty result.
async fn first_row<H: NativeHandle>(
   handle: &mut H,
   sql: &str,
   params: &[Option<String>],
   project: ProjectionFn,
) -> Result<Option<Row>> {
   let cursor = handle
      .query(sql, params)
      .await
      .map_err(|e| query_failed(sql, e))?;
   let mut cursor = CursorGuard::new(cursor);

   if cursor.row_count() == 0 {
      return Ok(None);
   }

   cursor.move_to_first();
   let row = project(&*cursor).map_err(|e| query_failed(sql, e))?;
   Ok(Some(row))
}

pub(crate) async fn get<H: NativeHandle>(
   session: &Session<H>,
   sql: &str,
   params: Option<&Params>,
   mode: Option<ProjectionMode>,
) -> Result<Option<Row>> {
   let mut slot = session.lock().await;
   let handle = session.open_handle(&mut slot)?;
   let project = resolve_engine(mode, session.defaults());
   first_row(handle, sql, &coerce(params), project).await
}

pub(crate) async fn exec_sql<H: NativeHandle>(
   session: &Session<H>,
   sql: &str,
   params: Option<&Params>,
) -> Result<Option<JsonValue>> {
   let mut slot = session.lock().await;
   let handle = session.open_handle(&mut slot)?;
   let kind = StatementKind::classify(sql);

   handle
      .execute(sql, &coerce(params))
      .await
      .map_err(|e| exec_failed(sql, e))?;

   let Some(introspection) = kind.introspection() else {
      return Ok(None);
   };

   let row = first_row(handle, introspection, &[], default_projection()).await?;
   Ok(row.and_then(|row| row.into_values().into_iter().next()))
}

pub(crate) async fn all<H: NativeHandle>(
   session: &Session<H>,
   sql: &str,
   params: Option<&Params>,
) -> Result<Vec<Row>> {
   let mut slot = session.lock().await;
   let handle = session.open_handle(&mut slot)?;
   let cursor = handle
      .query(sql, &coerce(params))
      .await
      .map_err(|e| query_failed(sql, e))?;
   let mut cursor = CursorGuard::new(cursor);

   if cursor.row_count() == 0 {
      return Ok(Vec::new());
   }

   let project = default_projection();
   cursor
      .rows(|c| project(c))
      .collect::<Result<Vec<Row>>>()
      .map_err(|e| query_failed(sql, e))
}

pub(crate) async fn each<H: NativeHandle>(
   session: &Session<H>,
   sql: &str,
   params: Option<&Params>,
   on_row: &mut (dyn FnMut(Row) + Send),
) -> Result<usize> {
   let mut slot = session.lock().await;
   let handle = session.open_handle(&mut slot)?;
   let cursor = handle
      .query(sql, &coerce(params))
      .await
      .map_err(|e| query_failed(sql, e))?;
   let mut cursor = CursorGuard::new(cursor);

   let project = default_projection();
   let mut count = 0;
   for row in cursor.rows(|c| project(c)) {
      on_row(row.map_err(|e| query_failed(sql, e))?);
      count += 1;
   }
   Ok(count)
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_classify_insert() {
      assert_eq!(
         StatementKind::classify("INSERT INTO t(x) VALUES('a')"),
         StatementKind::Insert
      );
      assert_eq!(
         StatementKind::classify("   insert into t values (1)"),
         StatementKind::Insert
      );
   }

   #[test]
   fn test_classify_update_and_delete() {
      assert_eq!(
         StatementKind::classify("UPDATE t SET x = 'b'"),
         StatementKind::UpdateOrDelete
      );
      assert_eq!(
         StatementKind::classify("\n\tDelete from t"),
         StatementKind::UpdateOrDelete
      );
   }

   #[test]
   fn test_classify_other() {
      assert_eq!(StatementKind::classify("CREATE TABLE t(x)"), StatementKind::Other);
      assert_eq!(StatementKind::classify("PRAGMA user_version = 3"), StatementKind::Other);
      assert_eq!(StatementKind::classify(""), StatementKind::Other);
      // The keyword must be followed by a space
      assert_eq!(StatementKind::classify("INSERT\nINTO t VALUES (1)"), StatementKind::Other);
      assert_eq!(StatementKind::classify("updates"), StatementKind::Other);
   }

   #[test]
   fn test_classify_multibyte_prefix() {
      assert_eq!(StatementKind::classify("ÜPDATE t"), StatementKind::Other);
   }

   #[test]
   fn test_introspection_queries() {
      assert_eq!(StatementKind::Insert.introspection(), Some(LAST_INSERT_ROWID));
      assert_eq!(StatementKind::UpdateOrDelete.introspection(), Some(CHANGES));
      assert_eq!(StatementKind::Other.introspection(), None);
   }
}
