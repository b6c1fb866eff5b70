//! Checks what reaches the native handle, using a counting wrapper around the
//! sqlx-backed handle and a handle whose cursor fails partway through a walk.

use std::cell::Cell;

use serde_json::{Value as JsonValue, json};
use sqlite_session::{
   DatabaseDir, Error, NativeHandle, OpenFlags, Row, RowCursor, SessionRegistry, SqlxHandle,
};
use sqlx_sqlite_native::SqliteCursor;
use tempfile::TempDir;

// `#[tokio::test]` runs each test on its own current-thread runtime, so
// thread-local counters are private to a test.
thread_local! {
   static OPENS: Cell<usize> = const { Cell::new(0) };
   static EXECUTES: Cell<usize> = const { Cell::new(0) };
   static QUERIES: Cell<usize> = const { Cell::new(0) };
   static CLOSES: Cell<usize> = const { Cell::new(0) };
   static CURSOR_CLOSES: Cell<usize> = const { Cell::new(0) };
}

fn bump(counter: &'static std::thread::LocalKey<Cell<usize>>) {
   counter.with(|count| count.set(count.get() + 1));
}

fn calls() -> [usize; 4] {
   [
      OPENS.with(Cell::get),
      EXECUTES.with(Cell::get),
      QUERIES.with(Cell::get),
      CLOSES.with(Cell::get),
   ]
}

#[derive(Debug)]
struct Counting(SqlxHandle);

impl NativeHandle for Counting {
   type Cursor = SqliteCursor;

   async fn open(name: &str, flags: OpenFlags) -> sqlx_sqlite_native::Result<Self> {
      bump(&OPENS);
      SqlxHandle::open(name, flags).await.map(Counting)
   }

   async fn execute(
      &mut self,
      sql: &str,
      params: &[Option<String>],
   ) -> sqlx_sqlite_native::Result<()> {
      bump(&EXECUTES);
      self.0.execute(sql, params).await
   }

   async fn query(
      &mut self,
      sql: &str,
      params: &[Option<String>],
   ) -> sqlx_sqlite_native::Result<SqliteCursor> {
      bump(&QUERIES);
      self.0.query(sql, params).await
   }

   async fn close(self) -> sqlx_sqlite_native::Result<()> {
      bump(&CLOSES);
      self.0.close().await
   }
}

fn create_registry() -> (SessionRegistry<Counting>, TempDir) {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let registry = SessionRegistry::new(DatabaseDir::new(temp_dir.path()));
   (registry, temp_dir)
}

#[tokio::test]
async fn test_closed_session_never_reaches_handle() {
   let (registry, _temp) = create_registry();
   let db = registry.session("closed.db", None).unwrap();

   assert!(matches!(db.get("SELECT 1").await, Err(Error::NotOpen)));
   assert!(matches!(db.all("SELECT 1").await, Err(Error::NotOpen)));
   assert!(matches!(db.exec_sql("DELETE FROM t").await, Err(Error::NotOpen)));
   assert!(matches!(
      db.each("SELECT 1").on_row(|_| {}).await,
      Err(Error::NotOpen)
   ));
   assert!(matches!(db.close().await, Err(Error::NotOpen)));

   assert_eq!(calls(), [0, 0, 0, 0]);
}

#[tokio::test]
async fn test_exec_sql_introspects_only_writes() {
   let (registry, _temp) = create_registry();
   let db = registry.session("writes.db", None).unwrap();
   db.open().await.unwrap();
   db.open().await.unwrap();
   assert_eq!(calls(), [1, 0, 0, 0]);

   // DDL: one execute, no follow-up query
   db.exec_sql("CREATE TABLE t (x TEXT)").await.unwrap();
   assert_eq!(calls(), [1, 1, 0, 0]);

   // INSERT and UPDATE each add one introspection query
   db.exec_sql("INSERT INTO t VALUES (?)").params("a").await.unwrap();
   assert_eq!(calls(), [1, 2, 1, 0]);
   let changed = db.exec_sql("UPDATE t SET x = 'b'").await.unwrap();
   assert_eq!(changed, Some(json!(1)));
   assert_eq!(calls(), [1, 3, 2, 0]);

   // A failed statement skips introspection
   db.exec_sql("INSERT INTO missing VALUES (1)").await.unwrap_err();
   assert_eq!(calls(), [1, 4, 2, 0]);

   db.close().await.unwrap();
   assert_eq!(calls(), [1, 4, 2, 1]);
}

#[tokio::test]
async fn test_each_without_callback_skips_query() {
   let (registry, _temp) = create_registry();
   let db = registry.session("each.db", None).unwrap();
   db.open().await.unwrap();

   assert!(matches!(
      db.each("SELECT 1").await,
      Err(Error::CallbackRequired)
   ));
   assert_eq!(calls(), [1, 0, 0, 0]);

   let mut rows = 0;
   db.each("SELECT 1 UNION ALL SELECT 2")
      .on_row(|_| rows += 1)
      .await
      .unwrap();
   assert_eq!(rows, 2);
   assert_eq!(calls(), [1, 0, 1, 0]);
}

/// Three-row cursor over the integers 0..3 whose column read fails on one row
struct Flaky {
   fail_at: usize,
   position: Option<usize>,
}

const FLAKY_ROWS: usize = 3;

impl RowCursor for Flaky {
   fn row_count(&self) -> usize {
      FLAKY_ROWS
   }

   fn move_to_first(&mut self) -> bool {
      self.position = Some(0);
      true
   }

   fn move_to_next(&mut self) -> bool {
      let next = self.position.map_or(0, |position| position + 1);
      self.position = Some(next);
      next < FLAKY_ROWS
   }

   fn column_count(&self) -> usize {
      1
   }

   fn column_name(&self, index: usize) -> Option<&str> {
      (index == 0).then_some("n")
   }

   fn column_value(&self, _index: usize) -> sqlx_sqlite_native::Result<JsonValue> {
      match self.position {
         Some(position) if position == self.fail_at => Err(
            sqlx_sqlite_native::Error::UnsupportedDatatype("boom".into()),
         ),
         Some(position) => Ok(json!(position)),
         None => Err(sqlx_sqlite_native::Error::NoCurrentRow),
      }
   }

   fn close(&mut self) {
      bump(&CURSOR_CLOSES);
   }
}

/// Handle whose queries return a [`Flaky`] cursor failing on the row index
/// given as the first parameter
#[derive(Debug)]
struct FlakyHandle;

impl NativeHandle for FlakyHandle {
   type Cursor = Flaky;

   async fn open(_name: &str, _flags: OpenFlags) -> sqlx_sqlite_native::Result<Self> {
      Ok(FlakyHandle)
   }

   async fn execute(
      &mut self,
      _sql: &str,
      _params: &[Option<String>],
   ) -> sqlx_sqlite_native::Result<()> {
      Ok(())
   }

   async fn query(
      &mut self,
      _sql: &str,
      params: &[Option<String>],
   ) -> sqlx_sqlite_native::Result<Flaky> {
      let fail_at = params
         .first()
         .and_then(|param| param.as_deref())
         .and_then(|param| param.parse().ok())
         .unwrap_or(usize::MAX);
      Ok(Flaky {
         fail_at,
         position: None,
      })
   }

   async fn close(self) -> sqlx_sqlite_native::Result<()> {
      Ok(())
   }
}

async fn open_flaky() -> (SessionRegistry<FlakyHandle>, TempDir) {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let registry = SessionRegistry::new(DatabaseDir::new(temp_dir.path()));
   registry.session(":memory:", None).unwrap().open().await.unwrap();
   (registry, temp_dir)
}

fn cursor_closes() -> usize {
   CURSOR_CLOSES.with(Cell::get)
}

#[tokio::test]
async fn test_each_stops_at_failing_row_and_reports_to_on_complete() {
   let (registry, _temp) = open_flaky().await;
   let db = registry.get(":memory:").unwrap();

   let mut rows = Vec::new();
   let mut completed = None;
   let result = db
      .each("SELECT n FROM numbers")
      .params(1)
      .on_row(|row| rows.push(row.map_err(|e| e.error_code())))
      .on_complete(|outcome| completed = Some(outcome.map_err(|e| e.to_string())))
      .await;

   let Err(Error::Query(message)) = result else {
      panic!("expected a query error, got {result:?}");
   };
   assert!(message.contains("boom"));

   // Only the row before the failure was delivered
   assert_eq!(rows, vec![Ok(Row::Array(vec![json!(0)]))]);
   assert_eq!(completed, Some(Err(message)));
   assert_eq!(cursor_closes(), 1);
}

#[tokio::test]
async fn test_each_failing_row_without_on_complete_goes_to_on_row() {
   let (registry, _temp) = open_flaky().await;
   let db = registry.get(":memory:").unwrap();

   let mut rows = Vec::new();
   let result = db
      .each("SELECT n FROM numbers")
      .params(1)
      .on_row(|row| rows.push(row.map_err(|e| e.error_code())))
      .await;

   assert!(matches!(result, Err(Error::Query(_))));
   assert_eq!(
      rows,
      vec![Ok(Row::Array(vec![json!(0)])), Err("QUERY_ERROR")]
   );
   assert_eq!(cursor_closes(), 1);
}

#[tokio::test]
async fn test_each_without_failure_walks_every_row() {
   let (registry, _temp) = open_flaky().await;
   let db = registry.get(":memory:").unwrap();

   let mut rows = 0;
   let count = db
      .each("SELECT n FROM numbers")
      .on_row(|row| {
         assert!(row.is_ok());
         rows += 1;
      })
      .await
      .unwrap();

   assert_eq!((count, rows), (FLAKY_ROWS, FLAKY_ROWS));
   assert_eq!(cursor_closes(), 1);
}

#[tokio::test]
async fn test_all_fails_on_projection_error() {
   let (registry, _temp) = open_flaky().await;
   let db = registry.get(":memory:").unwrap();

   let mut seen = None;
   let result = db
      .all("SELECT n FROM numbers")
      .params(2)
      .callback(|outcome| seen = outcome.as_ref().err().map(Error::error_code))
      .await;

   assert!(matches!(result, Err(Error::Query(_))));
   assert_eq!(seen, Some("QUERY_ERROR"));
   assert_eq!(cursor_closes(), 1);
}

#[tokio::test]
async fn test_get_fails_on_projection_error() {
   let (registry, _temp) = open_flaky().await;
   let db = registry.get(":memory:").unwrap();

   let result = db.get("SELECT n FROM numbers").params(0).await;
   assert!(matches!(result, Err(Error::Query(_))));
   assert_eq!(cursor_closes(), 1);

   // Failing past the first row does not affect get
   let row = db.get("SELECT n FROM numbers").params(1).await.unwrap();
   assert_eq!(row, Some(Row::Array(vec![json!(0)])));
   assert_eq!(cursor_closes(), 2);
}
