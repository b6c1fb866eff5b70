//! Native database handle: opens a SQLite database and runs raw SQL

use std::future::Future;

use sqlx::sqlite::{
   SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteJournalMode,
};
use sqlx::{ConnectOptions, Connection, Sqlite};
use tracing::{debug, trace};

use crate::Result;
use crate::config::OpenFlags;
use crate::cursor::{RowCursor, SqliteCursor};

/// Name that opens a private in-memory database
pub const MEMORY_DATABASE: &str = ":memory:";

/// Name that opens a private temporary on-disk database
pub const TEMPORARY_DATABASE: &str = "";

/// An open connection to one SQLite database.
///
/// Parameters are always bound as text (or NULL); the engine applies column
/// affinity. A handle is not safe for concurrent statement issuance: callers
/// hold it behind `&mut` and must serialise statements themselves.
pub trait NativeHandle: Send + Sized + 'static {
   type Cursor: RowCursor + 'static;

   /// Open the database called `name` ([`MEMORY_DATABASE`],
   /// [`TEMPORARY_DATABASE`], or a file path)
   fn open(name: &str, flags: OpenFlags) -> impl Future<Output = Result<Self>> + Send;

   /// Run a statement that produces no rows
   fn execute(
      &mut self,
      sql: &str,
      params: &[Option<String>],
   ) -> impl Future<Output = Result<()>> + Send;

   /// Run a query and return a cursor positioned before its first row
   fn query(
      &mut self,
      sql: &str,
      params: &[Option<String>],
   ) -> impl Future<Output = Result<Self::Cursor>> + Send;

   /// Release the connection
   fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// [`NativeHandle`] backed by a single sqlx connection.
///
/// # Example
///
/// ```no_run
/// use sqlx_sqlite_native::{NativeHandle, OpenFlags, RowCursor, SqlxHandle};
///
/// # async fn example() -> sqlx_sqlite_native::Result<()> {
/// let mut handle = SqlxHandle::open(":memory:", OpenFlags::default()).await?;
/// handle.execute("CREATE TABLE t (x TEXT)", &[]).await?;
/// handle
///    .execute("INSERT INTO t (x) VALUES (?)", &[Some("a".into())])
///    .await?;
///
/// let cursor = handle.query("SELECT x FROM t", &[]).await?;
/// assert_eq!(cursor.row_count(), 1);
///
/// handle.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SqlxHandle {
   conn: SqliteConnection,
}

impl SqlxHandle {
   fn connect_options(name: &str, flags: OpenFlags) -> SqliteConnectOptions {
      let options = SqliteConnectOptions::new()
         .filename(name)
         .read_only(flags.contains(OpenFlags::READ_ONLY))
         .create_if_missing(flags.contains(OpenFlags::CREATE_IF_NECESSARY))
         // SQLite's own default; sqlx would otherwise switch enforcement on
         .foreign_keys(false);

      if flags.contains(OpenFlags::ENABLE_WRITE_AHEAD_LOGGING) {
         options.journal_mode(SqliteJournalMode::Wal)
      } else {
         options
      }
   }
}

fn bind_text<'q>(
   mut query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
   params: &[Option<String>],
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
   for param in params {
      query = query.bind(param.clone());
   }
   query
}

impl NativeHandle for SqlxHandle {
   type Cursor = SqliteCursor;

   async fn open(name: &str, flags: OpenFlags) -> Result<Self> {
      debug!(database = %name, flags = flags.bits(), "Opening native handle");
      let conn = Self::connect_options(name, flags).connect().await?;
      Ok(Self { conn })
   }

   async fn execute(&mut self, sql: &str, params: &[Option<String>]) -> Result<()> {
      trace!(sql = %sql, params = params.len(), "execute");
      bind_text(sqlx::query(sql), params)
         .execute(&mut self.conn)
         .await?;
      Ok(())
   }

   async fn query(&mut self, sql: &str, params: &[Option<String>]) -> Result<SqliteCursor> {
      trace!(sql = %sql, params = params.len(), "query");
      let rows = bind_text(sqlx::query(sql), params)
         .fetch_all(&mut self.conn)
         .await?;
      Ok(SqliteCursor::new(rows))
   }

   async fn close(self) -> Result<()> {
      self.conn.close().await?;
      Ok(())
   }
}
