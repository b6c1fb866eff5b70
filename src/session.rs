//! Session state: one named database, its handle, and its projection defaults

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx_sqlite_native::{NativeHandle, OpenFlags, SqlxHandle};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error};

use crate::builders::{AllBuilder, EachBuilder, ExecBuilder, GetBuilder};
use crate::projection::{ProjectionMode, RowShape, ShapeDefaults, ValueShape};
use crate::resolve::DatabaseLocation;
use crate::{Error, Result};

/// Options recognised when a session is first constructed.
///
/// # Examples
///
/// ```
/// use sqlite_session::{OpenFlags, SessionOptions};
///
/// let options = SessionOptions {
///    open_flags: OpenFlags::READ_ONLY,
/// };
///
/// // Options also deserialize from a host's JSON
/// let options: SessionOptions = serde_json::from_str(r#"{ "openFlags": 1 }"#).unwrap();
/// assert!(options.open_flags.contains(OpenFlags::READ_ONLY));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionOptions {
   /// Flags passed to the native handle's `open`.
   ///
   /// File-backed databases always add [`OpenFlags::CREATE_IF_NECESSARY`].
   ///
   /// Default: [`OpenFlags::READ_WRITE`]
   pub open_flags: OpenFlags,
}

/// A logical handle to one named database.
///
/// Sessions are obtained from a [`SessionRegistry`](crate::SessionRegistry),
/// which hands out the same `Arc<Session>` for the same name. A session starts
/// closed; every statement entry point fails with [`Error::NotOpen`] until
/// [`open`](Self::open) succeeds.
///
/// Statements on one session are serialised: each holds the handle lock for
/// its whole execution, including its cursor walk and any follow-up
/// introspection query.
pub struct Session<H: NativeHandle = SqlxHandle> {
   name: String,
   location: DatabaseLocation,
   options: SessionOptions,
   handle: Mutex<Option<H>>,
   open: AtomicBool,
   defaults: RwLock<ShapeDefaults>,
}

impl<H: NativeHandle> std::fmt::Debug for Session<H> {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("Session")
         .field("name", &self.name)
         .field("location", &self.location)
         .field("open", &self.is_open())
         .field("defaults", &*self.defaults.read())
         .finish()
   }
}

impl<H: NativeHandle> Session<H> {
   pub(crate) fn new(name: String, location: DatabaseLocation, options: SessionOptions) -> Self {
      Self {
         name,
         location,
         options,
         handle: Mutex::new(None),
         open: AtomicBool::new(false),
         defaults: RwLock::new(ShapeDefaults::default()),
      }
   }

   /// The name this session was constructed with
   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn location(&self) -> &DatabaseLocation {
      &self.location
   }

   pub fn options(&self) -> &SessionOptions {
      &self.options
   }

   /// Open the database.
   ///
   /// Opening an already-open session is a no-op. On failure the session
   /// stays closed and [`Error::Open`] carries the engine's message.
   pub async fn open(&self) -> Result<()> {
      let mut handle = self.handle.lock().await;
      if handle.is_some() {
         debug!(database = %self.name, "Database already open");
         return Ok(());
      }

      let mut flags = self.options.open_flags;
      if self.location.is_file() {
         flags |= OpenFlags::CREATE_IF_NECESSARY;
      }

      let opened = H::open(&self.location.native_name(), flags)
         .await
         .map_err(|e| {
            error!(database = %self.name, error = %e, "Unable to open database");
            Error::Open(e.to_string())
         })?;

      *handle = Some(opened);
      self.open.store(true, Ordering::SeqCst);
      debug!(database = %self.name, "Database opened");
      Ok(())
   }

   /// Close the database and release its handle.
   ///
   /// Fails with [`Error::NotOpen`] if the session is already closed. The
   /// session is closed afterwards even if the handle reports a close failure.
   pub async fn close(&self) -> Result<()> {
      let mut handle = self.handle.lock().await;
      let Some(native) = handle.take() else {
         error!(database = %self.name, "Database is already closed");
         return Err(Error::NotOpen);
      };
      self.open.store(false, Ordering::SeqCst);

      native.close().await.map_err(|e| {
         error!(database = %self.name, error = %e, "Unable to close database");
         Error::Close(e.to_string())
      })?;

      debug!(database = %self.name, "Database closed");
      Ok(())
   }

   pub fn is_open(&self) -> bool {
      self.open.load(Ordering::SeqCst)
   }

   /// Current projection defaults for both axes
   pub fn defaults(&self) -> ShapeDefaults {
      *self.defaults.read()
   }

   /// Set the default row shape from `mode`'s row axis.
   ///
   /// A mode that leaves the row axis unset is ignored. Returns the default in
   /// effect afterwards.
   pub fn result_shape(&self, mode: ProjectionMode) -> RowShape {
      let mut defaults = self.defaults.write();
      if let Some(row) = mode.row {
         defaults.row = row;
      }
      defaults.row
   }

   /// Set the default value shape from `mode`'s value axis.
   ///
   /// A mode that leaves the value axis unset is ignored. Returns the default
   /// in effect afterwards.
   pub fn value_shape(&self, mode: ProjectionMode) -> ValueShape {
      let mut defaults = self.defaults.write();
      if let Some(value) = mode.value {
         defaults.value = value;
      }
      defaults.value
   }

   /// Fetch the first row of a query, or `None` when it returns no rows.
   ///
   /// # Example
   ///
   /// ```no_run
   /// # async fn example(session: &sqlite_session::Session) -> sqlite_session::Result<()> {
   /// use sqlite_session::ProjectionMode;
   ///
   /// let row = session
   ///    .get("SELECT name FROM users WHERE id = ?")
   ///    .params(1)
   ///    .mode(ProjectionMode::OBJECT)
   ///    .await?;
   /// # Ok(())
   /// # }
   /// ```
   pub fn get(&self, sql: impl Into<String>) -> GetBuilder<'_, H> {
      GetBuilder::new(self, sql.into())
   }

   /// Fetch every row of a query as array/native rows.
   pub fn all(&self, sql: impl Into<String>) -> AllBuilder<'_, H> {
      AllBuilder::new(self, sql.into())
   }

   /// Stream every row of a query to a callback, resolving to the row count.
   ///
   /// # Example
   ///
   /// ```no_run
   /// # async fn example(session: &sqlite_session::Session) -> sqlite_session::Result<()> {
   /// let count = session
   ///    .each("SELECT name FROM users")
   ///    .on_row(|row| {
   ///       if let Ok(row) = row {
   ///          println!("{:?}", row.get(0));
   ///       }
   ///    })
   ///    .await?;
   /// # Ok(())
   /// # }
   /// ```
   pub fn each(&self, sql: impl Into<String>) -> EachBuilder<'_, H> {
      EachBuilder::new(self, sql.into())
   }

   /// Execute a statement. INSERT resolves to the new row id, UPDATE and
   /// DELETE to the number of changed rows, anything else to `None`.
   ///
   /// # Example
   ///
   /// ```no_run
   /// # async fn example(session: &sqlite_session::Session) -> sqlite_session::Result<()> {
   /// let id = session
   ///    .exec_sql("INSERT INTO users (name) VALUES (?)")
   ///    .params("Alice")
   ///    .await?;
   /// # Ok(())
   /// # }
   /// ```
   pub fn exec_sql(&self, sql: impl Into<String>) -> ExecBuilder<'_, H> {
      ExecBuilder::new(self, sql.into())
   }

   /// Read the schema version stored in `PRAGMA user_version`
   pub async fn version(&self) -> Result<Option<i64>> {
      let row = self
         .get("PRAGMA user_version")
         .mode(ProjectionMode::ARRAY)
         .await?;

      Ok(row
         .and_then(|row| row.into_values().into_iter().next())
         .and_then(|value| match value {
            JsonValue::Number(number) => number.as_i64(),
            JsonValue::String(text) => text.trim().parse().ok(),
            _ => None,
         }))
   }

   /// Write the schema version stored in `PRAGMA user_version`
   pub async fn set_version(&self, version: i64) -> Result<()> {
      self
         .exec_sql(format!("PRAGMA user_version = {version}"))
         .await?;
      Ok(())
   }

   /// Lock the handle slot for one statement
   pub(crate) async fn lock(&self) -> MutexGuard<'_, Option<H>> {
      self.handle.lock().await
   }

   /// The open handle behind a locked slot, failing if the session is closed
   pub(crate) fn open_handle<'g>(&self, slot: &'g mut Option<H>) -> Result<&'g mut H> {
      slot.as_mut().ok_or_else(|| {
         error!(database = %self.name, "Database is not open");
         Error::NotOpen
      })
   }
}
