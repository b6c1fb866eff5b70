//! Statement builders
//!
//! Each builder collects optional parameters and callbacks and runs when
//! awaited. A supplied callback receives the same outcome the future resolves
//! to, so callers may use either style.

use std::future::{Future, IntoFuture};
use std::pin::Pin;

use serde_json::Value as JsonValue;
use sqlx_sqlite_native::NativeHandle;
use tracing::error;

use crate::executor;
use crate::params::Params;
use crate::projection::{ProjectionMode, Row};
use crate::session::Session;
use crate::{Error, Result};

/// Completion callback for `get`, `all` and `exec_sql`
pub type Callback<'a, T> = Box<dyn FnOnce(&Result<T>) + Send + 'a>;

/// Per-row callback for `each`; receives errors when no completion callback is set
pub type RowCallback<'a> = Box<dyn FnMut(std::result::Result<Row, &Error>) + Send + 'a>;

/// Completion callback for `each`, receiving the number of rows delivered
pub type CompleteCallback<'a> = Box<dyn FnOnce(std::result::Result<usize, &Error>) + Send + 'a>;

type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

fn deliver<T>(outcome: Result<T>, callback: Option<Callback<'_, T>>) -> Result<T> {
   if let Some(callback) = callback {
      callback(&outcome);
   }
   outcome
}

/// Builder for [`Session::get`]
pub struct GetBuilder<'a, H: NativeHandle> {
   session: &'a Session<H>,
   sql: String,
   params: Option<Params>,
   mode: Option<ProjectionMode>,
   callback: Option<Callback<'a, Option<Row>>>,
}

impl<'a, H: NativeHandle> GetBuilder<'a, H> {
   pub(crate) fn new(session: &'a Session<H>, sql: String) -> Self {
      Self {
         session,
         sql,
         params: None,
         mode: None,
         callback: None,
      }
   }

   /// Bind parameters for the statement
   pub fn params(mut self, params: impl Into<Params>) -> Self {
      self.params = Some(params.into());
      self
   }

   /// Projection mode for the returned row.
   ///
   /// Without a mode the row is projected as an array of native values,
   /// regardless of the session defaults. Pass [`ProjectionMode::INHERIT`] to
   /// use the defaults instead.
   pub fn mode(mut self, mode: ProjectionMode) -> Self {
      self.mode = Some(mode);
      self
   }

   pub fn callback(mut self, callback: impl FnOnce(&Result<Option<Row>>) + Send + 'a) -> Self {
      self.callback = Some(Box::new(callback));
      self
   }

   /// Run the query and return its first row
   pub async fn execute(self) -> Result<Option<Row>> {
      let outcome =
         executor::get(self.session, &self.sql, self.params.as_ref(), self.mode).await;
      deliver(outcome, self.callback)
   }
}

impl<'a, H: NativeHandle> IntoFuture for GetBuilder<'a, H> {
   type Output = Result<Option<Row>>;
   type IntoFuture = BoxedFuture<'a, Option<Row>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// Builder for [`Session::all`]
pub struct AllBuilder<'a, H: NativeHandle> {
   session: &'a Session<H>,
   sql: String,
   params: Option<Params>,
   callback: Option<Callback<'a, Vec<Row>>>,
}

impl<'a, H: NativeHandle> AllBuilder<'a, H> {
   pub(crate) fn new(session: &'a Session<H>, sql: String) -> Self {
      Self {
         session,
         sql,
         params: None,
         callback: None,
      }
   }

   /// Bind parameters for the statement
   pub fn params(mut self, params: impl Into<Params>) -> Self {
      self.params = Some(params.into());
      self
   }

   pub fn callback(mut self, callback: impl FnOnce(&Result<Vec<Row>>) + Send + 'a) -> Self {
      self.callback = Some(Box::new(callback));
      self
   }

   /// Run the query and return every row
   pub async fn execute(self) -> Result<Vec<Row>> {
      let outcome = executor::all(self.session, &self.sql, self.params.as_ref()).await;
      deliver(outcome, self.callback)
   }
}

impl<'a, H: NativeHandle> IntoFuture for AllBuilder<'a, H> {
   type Output = Result<Vec<Row>>;
   type IntoFuture = BoxedFuture<'a, Vec<Row>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// Builder for [`Session::exec_sql`]
pub struct ExecBuilder<'a, H: NativeHandle> {
   session: &'a Session<H>,
   sql: String,
   params: Option<Params>,
   callback: Option<Callback<'a, Option<JsonValue>>>,
}

impl<'a, H: NativeHandle> ExecBuilder<'a, H> {
   pub(crate) fn new(session: &'a Session<H>, sql: String) -> Self {
      Self {
         session,
         sql,
         params: None,
         callback: None,
      }
   }

   /// Bind parameters for the statement
   pub fn params(mut self, params: impl Into<Params>) -> Self {
      self.params = Some(params.into());
      self
   }

   pub fn callback(
      mut self,
      callback: impl FnOnce(&Result<Option<JsonValue>>) + Send + 'a,
   ) -> Self {
      self.callback = Some(Box::new(callback));
      self
   }

   /// Execute the statement and return its row id, change count or `None`
   pub async fn execute(self) -> Result<Option<JsonValue>> {
      let outcome = executor::exec_sql(self.session, &self.sql, self.params.as_ref()).await;
      deliver(outcome, self.callback)
   }
}

impl<'a, H: NativeHandle> IntoFuture for ExecBuilder<'a, H> {
   type Output = Result<Option<JsonValue>>;
   type IntoFuture = BoxedFuture<'a, Option<JsonValue>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// Builder for [`Session::each`]
///
/// A row callback is required. Errors go to the completion callback when one
/// is set, otherwise to the row callback.
pub struct EachBuilder<'a, H: NativeHandle> {
   session: &'a Session<H>,
   sql: String,
   params: Option<Params>,
   on_row: Option<RowCallback<'a>>,
   on_complete: Option<CompleteCallback<'a>>,
}

impl<'a, H: NativeHandle> EachBuilder<'a, H> {
   pub(crate) fn new(session: &'a Session<H>, sql: String) -> Self {
      Self {
         session,
         sql,
         params: None,
         on_row: None,
         on_complete: None,
      }
   }

   /// Bind parameters for the statement
   pub fn params(mut self, params: impl Into<Params>) -> Self {
      self.params = Some(params.into());
      self
   }

   /// Called once per row, in cursor order
   pub fn on_row(
      mut self,
      on_row: impl FnMut(std::result::Result<Row, &Error>) + Send + 'a,
   ) -> Self {
      self.on_row = Some(Box::new(on_row));
      self
   }

   /// Called once after the last row, with the number of rows delivered
   pub fn on_complete(
      mut self,
      on_complete: impl FnOnce(std::result::Result<usize, &Error>) + Send + 'a,
   ) -> Self {
      self.on_complete = Some(Box::new(on_complete));
      self
   }

   /// Run the query, streaming rows to the row callback
   pub async fn execute(self) -> Result<usize> {
      let Some(mut on_row) = self.on_row else {
         error!(sql = %self.sql, "each() called without a row callback");
         let err = Error::CallbackRequired;
         if let Some(on_complete) = self.on_complete {
            on_complete(Err(&err));
         }
         return Err(err);
      };

      let mut deliver_row = |row: Row| on_row(Ok(row));
      let outcome =
         executor::each(self.session, &self.sql, self.params.as_ref(), &mut deliver_row).await;

      match &outcome {
         Ok(count) => {
            if let Some(on_complete) = self.on_complete {
               on_complete(Ok(*count));
            }
         }
         Err(err) => match self.on_complete {
            Some(on_complete) => on_complete(Err(err)),
            None => on_row(Err(err)),
         },
      }
      outcome
   }
}

impl<'a, H: NativeHandle> IntoFuture for EachBuilder<'a, H> {
   type Output = Result<usize>;
   type IntoFuture = BoxedFuture<'a, usize>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}
