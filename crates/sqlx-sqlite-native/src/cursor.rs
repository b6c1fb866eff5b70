//! Forward-only row cursors over query results

use std::iter::FusedIterator;
use std::ops::{Deref, DerefMut};

use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row};

use crate::Error;
use crate::decode::to_json;

/// Sequential, forward-only view over a result set.
///
/// A freshly returned cursor sits *before* the first row; column access is
/// only valid after a successful [`move_to_first`](Self::move_to_first) or
/// [`move_to_next`](Self::move_to_next). Implementations must make
/// [`close`](Self::close) idempotent.
pub trait RowCursor: Send {
   /// Total number of rows in the result set
   fn row_count(&self) -> usize;

   /// Position on the first row. Returns false if there are no rows.
   fn move_to_first(&mut self) -> bool;

   /// Advance one row. Returns false once the cursor moves past the last row.
   fn move_to_next(&mut self) -> bool;

   /// Number of columns in the result set
   fn column_count(&self) -> usize;

   /// Name of the column at `index`, if it exists
   fn column_name(&self, index: usize) -> Option<&str>;

   /// Native value of column `index` on the current row
   fn column_value(&self, index: usize) -> Result<JsonValue, Error>;

   /// Release the rows held by this cursor
   fn close(&mut self);

   /// Walk the cursor once from the first row, projecting each row with `project`.
   ///
   /// The returned sequence is lazy, finite and not restartable. The cursor is
   /// moved before each projection; `project` must not move it.
   fn rows<F, T>(&mut self, project: F) -> Rows<'_, Self, F>
   where
      Self: Sized,
      F: FnMut(&Self) -> T,
   {
      let remaining = self.row_count();
      Rows {
         cursor: self,
         project,
         remaining,
         started: false,
      }
   }
}

/// Lazy single-pass sequence of projected rows. See [`RowCursor::rows`].
pub struct Rows<'c, C, F> {
   cursor: &'c mut C,
   project: F,
   remaining: usize,
   started: bool,
}

impl<C, F, T> Iterator for Rows<'_, C, F>
where
   C: RowCursor,
   F: FnMut(&C) -> T,
{
   type Item = T;

   fn next(&mut self) -> Option<T> {
      if self.remaining == 0 {
         return None;
      }

      let positioned = if self.started {
         self.cursor.move_to_next()
      } else {
         self.started = true;
         self.cursor.move_to_first()
      };

      if !positioned {
         self.remaining = 0;
         return None;
      }

      self.remaining -= 1;
      Some((self.project)(&*self.cursor))
   }

   fn size_hint(&self) -> (usize, Option<usize>) {
      (0, Some(self.remaining))
   }
}

impl<C, F, T> FusedIterator for Rows<'_, C, F>
where
   C: RowCursor,
   F: FnMut(&C) -> T,
{
}

/// RAII guard that closes its cursor on drop.
///
/// Derefs to the wrapped cursor, so every exit path of a statement (including
/// early returns through `?`) releases the result set.
#[derive(Debug)]
pub struct CursorGuard<C: RowCursor> {
   cursor: C,
}

impl<C: RowCursor> CursorGuard<C> {
   pub fn new(cursor: C) -> Self {
      Self { cursor }
   }
}

impl<C: RowCursor> Deref for CursorGuard<C> {
   type Target = C;

   fn deref(&self) -> &C {
      &self.cursor
   }
}

impl<C: RowCursor> DerefMut for CursorGuard<C> {
   fn deref_mut(&mut self) -> &mut C {
      &mut self.cursor
   }
}

impl<C: RowCursor> Drop for CursorGuard<C> {
   fn drop(&mut self) {
      self.cursor.close();
   }
}

/// Cursor over rows materialised by sqlx.
pub struct SqliteCursor {
   rows: Vec<SqliteRow>,
   // None before the first move; Some(rows.len()) once past the end
   position: Option<usize>,
   closed: bool,
}

impl std::fmt::Debug for SqliteCursor {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("SqliteCursor")
         .field("rows", &self.rows.len())
         .field("position", &self.position)
         .field("closed", &self.closed)
         .finish()
   }
}

impl SqliteCursor {
   pub fn new(rows: Vec<SqliteRow>) -> Self {
      Self {
         rows,
         position: None,
         closed: false,
      }
   }

   pub fn is_closed(&self) -> bool {
      self.closed
   }

   fn current_row(&self) -> Result<&SqliteRow, Error> {
      if self.closed {
         return Err(Error::CursorClosed);
      }
      self
         .position
         .and_then(|position| self.rows.get(position))
         .ok_or(Error::NoCurrentRow)
   }
}

impl RowCursor for SqliteCursor {
   fn row_count(&self) -> usize {
      self.rows.len()
   }

   fn move_to_first(&mut self) -> bool {
      if self.closed || self.rows.is_empty() {
         return false;
      }
      self.position = Some(0);
      true
   }

   fn move_to_next(&mut self) -> bool {
      if self.closed {
         return false;
      }
      let next = self.position.map_or(0, |position| position + 1);
      self.position = Some(next.min(self.rows.len()));
      next < self.rows.len()
   }

   fn column_count(&self) -> usize {
      self.rows.first().map_or(0, |row| row.columns().len())
   }

   fn column_name(&self, index: usize) -> Option<&str> {
      self
         .rows
         .first()
         .and_then(|row| row.columns().get(index))
         .map(|column| column.name())
   }

   fn column_value(&self, index: usize) -> Result<JsonValue, Error> {
      let row = self.current_row()?;
      let count = row.columns().len();
      if index >= count {
         return Err(Error::ColumnOutOfRange { index, count });
      }
      to_json(row.try_get_raw(index)?)
   }

   fn close(&mut self) {
      self.rows.clear();
      self.position = None;
      self.closed = true;
   }
}
