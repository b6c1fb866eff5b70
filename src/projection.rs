//! Result projection: turning the cursor's current row into an application row
//!
//! A projection is chosen per call from two independent axes, row shape
//! (array or object) and value shape (native or strings). Each axis of a
//! requested [`ProjectionMode`] may be left unset, in which case the session
//! default for that axis applies.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx_sqlite_native::RowCursor;

use crate::Result;

/// Legacy bitmask values accepted by [`ProjectionMode::from_bits`].
pub mod bits {
   pub const RESULTS_AS_ARRAY: u32 = 1;
   pub const RESULTS_AS_OBJECT: u32 = 2;
   pub const VALUES_ARE_NATIVE: u32 = 4;
   pub const VALUES_ARE_STRINGS: u32 = 8;
}

/// Container shape of a projected row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowShape {
   /// Ordered sequence of column values
   #[default]
   Array,
   /// Column name to value mapping, in column order
   Object,
}

/// Representation of each column value in a projected row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueShape {
   /// Values in their native storage class
   #[default]
   Native,
   /// Every non-null value as text
   Strings,
}

/// A requested projection. `None` on an axis inherits the session default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectionMode {
   pub row: Option<RowShape>,
   pub value: Option<ValueShape>,
}

impl ProjectionMode {
   /// Inherit both axes from the session defaults
   pub const INHERIT: Self = Self {
      row: None,
      value: None,
   };
   pub const ARRAY: Self = Self::INHERIT.with_row(RowShape::Array);
   /// Rows keyed by column name; see [`Row::Object`] for repeated names
   pub const OBJECT: Self = Self::INHERIT.with_row(RowShape::Object);
   pub const NATIVE: Self = Self::INHERIT.with_value(ValueShape::Native);
   pub const STRINGS: Self = Self::INHERIT.with_value(ValueShape::Strings);

   pub const fn with_row(self, row: RowShape) -> Self {
      Self {
         row: Some(row),
         value: self.value,
      }
   }

   pub const fn with_value(self, value: ValueShape) -> Self {
      Self {
         row: self.row,
         value: Some(value),
      }
   }

   /// Decode a legacy bitmask (see [`bits`]).
   ///
   /// An axis with neither bit set inherits. When both bits of an axis are
   /// set, `RESULTS_AS_ARRAY` and `VALUES_ARE_NATIVE` take precedence.
   pub const fn from_bits(mask: u32) -> Self {
      let row = if mask & bits::RESULTS_AS_ARRAY != 0 {
         Some(RowShape::Array)
      } else if mask & bits::RESULTS_AS_OBJECT != 0 {
         Some(RowShape::Object)
      } else {
         None
      };

      let value = if mask & bits::VALUES_ARE_NATIVE != 0 {
         Some(ValueShape::Native)
      } else if mask & bits::VALUES_ARE_STRINGS != 0 {
         Some(ValueShape::Strings)
      } else {
         None
      };

      Self { row, value }
   }
}

/// Per-session default for each axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeDefaults {
   pub row: RowShape,
   pub value: ValueShape,
}

/// One projected row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Row {
   Array(Vec<JsonValue>),
   /// Columns keyed by name. Repeated names (`SELECT a.x, b.x ...`) share one
   /// entry at the first column's position holding the last column's value,
   /// so such a row has fewer entries than the array form. Alias the columns
   /// to keep them apart.
   Object(IndexMap<String, JsonValue>),
}

impl Row {
   /// Number of columns in the row
   pub fn len(&self) -> usize {
      match self {
         Row::Array(values) => values.len(),
         Row::Object(map) => map.len(),
      }
   }

   pub fn is_empty(&self) -> bool {
      self.len() == 0
   }

   /// Column value by position, whatever the row shape
   pub fn get(&self, index: usize) -> Option<&JsonValue> {
      match self {
         Row::Array(values) => values.get(index),
         Row::Object(map) => map.get_index(index).map(|(_, value)| value),
      }
   }

   pub fn as_array(&self) -> Option<&[JsonValue]> {
      match self {
         Row::Array(values) => Some(values),
         Row::Object(_) => None,
      }
   }

   pub fn as_object(&self) -> Option<&IndexMap<String, JsonValue>> {
      match self {
         Row::Array(_) => None,
         Row::Object(map) => Some(map),
      }
   }

   /// Column values in column order, dropping names
   pub fn into_values(self) -> Vec<JsonValue> {
      match self {
         Row::Array(values) => values,
         Row::Object(map) => map.into_values().collect(),
      }
   }
}

/// Projects the cursor's current row. Never moves the cursor.
pub type ProjectionFn = fn(&dyn RowCursor) -> Result<Row>;

/// Pick the projection for a call.
///
/// An absent mode always yields the array/native projection, regardless of
/// session defaults. A present mode resolves each unset axis from `defaults`.
pub fn resolve_engine(requested: Option<ProjectionMode>, defaults: ShapeDefaults) -> ProjectionFn {
   match requested {
      None => default_projection(),
      Some(mode) => projection_for(
         mode.row.unwrap_or(defaults.row),
         mode.value.unwrap_or(defaults.value),
      ),
   }
}

/// The unconditional projection used by bulk and streaming calls
pub fn default_projection() -> ProjectionFn {
   array_native
}

/// The fixed projection for a resolved pair of shapes
pub fn projection_for(row: RowShape, value: ValueShape) -> ProjectionFn {
   match (row, value) {
      (RowShape::Array, ValueShape::Native) => array_native,
      (RowShape::Array, ValueShape::Strings) => array_strings,
      (RowShape::Object, ValueShape::Native) => object_native,
      (RowShape::Object, ValueShape::Strings) => object_strings,
   }
}

fn array_native(cursor: &dyn RowCursor) -> Result<Row> {
   values(cursor, |value| value).map(Row::Array)
}

fn array_strings(cursor: &dyn RowCursor) -> Result<Row> {
   values(cursor, to_text).map(Row::Array)
}

fn object_native(cursor: &dyn RowCursor) -> Result<Row> {
   named_values(cursor, |value| value).map(Row::Object)
}

fn object_strings(cursor: &dyn RowCursor) -> Result<Row> {
   named_values(cursor, to_text).map(Row::Object)
}

fn values(cursor: &dyn RowCursor, shape: fn(JsonValue) -> JsonValue) -> Result<Vec<JsonValue>> {
   (0..cursor.column_count())
      .map(|index| -> Result<JsonValue> { Ok(shape(cursor.column_value(index)?)) })
      .collect()
}

fn named_values(
   cursor: &dyn RowCursor,
   shape: fn(JsonValue) -> JsonValue,
) -> Result<IndexMap<String, JsonValue>> {
   (0..cursor.column_count())
      .map(|index| -> Result<(String, JsonValue)> {
         let name = cursor.column_name(index).unwrap_or_default().to_string();
         Ok((name, shape(cursor.column_value(index)?)))
      })
      .collect()
}

fn to_text(value: JsonValue) -> JsonValue {
   match value {
      JsonValue::Null | JsonValue::String(_) => value,
      JsonValue::Bool(flag) => JsonValue::String(if flag { "1" } else { "0" }.to_string()),
      JsonValue::Number(number) => JsonValue::String(number.to_string()),
      nested => JsonValue::String(nested.to_string()),
   }
}
