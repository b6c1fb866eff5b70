//! Bind parameter coercion
//!
//! The native handle binds every parameter as text (or NULL), so callers'
//! JSON values are normalised here before a statement runs.

use serde_json::Value as JsonValue;

/// Bind parameters for one statement: a single scalar or an ordered list.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
   Single(JsonValue),
   List(Vec<JsonValue>),
}

impl From<JsonValue> for Params {
   /// A JSON array becomes a parameter list; anything else a single parameter.
   fn from(value: JsonValue) -> Self {
      match value {
         JsonValue::Array(values) => Params::List(values),
         other => Params::Single(other),
      }
   }
}

impl<T: Into<JsonValue>> From<Vec<T>> for Params {
   fn from(values: Vec<T>) -> Self {
      Params::List(values.into_iter().map(Into::into).collect())
   }
}

impl From<&str> for Params {
   fn from(value: &str) -> Self {
      Params::Single(JsonValue::from(value))
   }
}

impl From<String> for Params {
   fn from(value: String) -> Self {
      Params::Single(JsonValue::from(value))
   }
}

impl From<i32> for Params {
   fn from(value: i32) -> Self {
      Params::Single(JsonValue::from(value))
   }
}

impl From<i64> for Params {
   fn from(value: i64) -> Self {
      Params::Single(JsonValue::from(value))
   }
}

impl From<f64> for Params {
   fn from(value: f64) -> Self {
      Params::Single(JsonValue::from(value))
   }
}

impl From<bool> for Params {
   fn from(value: bool) -> Self {
      Params::Single(JsonValue::from(value))
   }
}

/// Coerce parameters to their textual bind form, one entry per input value.
///
/// `None` (no parameters supplied) binds nothing. JSON `null` stays `None`
/// rather than becoming the text `"null"`.
///
/// Numbers keep their JSON text form, so a float such as `2.0` binds as
/// `"2.0"`, not `"2"`. INTEGER and REAL columns convert either form to the
/// same number by affinity, but a TEXT column stores the text as given.
pub fn coerce(params: Option<&Params>) -> Vec<Option<String>> {
   match params {
      None => Vec::new(),
      Some(Params::Single(value)) => vec![to_text(value)],
      Some(Params::List(values)) => values.iter().map(to_text).collect(),
   }
}

fn to_text(value: &JsonValue) -> Option<String> {
   match value {
      JsonValue::Null => None,
      JsonValue::String(text) => Some(text.clone()),
      JsonValue::Bool(flag) => Some(flag.to_string()),
      JsonValue::Number(number) => Some(number.to_string()),
      // Nested structures bind as their JSON text
      nested => Some(nested.to_string()),
   }
}
