//! Column value decoding from SQLite storage classes to JSON values

use base64::Engine;
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteValueRef;
use sqlx::{TypeInfo, Value, ValueRef};
use time::PrimitiveDateTime;

use crate::Error;

/// Decode one column value into its native JSON representation.
///
/// The runtime storage class drives the mapping, so expression columns such as
/// `last_insert_rowid()` decode the same way as table columns:
///
/// | SQLite | JSON |
/// |---|---|
/// | NULL | `null` |
/// | INTEGER / NUMERIC | number |
/// | REAL | number |
/// | TEXT, DATE, TIME | string |
/// | DATETIME | string (normalised when it parses) |
/// | BOOLEAN | bool |
/// | BLOB | base64 string |
pub fn to_json(value: SqliteValueRef) -> Result<JsonValue, Error> {
   if value.is_null() {
      return Ok(JsonValue::Null);
   }

   let owned = value.to_owned();
   let type_name = value.type_info().name().to_string();

   let decoded = match type_name.as_str() {
      "INTEGER" | "NUMERIC" => owned.try_decode::<i64>().ok().map(JsonValue::from),
      "REAL" => owned.try_decode::<f64>().ok().map(JsonValue::from),
      "BOOLEAN" => owned.try_decode::<bool>().ok().map(JsonValue::Bool),
      "TEXT" | "DATE" | "TIME" => owned.try_decode::<String>().ok().map(JsonValue::String),
      "DATETIME" => owned
         .try_decode::<PrimitiveDateTime>()
         .map(|dt| dt.to_string())
         .or_else(|_| owned.try_decode::<String>())
         .ok()
         .map(JsonValue::String),
      "BLOB" => owned
         .try_decode::<Vec<u8>>()
         .ok()
         .map(|blob| JsonValue::String(encode_blob(&blob))),
      "NULL" => Some(JsonValue::Null),
      other => match owned.try_decode::<String>() {
         Ok(text) => Some(JsonValue::String(text)),
         Err(_) => {
            return Err(Error::UnsupportedDatatype(format!(
               "Unknown SQLite type: {other}"
            )));
         }
      },
   };

   Ok(decoded.unwrap_or(JsonValue::Null))
}

/// BLOBs travel as base64 text since JSON has no binary type
pub fn encode_blob(data: &[u8]) -> String {
   base64::engine::general_purpose::STANDARD.encode(data)
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_encode_blob() {
      assert_eq!(encode_blob(b"hello"), "aGVsbG8=");
      assert_eq!(encode_blob(&[]), "");
      assert_eq!(encode_blob(&[0, 0, 0]), "AAAA");
      assert_eq!(encode_blob(&[255, 255, 255]), "////");
   }
}
