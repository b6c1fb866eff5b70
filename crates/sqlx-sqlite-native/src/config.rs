//! Open flags for native database handles

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Flags controlling how a native handle opens its database.
///
/// The numeric values are stable so hosts can pass them through as plain
/// integers (for example from a JSON options object).
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_native::OpenFlags;
///
/// let flags = OpenFlags::READ_ONLY | OpenFlags::NO_LOCALIZED_COLLATORS;
/// assert!(flags.contains(OpenFlags::READ_ONLY));
/// assert!(!flags.contains(OpenFlags::CREATE_IF_NECESSARY));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpenFlags(u32);

impl OpenFlags {
   /// Open for reading and writing (the default)
   pub const READ_WRITE: Self = Self(0x0000_0000);

   /// Open read-only. Writes fail with the engine's read-only error.
   pub const READ_ONLY: Self = Self(0x0000_0001);

   /// Accepted for compatibility; SQLite has no localized collators to skip.
   pub const NO_LOCALIZED_COLLATORS: Self = Self(0x0000_0010);

   /// Create the database file if it does not exist
   pub const CREATE_IF_NECESSARY: Self = Self(0x1000_0000);

   /// Switch the database to WAL journaling on open
   pub const ENABLE_WRITE_AHEAD_LOGGING: Self = Self(0x2000_0000);

   /// Build flags from a raw bit value. Unknown bits are kept but ignored.
   pub const fn from_bits(bits: u32) -> Self {
      Self(bits)
   }

   /// The raw bit value
   pub const fn bits(self) -> u32 {
      self.0
   }

   /// Returns true if every bit of `other` is set in `self`
   pub const fn contains(self, other: Self) -> bool {
      self.0 & other.0 == other.0
   }
}

impl BitOr for OpenFlags {
   type Output = Self;

   fn bitor(self, rhs: Self) -> Self {
      Self(self.0 | rhs.0)
   }
}

impl BitOrAssign for OpenFlags {
   fn bitor_assign(&mut self, rhs: Self) {
      self.0 |= rhs.0;
   }
}
