//! Database file locations and the file operations around them
//!
//! Stands in for the host platform's database directory: relative database
//! names resolve against a [`DatabaseDir`], which also creates parent folders
//! and checks, deletes, or seeds database files.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sqlx_sqlite_native::{MEMORY_DATABASE, TEMPORARY_DATABASE};
use tracing::{debug, error};

use crate::Result;

/// Sidecar files SQLite may leave next to a database file
const SIDECAR_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

/// Where a session's database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
   /// Private temporary database (empty name)
   Temporary,
   /// Private in-memory database (`:memory:`)
   Memory,
   /// Database file at an absolute or resolved path
   File(PathBuf),
}

impl DatabaseLocation {
   /// The name handed to the native handle's `open`
   pub fn native_name(&self) -> String {
      match self {
         DatabaseLocation::Temporary => TEMPORARY_DATABASE.to_string(),
         DatabaseLocation::Memory => MEMORY_DATABASE.to_string(),
         DatabaseLocation::File(path) => path.to_string_lossy().into_owned(),
      }
   }

   pub fn is_file(&self) -> bool {
      matches!(self, DatabaseLocation::File(_))
   }
}

/// Base directory for relative database names.
///
/// # Example
///
/// ```
/// use sqlite_session::{DatabaseDir, DatabaseLocation};
///
/// let dir = DatabaseDir::new("/data/app/databases");
/// assert_eq!(dir.locate(":memory:"), DatabaseLocation::Memory);
/// assert_eq!(
///    dir.locate("main.db"),
///    DatabaseLocation::File("/data/app/databases/main.db".into())
/// );
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseDir {
   root: PathBuf,
}

impl DatabaseDir {
   pub fn new(root: impl Into<PathBuf>) -> Self {
      Self { root: root.into() }
   }

   pub fn root(&self) -> &Path {
      &self.root
   }

   /// Resolve a database name. Absolute paths are kept as they are.
   pub fn locate(&self, name: &str) -> DatabaseLocation {
      match name {
         TEMPORARY_DATABASE => DatabaseLocation::Temporary,
         MEMORY_DATABASE => DatabaseLocation::Memory,
         _ => DatabaseLocation::File(self.root.join(name)),
      }
   }

   /// Create the parent directory of a file location if it is missing.
   pub fn prepare(&self, location: &DatabaseLocation) -> Result<()> {
      let DatabaseLocation::File(path) = location else {
         return Ok(());
      };

      if let Some(parent) = path.parent()
         && !parent.as_os_str().is_empty()
         && !parent.exists()
      {
         debug!(dir = %parent.display(), "Creating database directory");
         fs::create_dir_all(parent).inspect_err(|e| {
            error!(dir = %parent.display(), error = %e, "Unable to create database directory");
         })?;
      }
      Ok(())
   }

   /// Returns true if a database file with this name exists
   pub fn exists(&self, name: &str) -> bool {
      match self.locate(name) {
         DatabaseLocation::File(path) => path.is_file(),
         _ => false,
      }
   }

   /// Delete a database file and any sidecar files next to it.
   ///
   /// Returns false if there was no database file to delete.
   pub fn delete(&self, name: &str) -> Result<bool> {
      let DatabaseLocation::File(path) = self.locate(name) else {
         return Ok(false);
      };

      if !path.is_file() {
         return Ok(false);
      }

      fs::remove_file(&path)?;

      // Sidecars may not exist - ignore "not found" but propagate other errors
      for suffix in SIDECAR_SUFFIXES {
         if let Err(e) = fs::remove_file(sidecar(&path, suffix))
            && e.kind() != ErrorKind::NotFound
         {
            return Err(e.into());
         }
      }

      debug!(path = %path.display(), "Deleted database");
      Ok(true)
   }

   /// Seed a database from a bundled asset.
   ///
   /// Copies `asset_root/name` to the location of the final component of
   /// `name`, creating the database directory first. Returns the copied path.
   pub fn copy_asset(&self, asset_root: &Path, name: &str) -> Result<PathBuf> {
      let source = asset_root.join(name);
      let file_name = Path::new(name)
         .file_name()
         .map(|file_name| file_name.to_string_lossy().into_owned())
         .unwrap_or_else(|| name.to_string());

      let location = self.locate(&file_name);
      self.prepare(&location)?;

      let DatabaseLocation::File(target) = location else {
         return Err(std::io::Error::new(
            ErrorKind::InvalidInput,
            format!("cannot copy an asset into database '{name}'"),
         )
         .into());
      };

      fs::copy(&source, &target).inspect_err(|e| {
         error!(source = %source.display(), error = %e, "Unable to copy database asset");
      })?;

      debug!(source = %source.display(), target = %target.display(), "Copied database asset");
      Ok(target)
   }
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
   let mut name = OsString::from(path.as_os_str());
   name.push(suffix);
   PathBuf::from(name)
}
