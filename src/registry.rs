//! One session per database name

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sqlx_sqlite_native::{NativeHandle, SqlxHandle};
use tracing::{debug, warn};

use crate::Result;
use crate::resolve::DatabaseDir;
use crate::session::{Session, SessionOptions};

/// Registry handing out a single shared [`Session`] per database name.
///
/// The first request for a name constructs the session with the options it
/// was given; later requests return the same `Arc` and ignore their options.
/// Sessions live for as long as the registry does, open or closed.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> sqlite_session::Result<()> {
/// use std::sync::Arc;
/// use sqlite_session::{DatabaseDir, SessionRegistry};
///
/// let registry: SessionRegistry = SessionRegistry::new(DatabaseDir::new("/data/app"));
/// let first = registry.session("main.db", None)?;
/// let second = registry.session("main.db", None)?;
/// assert!(Arc::ptr_eq(&first, &second));
///
/// first.open().await?;
/// assert!(second.is_open());
/// # Ok(())
/// # }
/// ```
pub struct SessionRegistry<H: NativeHandle = SqlxHandle> {
   dir: DatabaseDir,
   sessions: Mutex<HashMap<String, Arc<Session<H>>>>,
}

impl<H: NativeHandle> SessionRegistry<H> {
   pub fn new(dir: DatabaseDir) -> Self {
      Self {
         dir,
         sessions: Mutex::new(HashMap::new()),
      }
   }

   /// Directory relative database names resolve against
   pub fn dir(&self) -> &DatabaseDir {
      &self.dir
   }

   /// Get the session for `name`, constructing it on first use.
   ///
   /// Construction resolves the name and creates the database's parent
   /// directory, but does not open the database.
   pub fn session(&self, name: &str, options: Option<SessionOptions>) -> Result<Arc<Session<H>>> {
      let mut sessions = self.sessions.lock();
      if let Some(existing) = sessions.get(name) {
         return Ok(Arc::clone(existing));
      }

      let location = self.dir.locate(name);
      self.dir.prepare(&location)?;

      let session = Arc::new(Session::new(
         name.to_string(),
         location,
         options.unwrap_or_default(),
      ));
      sessions.insert(name.to_string(), Arc::clone(&session));
      debug!(database = %name, "Session created");
      Ok(session)
   }

   /// The session for `name`, if one was constructed
   pub fn get(&self, name: &str) -> Option<Arc<Session<H>>> {
      self.sessions.lock().get(name).cloned()
   }

   pub fn len(&self) -> usize {
      self.sessions.lock().len()
   }

   pub fn is_empty(&self) -> bool {
      self.sessions.lock().is_empty()
   }

   /// Close every open session, returning how many were closed.
   ///
   /// Close failures are logged and skipped. Sessions stay registered.
   pub async fn close_all(&self) -> usize {
      let sessions: Vec<Arc<Session<H>>> = self.sessions.lock().values().cloned().collect();

      let mut closed = 0;
      for session in sessions.iter().filter(|session| session.is_open()) {
         match session.close().await {
            Ok(()) => closed += 1,
            Err(e) => warn!(database = %session.name(), error = %e, "Failed to close database"),
         }
      }
      closed
   }
}

impl<H: NativeHandle> std::fmt::Debug for SessionRegistry<H> {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      let sessions = self.sessions.lock();
      f.debug_struct("SessionRegistry")
         .field("dir", &self.dir)
         .field("sessions", &sessions.keys().collect::<Vec<_>>())
         .finish()
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::DatabaseLocation;
   use sqlx_sqlite_native::OpenFlags;
   use tempfile::TempDir;

   fn registry() -> (TempDir, SessionRegistry) {
      let temp = TempDir::new().unwrap();
      let registry = SessionRegistry::new(DatabaseDir::new(temp.path()));
      (temp, registry)
   }

   #[test]
   fn test_same_name_same_session() {
      let (_temp, registry) = registry();

      let first = registry.session("app.db", None).unwrap();
      let second = registry.session("app.db", None).unwrap();

      assert!(Arc::ptr_eq(&first, &second));
      assert_eq!(registry.len(), 1);
   }

   #[test]
   fn test_distinct_names_distinct_sessions() {
      let (_temp, registry) = registry();

      let a = registry.session("a.db", None).unwrap();
      let b = registry.session("b.db", None).unwrap();

      assert!(!Arc::ptr_eq(&a, &b));
      assert_eq!(registry.len(), 2);
   }

   #[test]
   fn test_first_options_win() {
      let (_temp, registry) = registry();

      let options = SessionOptions {
         open_flags: OpenFlags::READ_ONLY,
      };
      registry.session("app.db", Some(options)).unwrap();
      let again = registry.session("app.db", None).unwrap();

      assert!(again.options().open_flags.contains(OpenFlags::READ_ONLY));
   }

   #[test]
   fn test_session_starts_closed() {
      let (_temp, registry) = registry();
      let session = registry.session("app.db", None).unwrap();
      assert!(!session.is_open());
   }

   #[test]
   fn test_memory_name_is_shared() {
      let (_temp, registry) = registry();

      let first = registry.session(":memory:", None).unwrap();
      let second = registry.session(":memory:", None).unwrap();

      assert!(Arc::ptr_eq(&first, &second));
      assert_eq!(*first.location(), DatabaseLocation::Memory);
   }

   #[test]
   fn test_nested_name_creates_parent() {
      let (temp, registry) = registry();

      registry.session("nested/dir/app.db", None).unwrap();

      assert!(temp.path().join("nested/dir").is_dir());
      // The database file itself is only created by open
      assert!(!temp.path().join("nested/dir/app.db").exists());
   }

   #[test]
   fn test_get_unknown_name() {
      let (_temp, registry) = registry();
      assert!(registry.get("missing.db").is_none());
      assert!(registry.is_empty());
   }
}
