//! # sqlite-session
//!
//! Named SQLite sessions with statement execution and caller-selectable row
//! projection, on top of the native handle in [`sqlx_sqlite_native`].
//!
//! - **[`SessionRegistry`]** hands out one shared [`Session`] per database name
//! - **[`Session`]** opens and closes its database and runs statements:
//!   [`get`](Session::get), [`all`](Session::all), [`each`](Session::each) and
//!   [`exec_sql`](Session::exec_sql)
//! - **[`Params`]** are coerced to text before binding
//! - **[`ProjectionMode`]** picks array or object rows holding native or string values
//!
//! ## Usage
//!
//! ```no_run
//! use sqlite_session::{DatabaseDir, ProjectionMode, Row, SessionRegistry};
//!
//! #[tokio::main]
//! async fn main() -> sqlite_session::Result<()> {
//!    let registry: SessionRegistry = SessionRegistry::new(DatabaseDir::new("/data/app"));
//!    let db = registry.session("main.db", None)?;
//!    db.open().await?;
//!
//!    db.exec_sql("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT)")
//!       .await?;
//!
//!    // INSERT resolves to the new row id
//!    let id = db
//!       .exec_sql("INSERT INTO users (name) VALUES (?)")
//!       .params("Alice")
//!       .await?;
//!
//!    // Rows come back as arrays of native values unless a mode says otherwise
//!    let user = db
//!       .get("SELECT id, name FROM users WHERE id = ?")
//!       .params(id.unwrap_or_default())
//!       .mode(ProjectionMode::OBJECT)
//!       .await?;
//!    if let Some(Row::Object(user)) = user {
//!       println!("{}", user["name"]);
//!    }
//!
//!    let count = db
//!       .each("SELECT name FROM users")
//!       .on_row(|row| println!("{row:?}"))
//!       .await?;
//!    println!("{count} users");
//!
//!    db.close().await?;
//!    Ok(())
//! }
//! ```

mod builders;
mod error;
mod executor;
mod params;
mod projection;
mod registry;
mod resolve;
mod session;

pub use builders::{
   AllBuilder, Callback, CompleteCallback, EachBuilder, ExecBuilder, GetBuilder, RowCallback,
};
pub use error::{Error, Result};
pub use params::{Params, coerce};
pub use projection::{
   ProjectionFn, ProjectionMode, Row, RowShape, ShapeDefaults, ValueShape, bits,
   default_projection, projection_for, resolve_engine,
};
pub use registry::SessionRegistry;
pub use resolve::{DatabaseDir, DatabaseLocation};
pub use session::{Session, SessionOptions};

pub use sqlx_sqlite_native::{NativeHandle, OpenFlags, RowCursor, SqlxHandle};
