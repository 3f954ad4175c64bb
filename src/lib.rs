//! Fluent `insert` / `update` / `delete` / `select` builders over a blocking connection.
//!
//! Statements are built through chained setters, rendered with positional `?` placeholders and
//! optionally remembered under a logical name so later builders reuse the text. Select results
//! are mapped into caller records ([`Record`], usually via [`impl_record!`]), and engine errors are
//! translated into [`DbError`] reason flags.
//!
//! ```rust
//! use fluent_sql::prelude::*;
//!
//! # fn main() -> Result<(), DbError> {
//! let dir = tempfile::tempdir().map_err(|e| DbError::from_reason(Reason::OpenFailed).with_origin(e))?;
//! let path = dir.path().join("app.db");
//! let db = Db::sqlite_builder(path.to_string_lossy()).build()?;
//!
//! #[derive(Debug, Default)]
//! struct Cosa {
//!     id: i64,
//!     nombre: String,
//! }
//! impl_record!(Cosa { id: i64, nombre: String });
//!
//! let mut cosas: Vec<Cosa> = Vec::new();
//! db.select("cosas")
//!     .table("(select 1 as id, 'uno' as nombre)")
//!     .columns(["id", "nombre"])
//!     .execute(&mut cosas)?;
//! assert_eq!(cosas[0].nombre, "uno");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod connection;
pub mod db;
pub mod error;
pub mod mapper;
pub mod placeholders;
pub mod prelude;
pub mod prepared;
pub mod query_builder;
pub mod results;
pub mod transaction;
pub mod types;
pub mod vendor;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{SharedStatementCache, StatementCache};
pub use connection::{Connection, Executor, PreparedHandle, RowCursor, TransactionHandle};
pub use db::{DEFAULT_UNBOUNDED_LIMIT, Db};
pub use error::{DbError, DriverError, Reason};
pub use mapper::{ColumnBinding, FieldKind, FieldSpec, FieldValue, Record};
pub use prepared::{PreparedDelete, PreparedInsert, PreparedUpdate};
pub use query_builder::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};
pub use results::{BufferedCursor, FetchedRow, ResultSet};
pub use transaction::Transaction;
pub use types::{DatabaseType, ExecOutcome, RowValues};
pub use vendor::{CodeTable, ErrorTranslator, SqliteErrorTranslator};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnection, SqliteOptions, SqliteOptionsBuilder};
