//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and macros
//! to make it easier to get started with the library.

pub use crate::{
    DatabaseType, Db, DbError, DriverError, Reason, Record, ResultSet, RowValues, Transaction,
    impl_record, params,
};

#[cfg(feature = "sqlite")]
pub use crate::{SqliteOptions, SqliteOptionsBuilder};
