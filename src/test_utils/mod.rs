//! Test helpers: an in-memory connection that replays scripted results.
//!
//! Available to this crate's tests and, behind the `test-utils` feature, to callers who want to
//! exercise their own builders without a database.

mod scripted;

pub use scripted::ScriptedConnection;
