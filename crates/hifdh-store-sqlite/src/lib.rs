//! SQLite backend for the hifdh study store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Writes that touch both a
//! daily log and its profile go through a single transaction on that
//! thread, which is what makes [`SqliteStore`] safe under concurrent
//! saves.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
