//! SQLite backend for the crowdfunding core.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every `call` runs to completion before
//! the next one starts, and multi-statement operations run in a transaction.

mod encode;
mod principals;
mod projects;
mod reports;
mod schema;
mod sessions;
mod store;
mod tokens;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
