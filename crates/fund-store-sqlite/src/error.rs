//! Error type for `fund-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("sum of donations to project {0} overflowed")]
  SumOverflow(uuid::Uuid),

  #[error("unknown {column} value: {value:?}")]
  UnknownDiscriminant { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
