//! Errors shared by the vislog crates
//!
//! Storage and startup faults only. Request validation lives in the
//! server's `ApiError`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// SQLite query or connection failure
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Creating the root folder or reading the config file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad config file, bind address or capacity
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored row carries a timestamp that doesn't parse
    #[error("Invalid stored timestamp {raw:?}: {reason}")]
    InvalidTimestamp { raw: String, reason: String },
}
