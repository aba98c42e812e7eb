#[cfg(feature = "csv")]
/// This module provides a CSV item reader implementation.
pub mod csv;

#[cfg(feature = "rdbc-sqlite")]
/// This module provides a SQLite item writer implementation.
pub mod rdbc;
