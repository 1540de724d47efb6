//! Storage layer for fleetlog.
//!
//! This module provides `SQLite`-based persistent storage for companies,
//! vessels, report templates and reports. Every query that reads or writes
//! tenant data is scoped by company id.
//!
//! The handle is opened once at startup and closed explicitly at shutdown;
//! it is passed to whoever needs it rather than held globally.

mod companies;
pub mod migrations;
mod reports;
pub mod schema;
mod templates;
mod vessels;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use reports::ReportFilter;

/// Storage engine for fleet records.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Close the database, flushing pending writes.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` refuses to close the connection.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, err)| Error::DatabaseQuery(err))?;
        info!("Database closed at {}", path.display());
        Ok(())
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let count = |sql: &str| -> Result<i64> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            companies: count("SELECT COUNT(*) FROM companies")?,
            vessels: count("SELECT COUNT(*) FROM vessels")?,
            templates: count("SELECT COUNT(*) FROM report_templates")?,
            draft_reports: count("SELECT COUNT(*) FROM reports WHERE status = 'draft'")?,
            submitted_reports: count("SELECT COUNT(*) FROM reports WHERE status = 'submitted'")?,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Registered companies.
    pub companies: i64,
    /// Registered vessels, all companies.
    pub vessels: i64,
    /// Report templates, all companies.
    pub templates: i64,
    /// Reports still in draft.
    pub draft_reports: i64,
    /// Submitted reports.
    pub submitted_reports: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Timestamp in the stored text form.
fn now_text() -> (DateTime<Utc>, String) {
    let now = Utc::now();
    (now, now.to_rfc3339())
}

/// Read an RFC 3339 timestamp column.
fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a JSON-encoded column.
fn json_column<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode a row whose first column is its id.
///
/// Conversion failures come back carrying [`Error::CorruptRecord`], which the
/// `From<rusqlite::Error>` conversion unwraps.
fn decode_row<T>(
    row: &rusqlite::Row,
    entity: &'static str,
    decode: impl FnOnce(&rusqlite::Row) -> rusqlite::Result<T>,
) -> rusqlite::Result<T> {
    let id: i64 = row.get(0)?;
    decode(row).map_err(|err| {
        let (idx, ty, message) = match err {
            rusqlite::Error::FromSqlConversionFailure(idx, ty, source) => {
                (idx, ty, source.to_string())
            }
            rusqlite::Error::InvalidColumnType(idx, name, ty) => {
                (idx, ty, format!("'{name}' holds {ty}"))
            }
            other => return other,
        };
        let corrupt = Error::CorruptRecord {
            entity,
            id,
            message: format!("column {idx}: {message}"),
        };
        rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(corrupt))
    })
}

/// Clamp a row count for use as a SQL `LIMIT`.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
