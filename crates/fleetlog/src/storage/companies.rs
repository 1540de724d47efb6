//! Company account rows.

use rusqlite::{params, ErrorCode, OptionalExtension};
use tracing::debug;

use super::{decode_row, now_text, timestamp_column, Storage};
use crate::error::{Error, Result};
use crate::model::Company;

impl Storage {
    /// Insert a company with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] if the name is taken, or an error if
    /// the database operation fails.
    pub fn insert_company(&self, name: &str, password_hash: &str) -> Result<Company> {
        let (created_at, created_text) = now_text();
        let inserted = self.conn.execute(
            "INSERT INTO companies (name, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![name, password_hash, created_text],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Err(Error::DuplicateName {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.conn.last_insert_rowid();
        debug!("Inserted company {} with id {}", name, id);
        Ok(Company {
            id,
            name: name.to_string(),
            created_at,
        })
    }

    /// Look up a company and its stored password hash by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_company_credentials(&self, name: &str) -> Result<Option<(Company, String)>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, name, created_at, password_hash FROM companies WHERE name = ?1",
                [name],
                |row| Ok((Self::row_to_company(row)?, row.get(3)?)),
            )
            .optional()?;
        Ok(result)
    }

    /// Get a company by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_company(&self, id: i64) -> Result<Option<Company>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM companies WHERE id = ?1",
                [id],
                Self::row_to_company,
            )
            .optional()?;
        Ok(result)
    }

    fn row_to_company(row: &rusqlite::Row) -> rusqlite::Result<Company> {
        decode_row(row, "company", Self::decode_company)
    }

    fn decode_company(row: &rusqlite::Row) -> rusqlite::Result<Company> {
        Ok(Company {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: timestamp_column(row, 2)?,
        })
    }
}
