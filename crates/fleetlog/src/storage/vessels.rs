//! Vessel rows.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{decode_row, now_text, timestamp_column, Storage};
use crate::error::Result;
use crate::model::{NewVessel, Vessel};

impl Storage {
    /// Insert a vessel for a company. Input is stored as given.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_vessel(&self, company_id: i64, vessel: &NewVessel) -> Result<Vessel> {
        let (created_at, created_text) = now_text();
        self.conn.execute(
            r"
            INSERT INTO vessels (company_id, name, imo_number, mmsi, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                company_id,
                vessel.name,
                vessel.imo_number,
                vessel.mmsi,
                created_text
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted vessel {} with id {}", vessel.name, id);
        Ok(Vessel {
            id,
            company_id,
            name: vessel.name.clone(),
            imo_number: vessel.imo_number.clone(),
            mmsi: vessel.mmsi.clone(),
            created_at,
        })
    }

    /// Get one of a company's vessels.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_vessel(&self, company_id: i64, id: i64) -> Result<Option<Vessel>> {
        let result = self
            .conn
            .query_row(
                r"
                SELECT id, company_id, name, imo_number, mmsi, created_at
                FROM vessels WHERE id = ?1 AND company_id = ?2
                ",
                [id, company_id],
                Self::row_to_vessel,
            )
            .optional()?;
        Ok(result)
    }

    /// List a company's vessels in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_vessels(&self, company_id: i64) -> Result<Vec<Vessel>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, company_id, name, imo_number, mmsi, created_at
            FROM vessels WHERE company_id = ?1 ORDER BY id
            ",
        )?;

        let vessels = stmt
            .query_map([company_id], Self::row_to_vessel)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(vessels)
    }

    /// Delete one of a company's vessels. Its reports are kept.
    ///
    /// Returns `true` if a vessel was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_vessel(&self, company_id: i64, id: i64) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM vessels WHERE id = ?1 AND company_id = ?2",
            [id, company_id],
        )?;
        Ok(affected > 0)
    }

    fn row_to_vessel(row: &rusqlite::Row) -> rusqlite::Result<Vessel> {
        decode_row(row, "vessel", Self::decode_vessel)
    }

    fn decode_vessel(row: &rusqlite::Row) -> rusqlite::Result<Vessel> {
        Ok(Vessel {
            id: row.get(0)?,
            company_id: row.get(1)?,
            name: row.get(2)?,
            imo_number: row.get(3)?,
            mmsi: row.get(4)?,
            created_at: timestamp_column(row, 5)?,
        })
    }
}
