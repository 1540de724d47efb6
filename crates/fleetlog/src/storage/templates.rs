//! Report template rows.
//!
//! Field lists are stored as a JSON array of names.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{decode_row, json_column, now_text, timestamp_column, Storage};
use crate::error::Result;
use crate::model::{ReportTemplate, ReportType};

const TEMPLATE_COLUMNS: &str = "id, company_id, report_type, fields, updated_at";

impl Storage {
    /// Insert a template row.
    ///
    /// Does not check for an existing template of the same type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_template(
        &self,
        company_id: i64,
        report_type: &ReportType,
        fields: &[String],
    ) -> Result<ReportTemplate> {
        let (updated_at, updated_text) = now_text();
        let encoded = serde_json::to_string(fields)?;
        self.conn.execute(
            r"
            INSERT INTO report_templates (company_id, report_type, fields, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![company_id, report_type.as_str(), encoded, updated_text],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted template '{}' with id {}", report_type, id);
        Ok(ReportTemplate {
            id,
            company_id,
            report_type: report_type.clone(),
            fields: fields.to_vec(),
            updated_at,
        })
    }

    /// Overwrite the field list of an existing template.
    ///
    /// Returns `false` if the template does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn replace_template_fields(&self, template_id: i64, fields: &[String]) -> Result<bool> {
        let (_, updated_text) = now_text();
        let encoded = serde_json::to_string(fields)?;
        let affected = self.conn.execute(
            "UPDATE report_templates SET fields = ?1, updated_at = ?2 WHERE id = ?3",
            params![encoded, updated_text, template_id],
        )?;
        Ok(affected > 0)
    }

    /// The active template for a report type: the newest row if several exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_template(
        &self,
        company_id: i64,
        report_type: &ReportType,
    ) -> Result<Option<ReportTemplate>> {
        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM report_templates
             WHERE company_id = ?1 AND report_type = ?2 ORDER BY id DESC LIMIT 1"
        );
        let result = self
            .conn
            .query_row(
                &sql,
                params![company_id, report_type.as_str()],
                Self::row_to_template,
            )
            .optional()?;
        Ok(result)
    }

    /// Get one of a company's templates by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_template(&self, company_id: i64, id: i64) -> Result<Option<ReportTemplate>> {
        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM report_templates WHERE id = ?1 AND company_id = ?2"
        );
        let result = self
            .conn
            .query_row(&sql, [id, company_id], Self::row_to_template)
            .optional()?;
        Ok(result)
    }

    /// List a company's templates ordered by report type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_templates(&self, company_id: i64) -> Result<Vec<ReportTemplate>> {
        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM report_templates
             WHERE company_id = ?1 ORDER BY report_type, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let templates = stmt
            .query_map([company_id], Self::row_to_template)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(templates)
    }

    /// Delete one of a company's templates. Existing reports are unaffected.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_template(&self, company_id: i64, id: i64) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM report_templates WHERE id = ?1 AND company_id = ?2",
            [id, company_id],
        )?;
        Ok(affected > 0)
    }

    fn row_to_template(row: &rusqlite::Row) -> rusqlite::Result<ReportTemplate> {
        decode_row(row, "template", Self::decode_template)
    }

    fn decode_template(row: &rusqlite::Row) -> rusqlite::Result<ReportTemplate> {
        let report_type: String = row.get(2)?;
        Ok(ReportTemplate {
            id: row.get(0)?,
            company_id: row.get(1)?,
            report_type: ReportType::parse(&report_type).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            fields: json_column(row, 3)?,
            updated_at: timestamp_column(row, 4)?,
        })
    }
}
