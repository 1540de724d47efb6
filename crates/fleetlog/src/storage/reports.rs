//! Report rows and the draft/submitted guard.
//!
//! Writes to a report's data or status only match rows still in `draft`, so
//! a submitted report cannot be changed through this layer whatever the
//! caller does.

use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

use super::{decode_row, json_column, now_text, sql_limit, timestamp_column, Storage};
use crate::error::{Error, Result};
use crate::model::{Report, ReportData, ReportStatus, ReportType, Vessel};

const REPORT_COLUMNS: &str = "id, vessel_id, company_id, vessel_name, report_type, data, \
                              status, created_at, updated_at, submitted_at";

/// Criteria for listing a company's reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// Only reports in this state.
    pub status: Option<ReportStatus>,
    /// Only reports about this vessel.
    pub vessel_id: Option<i64>,
    /// Only reports of this type.
    pub report_type: Option<ReportType>,
    /// At most this many reports.
    pub limit: Option<usize>,
}

impl ReportFilter {
    /// Submitted reports only.
    #[must_use]
    pub fn submitted() -> Self {
        Self {
            status: Some(ReportStatus::Submitted),
            ..Self::default()
        }
    }

    /// Drafts only.
    #[must_use]
    pub fn drafts() -> Self {
        Self {
            status: Some(ReportStatus::Draft),
            ..Self::default()
        }
    }
}

impl Storage {
    /// Open a new draft report about `vessel` with the given snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_draft(
        &self,
        vessel: &Vessel,
        report_type: &ReportType,
        data: &ReportData,
    ) -> Result<Report> {
        let (now, stamp) = now_text();
        self.conn.execute(
            r"
            INSERT INTO reports
                (vessel_id, company_id, vessel_name, report_type, data, status,
                 created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 'draft', ?6, ?6)
            ",
            params![
                vessel.id,
                vessel.company_id,
                vessel.name,
                report_type.as_str(),
                data.to_json()?,
                stamp,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(
            "Opened draft {} ({} for {})",
            id, report_type, vessel.name
        );
        Ok(Report {
            id,
            vessel_id: vessel.id,
            company_id: vessel.company_id,
            vessel_name: vessel.name.clone(),
            report_type: report_type.clone(),
            data: data.clone(),
            status: ReportStatus::Draft,
            created_at: now,
            updated_at: now,
            submitted_at: None,
        })
    }

    /// Get one of a company's reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_report(&self, company_id: i64, id: i64) -> Result<Option<Report>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1 AND company_id = ?2");
        let result = self
            .conn
            .query_row(&sql, [id, company_id], Self::row_to_report)
            .optional()?;
        Ok(result)
    }

    /// Overwrite a draft's snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] if the report is submitted,
    /// [`Error::NotFound`] if it does not exist, or an error if the database
    /// operation fails.
    pub fn update_draft_data(&self, report_id: i64, data: &ReportData) -> Result<DateTime<Utc>> {
        let (now, stamp) = now_text();
        let affected = self.conn.execute(
            "UPDATE reports SET data = ?1, updated_at = ?2 WHERE id = ?3 AND status = 'draft'",
            params![data.to_json()?, stamp, report_id],
        )?;
        if affected == 0 {
            return Err(self.rejected_write(report_id, "editing")?);
        }
        debug!("Saved draft {}", report_id);
        Ok(now)
    }

    /// Move a draft to submitted. Happens at most once per report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] if the report is already
    /// submitted, [`Error::NotFound`] if it does not exist, or an error if the
    /// database operation fails.
    pub fn mark_submitted(&self, report_id: i64) -> Result<DateTime<Utc>> {
        let (now, stamp) = now_text();
        let affected = self.conn.execute(
            r"
            UPDATE reports SET status = 'submitted', submitted_at = ?1, updated_at = ?1
            WHERE id = ?2 AND status = 'draft'
            ",
            params![stamp, report_id],
        )?;
        if affected == 0 {
            return Err(self.rejected_write(report_id, "submitting")?);
        }
        info!("Report {} submitted", report_id);
        Ok(now)
    }

    /// List a company's reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_reports(&self, company_id: i64, filter: &ReportFilter) -> Result<Vec<Report>> {
        let mut sql = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE company_id = ?1");
        let status = filter.status.map(|s| s.to_string());
        let report_type = filter.report_type.as_ref().map(ReportType::as_str);
        let limit = filter.limit.map(sql_limit);

        let mut values: Vec<&dyn ToSql> = vec![&company_id];
        if let Some(status) = &status {
            values.push(status);
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }
        if let Some(vessel_id) = &filter.vessel_id {
            values.push(vessel_id);
            sql.push_str(&format!(" AND vessel_id = ?{}", values.len()));
        }
        if let Some(report_type) = &report_type {
            values.push(report_type);
            sql.push_str(&format!(" AND report_type = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY COALESCE(submitted_at, updated_at) DESC, id DESC");
        if let Some(limit) = &limit {
            values.push(limit);
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let reports = stmt
            .query_map(values.as_slice(), Self::row_to_report)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    /// Explain why a guarded write matched no row.
    fn rejected_write(&self, report_id: i64, action: &'static str) -> Result<Error> {
        let status: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM reports WHERE id = ?1",
                [report_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(match status {
            None => Error::not_found("report", report_id),
            Some(status) => Error::InvalidStateTransition {
                report_id,
                status,
                action,
            },
        })
    }

    fn row_to_report(row: &rusqlite::Row) -> rusqlite::Result<Report> {
        decode_row(row, "report", Self::decode_report)
    }

    fn decode_report(row: &rusqlite::Row) -> rusqlite::Result<Report> {
        let report_type: String = row.get(4)?;
        let status: String = row.get(6)?;
        let submitted_at: Option<String> = row.get(9)?;

        let submitted_at = submitted_at
            .map(|text| {
                DateTime::parse_from_rfc3339(&text)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))
            })
            .transpose()?;

        Ok(Report {
            id: row.get(0)?,
            vessel_id: row.get(1)?,
            company_id: row.get(2)?,
            vessel_name: row.get(3)?,
            report_type: ReportType::parse(&report_type)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
            data: json_column(row, 5)?,
            status: ReportStatus::from_db(&status).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    Type::Text,
                    format!("unknown report status '{status}'").into(),
                )
            })?,
            created_at: timestamp_column(row, 7)?,
            updated_at: timestamp_column(row, 8)?,
            submitted_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewVessel;

    struct Fixture {
        storage: Storage,
        company: i64,
        vessel: Vessel,
        morning: ReportType,
    }

    fn setup() -> Fixture {
        let storage = Storage::open_in_memory().unwrap();
        let company = storage.insert_company("Acme", "h").unwrap().id;
        let vessel = storage
            .insert_vessel(
                company,
                &NewVessel {
                    name: "V1".to_string(),
                    imo_number: "9000001".to_string(),
                    mmsi: "200000001".to_string(),
                },
            )
            .unwrap();
        Fixture {
            storage,
            company,
            vessel,
            morning: ReportType::parse("morning report").unwrap(),
        }
    }

    #[test]
    fn test_insert_draft_and_get() {
        let f = setup();
        let data = ReportData::blank(&["A", "B"]);
        let draft = f.storage.insert_draft(&f.vessel, &f.morning, &data).unwrap();

        let fetched = f.storage.get_report(f.company, draft.id).unwrap().unwrap();
        assert_eq!(fetched.status, ReportStatus::Draft);
        assert_eq!(fetched.data, data);
        assert_eq!(fetched.vessel_name, "V1");
        assert!(fetched.submitted_at.is_none());
    }

    #[test]
    fn test_update_draft_overwrites_snapshot() {
        let f = setup();
        let draft = f
            .storage
            .insert_draft(&f.vessel, &f.morning, &ReportData::blank(&["A", "B"]))
            .unwrap();

        let mut data = draft.data.clone();
        data.set("A", "x").unwrap();
        f.storage.update_draft_data(draft.id, &data).unwrap();

        let fetched = f.storage.get_report(f.company, draft.id).unwrap().unwrap();
        assert_eq!(fetched.data.get("A"), Some("x"));
        assert_eq!(fetched.data.get("B"), Some(""));
    }

    #[test]
    fn test_submitted_report_rejects_writes() {
        let f = setup();
        let draft = f
            .storage
            .insert_draft(&f.vessel, &f.morning, &ReportData::blank(&["A"]))
            .unwrap();
        f.storage.mark_submitted(draft.id).unwrap();

        let err = f
            .storage
            .update_draft_data(draft.id, &ReportData::blank(&["A"]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));

        let err = f.storage.mark_submitted(draft.id).unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { ref status, .. } if status == "submitted"));
    }

    #[test]
    fn test_missing_report_is_not_found() {
        let f = setup();
        let err = f
            .storage
            .update_draft_data(404, &ReportData::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "report", id: 404 }));
    }

    #[test]
    fn test_undecodable_row_is_a_corrupt_record() {
        let f = setup();
        let draft = f
            .storage
            .insert_draft(&f.vessel, &f.morning, &ReportData::blank(&["A"]))
            .unwrap();
        f.storage
            .conn
            .execute("UPDATE reports SET data = 'not json' WHERE id = ?1", [draft.id])
            .unwrap();

        let err = f.storage.get_report(f.company, draft.id).unwrap_err();
        match err {
            Error::CorruptRecord { entity, id, message } => {
                assert_eq!(entity, "report");
                assert_eq!(id, draft.id);
                assert!(message.starts_with("column 5"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = f
            .storage
            .list_reports(f.company, &ReportFilter::drafts())
            .unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { entity: "report", .. }));
    }

    #[test]
    fn test_mark_submitted_records_time() {
        let f = setup();
        let draft = f
            .storage
            .insert_draft(&f.vessel, &f.morning, &ReportData::blank(&["A"]))
            .unwrap();
        let at = f.storage.mark_submitted(draft.id).unwrap();

        let fetched = f.storage.get_report(f.company, draft.id).unwrap().unwrap();
        assert_eq!(fetched.status, ReportStatus::Submitted);
        assert_eq!(
            fetched.submitted_at.map(|t| t.timestamp_millis()),
            Some(at.timestamp_millis())
        );
    }

    #[test]
    fn test_reports_survive_vessel_deletion() {
        let f = setup();
        let draft = f
            .storage
            .insert_draft(&f.vessel, &f.morning, &ReportData::blank(&["A"]))
            .unwrap();
        assert!(f.storage.delete_vessel(f.company, f.vessel.id).unwrap());

        let fetched = f.storage.get_report(f.company, draft.id).unwrap().unwrap();
        assert_eq!(fetched.vessel_name, "V1");
    }

    #[test]
    fn test_list_reports_filters() {
        let f = setup();
        let noon = ReportType::parse("noon report").unwrap();
        let a = f
            .storage
            .insert_draft(&f.vessel, &f.morning, &ReportData::blank(&["A"]))
            .unwrap();
        let b = f
            .storage
            .insert_draft(&f.vessel, &noon, &ReportData::blank(&["A"]))
            .unwrap();
        f.storage
            .insert_draft(&f.vessel, &f.morning, &ReportData::blank(&["A"]))
            .unwrap();
        f.storage.mark_submitted(a.id).unwrap();
        f.storage.mark_submitted(b.id).unwrap();

        let submitted = f
            .storage
            .list_reports(f.company, &ReportFilter::submitted())
            .unwrap();
        assert_eq!(submitted.len(), 2);

        let morning_only = ReportFilter {
            report_type: Some(f.morning.clone()),
            ..ReportFilter::submitted()
        };
        let listed = f.storage.list_reports(f.company, &morning_only).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, a.id);

        let drafts = f.storage.list_reports(f.company, &ReportFilter::drafts()).unwrap();
        assert_eq!(drafts.len(), 1);

        let limited = ReportFilter {
            limit: Some(1),
            ..ReportFilter::default()
        };
        assert_eq!(f.storage.list_reports(f.company, &limited).unwrap().len(), 1);

        let other_vessel = ReportFilter {
            vessel_id: Some(f.vessel.id + 100),
            ..ReportFilter::default()
        };
        assert!(f.storage.list_reports(f.company, &other_vessel).unwrap().is_empty());
    }

    #[test]
    fn test_list_reports_scoped_by_company() {
        let f = setup();
        f.storage
            .insert_draft(&f.vessel, &f.morning, &ReportData::blank(&["A"]))
            .unwrap();
        let other = f.storage.insert_company("Other", "h").unwrap().id;

        assert!(f
            .storage
            .list_reports(other, &ReportFilter::default())
            .unwrap()
            .is_empty());
    }
}
