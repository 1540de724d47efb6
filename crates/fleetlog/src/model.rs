//! Core record types for fleetlog.
//!
//! This module defines the companies, vessels, report templates and reports
//! kept by the store, plus the ordered field snapshot carried by each report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The six report categories every fleet files.
pub const STANDARD_REPORT_TYPES: [&str; 6] = [
    "morning report",
    "noon report",
    "evening report",
    "departure report",
    "arrival report",
    "voyage report",
];

/// The kind of report a template or report belongs to.
///
/// Any non-empty name is accepted; the catalog is open-ended per company.
/// Names are compared case-insensitively: they are stored lowercased with
/// whitespace runs collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportType(String);

impl ReportType {
    /// Parse a report type into its canonical lowercase form.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is empty.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(Error::validation("report type is required"));
        }
        Ok(Self(name.to_lowercase()))
    }

    /// Whether this is one of the [`STANDARD_REPORT_TYPES`].
    #[must_use]
    pub fn is_standard(&self) -> bool {
        STANDARD_REPORT_TYPES.contains(&self.0.as_str())
    }

    /// The report type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Being filled in; every edit overwrites the stored snapshot.
    Draft,
    /// Sent for review. Terminal.
    Submitted,
}

impl ReportStatus {
    /// Parse the stored representation.
    #[must_use]
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            _ => None,
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Submitted => write!(f, "submitted"),
        }
    }
}

/// One field of a report snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    /// Field name, copied from the template.
    pub field: String,
    /// The value entered so far.
    pub value: String,
}

/// Ordered mapping of field name to value.
///
/// Serialized as a JSON array of `{"field": .., "value": ..}` entries so the
/// template's field order survives storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportData(Vec<FieldValue>);

impl ReportData {
    /// A snapshot with an empty value for every field.
    #[must_use]
    pub fn blank<S: AsRef<str>>(fields: &[S]) -> Self {
        Self(
            fields
                .iter()
                .map(|field| FieldValue {
                    field: field.as_ref().to_string(),
                    value: String::new(),
                })
                .collect(),
        )
    }

    /// Look up a field's value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.value.as_str())
    }

    /// Overwrite a field's value.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the snapshot has no such field.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> Result<()> {
        let entry = self
            .0
            .iter_mut()
            .find(|entry| entry.field == field)
            .ok_or_else(|| Error::validation(format!("report has no field '{field}'")))?;
        entry.value = value.into();
        Ok(())
    }

    /// Field names in template order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|entry| entry.field.as_str())
    }

    /// All entries in template order.
    #[must_use]
    pub fn entries(&self) -> &[FieldValue] {
        &self.0
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid encoded snapshot.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl fmt::Display for ReportData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.0 {
            writeln!(f, "{}: {}", entry.field, entry.value)?;
        }
        Ok(())
    }
}

/// A registered shipping company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Row id.
    pub id: i64,
    /// Unique company name.
    pub name: String,
    /// When the company registered.
    pub created_at: DateTime<Utc>,
}

/// The authenticated company on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Company row id.
    pub company_id: i64,
    /// Company name, for display.
    pub company_name: String,
}

/// A vessel in a company's fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vessel {
    /// Row id.
    pub id: i64,
    /// Owning company.
    pub company_id: i64,
    /// Vessel name.
    pub name: String,
    /// IMO number.
    pub imo_number: String,
    /// Maritime Mobile Service Identity.
    pub mmsi: String,
    /// When the vessel was registered.
    pub created_at: DateTime<Utc>,
}

/// Fields required to register a vessel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewVessel {
    /// Vessel name.
    pub name: String,
    /// IMO number.
    pub imo_number: String,
    /// Maritime Mobile Service Identity.
    pub mmsi: String,
}

/// The active field list for one report type of one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTemplate {
    /// Row id.
    pub id: i64,
    /// Owning company.
    pub company_id: i64,
    /// Report type the template applies to.
    pub report_type: ReportType,
    /// Field names, in form order.
    pub fields: Vec<String>,
    /// When the field list was last written.
    pub updated_at: DateTime<Utc>,
}

/// A voyage report, draft or submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Row id; identifies an open draft across edits.
    pub id: i64,
    /// Vessel the report is about. May no longer exist.
    pub vessel_id: i64,
    /// Company that filed the report.
    pub company_id: i64,
    /// Vessel name at the time the report was opened.
    pub vessel_name: String,
    /// Report type.
    pub report_type: ReportType,
    /// Field snapshot.
    pub data: ReportData,
    /// Lifecycle state.
    pub status: ReportStatus,
    /// When the draft was opened.
    pub created_at: DateTime<Utc>,
    /// When the snapshot was last written.
    pub updated_at: DateTime<Utc>,
    /// When the report was submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Whether the report can still be edited.
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.status == ReportStatus::Draft
    }
}
