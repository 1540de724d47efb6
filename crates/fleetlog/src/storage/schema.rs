//! `SQLite` schema definitions for fleetlog.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the companies table.
pub const CREATE_COMPANIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the vessels table.
pub const CREATE_VESSELS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS vessels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL REFERENCES companies(id),
    name TEXT NOT NULL,
    imo_number TEXT NOT NULL,
    mmsi TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the report templates table.
///
/// Uniqueness of (`company_id`, `report_type`) is kept by the replace
/// confirmation flow, not by a constraint.
pub const CREATE_TEMPLATES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS report_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL REFERENCES companies(id),
    report_type TEXT NOT NULL,
    fields TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the reports table.
///
/// `vessel_id` is deliberately not a foreign key: reports outlive their vessel.
pub const CREATE_REPORTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vessel_id INTEGER NOT NULL,
    company_id INTEGER NOT NULL REFERENCES companies(id),
    vessel_name TEXT NOT NULL,
    report_type TEXT NOT NULL,
    data TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('draft', 'submitted')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    submitted_at TEXT
)
";

/// SQL statement to create an index for per-company vessel listings.
pub const CREATE_VESSEL_COMPANY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_vessels_company ON vessels(company_id)
";

/// SQL statement to create an index for template lookup by report type.
pub const CREATE_TEMPLATE_LOOKUP_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_templates_company_type
    ON report_templates(company_id, report_type)
";

/// SQL statement to create an index for report listings.
pub const CREATE_REPORT_COMPANY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_reports_company_status
    ON reports(company_id, status)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_COMPANIES_TABLE,
    CREATE_VESSELS_TABLE,
    CREATE_TEMPLATES_TABLE,
    CREATE_REPORTS_TABLE,
    CREATE_VESSEL_COMPANY_INDEX,
    CREATE_TEMPLATE_LOOKUP_INDEX,
    CREATE_REPORT_COMPANY_INDEX,
    CREATE_METADATA_TABLE,
];
