//! `fleetlog` - Vessel registry and voyage report keeping for shipping companies
//!
//! Companies register an account, keep a list of their vessels, define the
//! fields each kind of report carries, and fill in periodic voyage reports
//! that move from draft to submitted. Submitting a report notifies a
//! reviewer by mail.
//!
//! Everything goes through [`Service`], which owns an open [`Storage`] and a
//! [`Notifier`](notify::Notifier).

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod accounts;
pub mod cli;
pub mod config;
pub mod confirm;
pub mod error;
pub mod fleet;
pub mod logging;
pub mod model;
pub mod notify;
pub mod reports;
pub mod service;
pub mod storage;
pub mod templates;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use confirm::ConfirmationToken;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{
    Company, NewVessel, Report, ReportData, ReportStatus, ReportTemplate, ReportType, Session,
    Vessel,
};
pub use reports::Submission;
pub use service::Service;
pub use storage::{ReportFilter, Storage, StorageStats};
