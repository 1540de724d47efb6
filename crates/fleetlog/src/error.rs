//! Error types for fleetlog.
//!
//! This module defines every error surfaced by the account store, fleet and
//! template registries and the report engine, together with the storage and
//! configuration failures underneath them.

use std::path::PathBuf;
use thiserror::Error;

use crate::confirm::ConfirmationToken;

/// The main error type for fleetlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Domain Errors ===
    /// Missing or malformed input.
    #[error("invalid input: {message}")]
    Validation {
        /// Description of what was wrong with the input.
        message: String,
    },

    /// The password does not meet the complexity policy.
    #[error("weak password: {reason}")]
    WeakPassword {
        /// Which rule the password failed.
        reason: String,
    },

    /// A company with the same name is already registered.
    #[error("company name '{name}' is already registered")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// Unknown company name or wrong password.
    #[error("company name or password is incorrect")]
    InvalidCredentials,

    /// No active template exists for the report type.
    #[error("no template defined for report type '{report_type}'")]
    TemplateNotFound {
        /// The report type that was looked up.
        report_type: String,
    },

    /// The requested record does not exist for this company.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Its identifier.
        id: i64,
    },

    /// The report is not in a state that allows the requested change.
    #[error("report {report_id} is {status}; {action} is not allowed")]
    InvalidStateTransition {
        /// The report that was targeted.
        report_id: i64,
        /// Its current status.
        status: String,
        /// What the caller tried to do.
        action: &'static str,
    },

    /// A destructive action must be confirmed by repeating it with the token.
    #[error("{action} requires confirmation (token {token})")]
    ConfirmationRequired {
        /// Description of the pending action.
        action: String,
        /// Token to pass back on the confirming call.
        token: ConfirmationToken,
    },

    /// Sending the notification failed. Never undoes a submission.
    #[error("failed to notify {recipient}: {message}")]
    NotificationFailure {
        /// Intended recipient.
        recipient: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[source] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored row could not be decoded.
    #[error("corrupt {entity} record {id}: {message}")]
    CorruptRecord {
        /// Kind of record.
        entity: &'static str,
        /// Its identifier.
        id: i64,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Crypto Errors ===
    /// Hashing or parsing a password hash failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

/// A specialized Result type for fleetlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(idx, ty, source) => {
                match source.downcast::<Self>() {
                    Ok(inner) if matches!(*inner, Self::CorruptRecord { .. }) => *inner,
                    Ok(inner) => Self::DatabaseQuery(
                        rusqlite::Error::FromSqlConversionFailure(idx, ty, inner),
                    ),
                    Err(source) => Self::DatabaseQuery(
                        rusqlite::Error::FromSqlConversionFailure(idx, ty, source),
                    ),
                }
            }
            other => Self::DatabaseQuery(other),
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(err.to_string())
    }
}

impl Error {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new weak password error.
    #[must_use]
    pub fn weak_password(reason: impl Into<String>) -> Self {
        Self::WeakPassword {
            reason: reason.into(),
        }
    }

    /// Create a not-found error for the given record kind.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Create a notification failure for the given recipient.
    #[must_use]
    pub fn notification(recipient: impl Into<String>, message: impl ToString) -> Self {
        Self::NotificationFailure {
            recipient: recipient.into(),
            message: message.to_string(),
        }
    }

    /// Check if this error asks the caller to confirm and retry.
    #[must_use]
    pub fn is_confirmation_required(&self) -> bool {
        matches!(self, Self::ConfirmationRequired { .. })
    }

    /// The confirmation token carried by a `ConfirmationRequired` error.
    #[must_use]
    pub fn confirmation_token(&self) -> Option<&ConfirmationToken> {
        match self {
            Self::ConfirmationRequired { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Check if this error was caused by the caller's input rather than the
    /// environment.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::WeakPassword { .. }
                | Self::DuplicateName { .. }
                | Self::InvalidCredentials
                | Self::TemplateNotFound { .. }
                | Self::NotFound { .. }
                | Self::InvalidStateTransition { .. }
                | Self::ConfirmationRequired { .. }
        )
    }
}
