//! The entry points a presentation layer calls.
//!
//! [`Service`] owns the injected store and notifier. Its operations are
//! spread over the domain modules:
//!
//! - [`accounts`](crate::accounts): register, login
//! - [`fleet`](crate::fleet): add, list and delete vessels
//! - [`templates`](crate::templates): define, list, delete and resolve templates
//! - [`reports`](crate::reports): drafts, submission and listings
//!
//! Every call runs to completion synchronously; there is no shared state
//! between calls beyond the database.

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::notify::{self, Notifier};
use crate::storage::Storage;

/// Fleet record keeping for many companies over one store.
#[derive(Debug)]
pub struct Service {
    pub(crate) storage: Storage,
    pub(crate) notifier: Box<dyn Notifier>,
}

impl Service {
    /// Wrap an open store and a notifier.
    #[must_use]
    pub fn new(storage: Storage, notifier: Box<dyn Notifier>) -> Self {
        Self { storage, notifier }
    }

    /// Open the configured database and build the configured notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the mail settings
    /// are unusable.
    pub fn open(config: &Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        let notifier = notify::from_config(&config.notify)?;
        info!("Using {} notifier", notifier.name());
        Ok(Self::new(storage, notifier))
    }

    /// The underlying store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The notifier used on submission.
    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Shut down, closing the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be closed cleanly.
    pub fn close(self) -> Result<()> {
        self.storage.close()
    }
}
