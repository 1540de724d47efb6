//! Vessel registry operations.

use tracing::info;

use crate::confirm::{is_confirmed, ConfirmationToken};
use crate::error::{Error, Result};
use crate::model::{NewVessel, Session, Vessel};
use crate::service::Service;

impl NewVessel {
    /// Trim every field and check none is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first empty field.
    pub fn normalized(self) -> Result<Self> {
        let vessel = Self {
            name: self.name.trim().to_string(),
            imo_number: self.imo_number.trim().to_string(),
            mmsi: self.mmsi.trim().to_string(),
        };
        for (label, value) in [
            ("vessel name", &vessel.name),
            ("IMO number", &vessel.imo_number),
            ("MMSI", &vessel.mmsi),
        ] {
            if value.is_empty() {
                return Err(Error::validation(format!("{label} is required")));
            }
        }
        Ok(vessel)
    }
}

fn delete_token(vessel: &Vessel) -> ConfirmationToken {
    ConfirmationToken::derive(
        "delete vessel",
        &[
            &vessel.company_id.to_string(),
            &vessel.id.to_string(),
            &vessel.name,
        ],
    )
}

impl Service {
    /// Register a vessel for the session's company.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if name, IMO number or MMSI is empty.
    pub fn add_vessel(&self, session: &Session, vessel: NewVessel) -> Result<Vessel> {
        let vessel = vessel.normalized()?;
        let vessel = self.storage.insert_vessel(session.company_id, &vessel)?;
        info!(
            "Company {} added vessel {} (id {})",
            session.company_name, vessel.name, vessel.id
        );
        Ok(vessel)
    }

    /// The session company's vessels.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_vessels(&self, session: &Session) -> Result<Vec<Vessel>> {
        self.storage.list_vessels(session.company_id)
    }

    /// Delete a vessel in two steps.
    ///
    /// Without the right token the call fails with
    /// [`Error::ConfirmationRequired`] and changes nothing. Repeating it with
    /// that token deletes the vessel. Reports about the vessel are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the company has no such vessel, or
    /// [`Error::ConfirmationRequired`] as described above.
    pub fn delete_vessel(
        &self,
        session: &Session,
        vessel_id: i64,
        confirmation: Option<&ConfirmationToken>,
    ) -> Result<Vessel> {
        let vessel = self
            .storage
            .get_vessel(session.company_id, vessel_id)?
            .ok_or_else(|| Error::not_found("vessel", vessel_id))?;

        let token = delete_token(&vessel);
        if !is_confirmed(confirmation, &token) {
            return Err(Error::ConfirmationRequired {
                action: format!("delete vessel {} ({})", vessel.name, vessel.id),
                token,
            });
        }

        if !self.storage.delete_vessel(session.company_id, vessel_id)? {
            return Err(Error::not_found("vessel", vessel_id));
        }
        info!(
            "Company {} deleted vessel {} (id {})",
            session.company_name, vessel.name, vessel.id
        );
        Ok(vessel)
    }
}
