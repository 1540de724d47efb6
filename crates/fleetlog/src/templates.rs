//! Report templates: the ordered field list a company uses for each report
//! type.
//!
//! A company has at most one active template per report type. Redefining a
//! type that already has one, and deleting one, both need a confirmation
//! token (see [`crate::confirm`]).

use std::collections::HashSet;

use tracing::{debug, info};

use crate::confirm::{is_confirmed, ConfirmationToken};
use crate::error::{Error, Result};
use crate::model::{ReportTemplate, ReportType, Session};
use crate::service::Service;

/// Field list offered when a template is defined without one.
pub const DEFAULT_TEMPLATE_FIELDS: [&str; 11] = [
    "voyage number",
    "report date",
    "position",
    "average speed",
    "24h fuel consumption",
    "fuel on board",
    "24h distance",
    "remaining distance",
    "ETA",
    "departure port",
    "destination port",
];

/// Parse a comma-separated field list.
///
/// Entries are trimmed and empty ones dropped.
///
/// # Errors
///
/// Returns [`Error::Validation`] if no field remains or a name repeats.
pub fn parse_field_list(text: &str) -> Result<Vec<String>> {
    let fields: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(ToString::to_string)
        .collect();
    validate_fields(&fields)?;
    Ok(fields)
}

/// The default field list, owned.
#[must_use]
pub fn default_fields() -> Vec<String> {
    DEFAULT_TEMPLATE_FIELDS.iter().map(ToString::to_string).collect()
}

/// Trim every name, then check the list is non-empty and free of repeats.
fn normalize_fields(fields: &[String]) -> Result<Vec<String>> {
    let fields: Vec<String> = fields.iter().map(|field| field.trim().to_string()).collect();
    validate_fields(&fields)?;
    Ok(fields)
}

fn validate_fields(fields: &[String]) -> Result<()> {
    if fields.is_empty() {
        return Err(Error::validation("a template needs at least one field"));
    }
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if field.trim().is_empty() {
            return Err(Error::validation("field names cannot be empty"));
        }
        if !seen.insert(field.as_str()) {
            return Err(Error::validation(format!("field '{field}' is listed twice")));
        }
    }
    Ok(())
}

fn replace_token(current: &ReportTemplate, fields: &[String]) -> Result<ConfirmationToken> {
    let old = serde_json::to_string(&current.fields)?;
    let new = serde_json::to_string(fields)?;
    Ok(ConfirmationToken::derive(
        "replace template",
        &[
            &current.company_id.to_string(),
            &current.id.to_string(),
            current.report_type.as_str(),
            &old,
            &new,
        ],
    ))
}

fn delete_token(template: &ReportTemplate) -> Result<ConfirmationToken> {
    let fields = serde_json::to_string(&template.fields)?;
    Ok(ConfirmationToken::derive(
        "delete template",
        &[
            &template.company_id.to_string(),
            &template.id.to_string(),
            template.report_type.as_str(),
            &fields,
        ],
    ))
}

impl Service {
    /// Define the field list for a report type.
    ///
    /// The first definition for a type is stored straight away. Replacing an
    /// existing list is two-phase: without a matching token nothing changes
    /// and [`Error::ConfirmationRequired`] carries the token to repeat the
    /// call with. Redefining a type with the list it already has changes
    /// nothing and needs no token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty or repeating field list,
    /// [`Error::ConfirmationRequired`] as described above, or an error if the
    /// database operation fails.
    pub fn define_template(
        &self,
        session: &Session,
        report_type: &ReportType,
        fields: &[String],
        confirmation: Option<&ConfirmationToken>,
    ) -> Result<ReportTemplate> {
        let fields = normalize_fields(fields)?;

        let Some(current) = self.storage.find_template(session.company_id, report_type)? else {
            let template =
                self.storage
                    .insert_template(session.company_id, report_type, &fields)?;
            info!(
                "Company {} defined template '{}' with {} fields",
                session.company_name,
                report_type,
                fields.len()
            );
            return Ok(template);
        };

        if current.fields == fields {
            debug!("Template '{}' unchanged", report_type);
            return Ok(current);
        }

        let token = replace_token(&current, &fields)?;
        if !is_confirmed(confirmation, &token) {
            return Err(Error::ConfirmationRequired {
                action: format!(
                    "replace template '{}' fields [{}] with [{}]",
                    report_type,
                    current.fields.join(", "),
                    fields.join(", ")
                ),
                token,
            });
        }

        if !self.storage.replace_template_fields(current.id, &fields)? {
            return Err(Error::not_found("template", current.id));
        }
        info!(
            "Company {} replaced template '{}'",
            session.company_name, report_type
        );
        self.storage
            .get_template(session.company_id, current.id)?
            .ok_or_else(|| Error::not_found("template", current.id))
    }

    /// The session company's templates, by report type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_templates(&self, session: &Session) -> Result<Vec<ReportTemplate>> {
        self.storage.list_templates(session.company_id)
    }

    /// Delete a template in two steps, like [`Service::delete_vessel`].
    /// Reports already opened against it keep their fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the company has no such template, or
    /// [`Error::ConfirmationRequired`] when the token is missing or stale.
    pub fn delete_template(
        &self,
        session: &Session,
        template_id: i64,
        confirmation: Option<&ConfirmationToken>,
    ) -> Result<ReportTemplate> {
        let template = self
            .storage
            .get_template(session.company_id, template_id)?
            .ok_or_else(|| Error::not_found("template", template_id))?;

        let token = delete_token(&template)?;
        if !is_confirmed(confirmation, &token) {
            return Err(Error::ConfirmationRequired {
                action: format!("delete template '{}' ({})", template.report_type, template.id),
                token,
            });
        }

        if !self.storage.delete_template(session.company_id, template_id)? {
            return Err(Error::not_found("template", template_id));
        }
        info!(
            "Company {} deleted template '{}'",
            session.company_name, template.report_type
        );
        Ok(template)
    }

    /// The fields of the active template for a report type, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateNotFound`] if the company has none.
    pub fn resolve_fields(
        &self,
        session: &Session,
        report_type: &ReportType,
    ) -> Result<Vec<String>> {
        self.storage
            .find_template(session.company_id, report_type)?
            .map(|template| template.fields)
            .ok_or_else(|| Error::TemplateNotFound {
                report_type: report_type.to_string(),
            })
    }
}
