//! The report lifecycle: open a draft from a template, edit it, submit it.
//!
//! A report starts as a draft holding an empty value for every field of the
//! template active when it was opened. Each save overwrites the whole
//! snapshot. Submission is a one-way switch after which the store refuses
//! any further write, and triggers a notification to the reviewer.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Report, ReportData, ReportStatus, ReportType, Session};
use crate::service::Service;
use crate::storage::ReportFilter;

/// A submitted report plus the outcome of notifying the reviewer.
#[derive(Debug)]
pub struct Submission {
    /// The report as stored after submission.
    pub report: Report,
    /// Set if the notification could not be delivered. The report stays
    /// submitted either way.
    pub notification: Option<Error>,
}

impl Submission {
    /// Whether the notifier accepted the message.
    #[must_use]
    pub fn notified(&self) -> bool {
        self.notification.is_none()
    }

    /// The delivery failure, if any.
    #[must_use]
    pub fn warning(&self) -> Option<&Error> {
        self.notification.as_ref()
    }
}

fn apply_edits(data: &mut ReportData, edits: &[(&str, &str)]) -> Result<()> {
    for (field, value) in edits {
        data.set(field, *value)?;
    }
    Ok(())
}

fn compose_subject(session: &Session, report: &Report) -> String {
    format!(
        "[{}] {} {} #{}",
        session.company_name, report.vessel_name, report.report_type, report.id
    )
}

fn compose_body(session: &Session, report: &Report) -> String {
    let submitted = report
        .submitted_at
        .unwrap_or(report.updated_at)
        .format("%Y-%m-%d %H:%M UTC");
    format!(
        "Company: {}\nVessel: {}\nReport: {}\nSubmitted: {}\n\n{}",
        session.company_name, report.vessel_name, report.report_type, submitted, report.data
    )
}

impl Service {
    /// Open a new draft or update an existing one.
    ///
    /// Without `draft_id` a draft is created for the vessel with a blank
    /// value for every field of the active template, then `edits` are
    /// applied. With `draft_id` the edits are applied to that draft's
    /// snapshot and the whole snapshot is stored again.
    ///
    /// # Errors
    ///
    /// - [`Error::TemplateNotFound`] when opening a draft for a type with no
    ///   template
    /// - [`Error::NotFound`] for a vessel or draft outside the company
    /// - [`Error::Validation`] for an edit naming an unknown field, or a
    ///   draft about another vessel or report type
    /// - [`Error::InvalidStateTransition`] if the report is already submitted
    pub fn create_or_update_draft(
        &self,
        session: &Session,
        vessel_id: i64,
        report_type: &ReportType,
        draft_id: Option<i64>,
        edits: &[(&str, &str)],
    ) -> Result<Report> {
        let Some(draft_id) = draft_id else {
            let vessel = self
                .storage
                .get_vessel(session.company_id, vessel_id)?
                .ok_or_else(|| Error::not_found("vessel", vessel_id))?;
            let fields = self.resolve_fields(session, report_type)?;

            let mut data = ReportData::blank(&fields);
            apply_edits(&mut data, edits)?;
            return self.storage.insert_draft(&vessel, report_type, &data);
        };

        let mut report = self
            .storage
            .get_report(session.company_id, draft_id)?
            .ok_or_else(|| Error::not_found("report", draft_id))?;
        if report.vessel_id != vessel_id {
            return Err(Error::validation(format!(
                "report {} is about vessel {}, not {}",
                report.id, report.vessel_id, vessel_id
            )));
        }
        if &report.report_type != report_type {
            return Err(Error::validation(format!(
                "report {} is a {}, not a {}",
                report.id, report.report_type, report_type
            )));
        }

        self.save_report(&mut report, edits)?;
        Ok(report)
    }

    /// Open a blank draft for a vessel.
    ///
    /// # Errors
    ///
    /// See [`Service::create_or_update_draft`].
    pub fn open_draft(
        &self,
        session: &Session,
        vessel_id: i64,
        report_type: &ReportType,
    ) -> Result<Report> {
        self.create_or_update_draft(session, vessel_id, report_type, None, &[])
    }

    /// Apply edits to a draft identified only by id.
    ///
    /// # Errors
    ///
    /// See [`Service::create_or_update_draft`].
    pub fn save_draft(
        &self,
        session: &Session,
        report_id: i64,
        edits: &[(&str, &str)],
    ) -> Result<Report> {
        let mut report = self.get_report(session, report_id)?;
        self.save_report(&mut report, edits)?;
        Ok(report)
    }

    fn save_report(&self, report: &mut Report, edits: &[(&str, &str)]) -> Result<()> {
        if !report.is_draft() {
            return Err(Error::InvalidStateTransition {
                report_id: report.id,
                status: report.status.to_string(),
                action: "editing",
            });
        }
        apply_edits(&mut report.data, edits)?;
        report.updated_at = self.storage.update_draft_data(report.id, &report.data)?;
        Ok(())
    }

    /// Submit a draft and notify `recipient`.
    ///
    /// The report is marked submitted before the notification goes out. A
    /// delivery failure is logged and returned in
    /// [`Submission::notification`]; it does not undo the submission.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty recipient,
    /// [`Error::NotFound`] for a report outside the company, and
    /// [`Error::InvalidStateTransition`] if it was already submitted.
    pub fn submit_report(
        &self,
        session: &Session,
        report_id: i64,
        recipient: &str,
    ) -> Result<Submission> {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(Error::validation("a recipient is required"));
        }

        let mut report = self.get_report(session, report_id)?;
        let submitted_at = self.storage.mark_submitted(report.id)?;
        report.status = ReportStatus::Submitted;
        report.submitted_at = Some(submitted_at);
        report.updated_at = submitted_at;

        let subject = compose_subject(session, &report);
        let body = compose_body(session, &report);
        let notification = match self.notifier.send(&subject, &body, recipient) {
            Ok(()) => {
                info!(
                    "Report {} sent to {} via {}",
                    report.id,
                    recipient,
                    self.notifier.name()
                );
                None
            }
            Err(e) => {
                let e = match e {
                    e @ Error::NotificationFailure { .. } => e,
                    other => Error::notification(recipient, other),
                };
                warn!("Report {} submitted but not delivered: {}", report.id, e);
                Some(e)
            }
        };

        Ok(Submission {
            report,
            notification,
        })
    }

    /// Submitted reports of the session company, newest first. The status in
    /// `filter` is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_submitted_reports(
        &self,
        session: &Session,
        filter: ReportFilter,
    ) -> Result<Vec<Report>> {
        let filter = ReportFilter {
            status: Some(ReportStatus::Submitted),
            ..filter
        };
        self.storage.list_reports(session.company_id, &filter)
    }

    /// Drafts of the session company, most recently saved first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_drafts(&self, session: &Session) -> Result<Vec<Report>> {
        self.storage
            .list_reports(session.company_id, &ReportFilter::drafts())
    }

    /// One of the session company's reports.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the company has no such report.
    pub fn get_report(&self, session: &Session, report_id: i64) -> Result<Report> {
        debug!("Loading report {}", report_id);
        self.storage
            .get_report(session.company_id, report_id)?
            .ok_or_else(|| Error::not_found("report", report_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Vessel;
    use crate::testing::{self, fields, RecordingNotifier};

    struct Fixture {
        service: Service,
        session: Session,
        vessel: Vessel,
        morning: ReportType,
    }

    fn fixture_with(notifier: RecordingNotifier) -> Fixture {
        let (service, _) = testing::service_with(notifier);
        let session = testing::session(&service, "Acme");
        let vessel = testing::vessel(&service, &session, "V1");
        let morning = ReportType::parse("morning report").unwrap();
        service
            .define_template(&session, &morning, &fields(&["A", "B"]), None)
            .unwrap();
        Fixture {
            service,
            session,
            vessel,
            morning,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingNotifier::default())
    }

    #[test]
    fn test_open_draft_is_blank() {
        let f = fixture();
        let report = f
            .service
            .open_draft(&f.session, f.vessel.id, &f.morning)
            .unwrap();

        assert_eq!(report.status, ReportStatus::Draft);
        assert_eq!(report.vessel_name, "V1");
        assert_eq!(report.data.fields().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(report.data.get("A"), Some(""));
        assert!(report.submitted_at.is_none());
    }

    #[test]
    fn test_open_draft_needs_template() {
        let f = fixture();
        let noon = ReportType::parse("noon report").unwrap();
        let err = f
            .service
            .open_draft(&f.session, f.vessel.id, &noon)
            .unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound { .. }));
        assert!(f.service.list_drafts(&f.session).unwrap().is_empty());
    }

    #[test]
    fn test_create_with_edits_then_update() {
        let f = fixture();
        let created = f
            .service
            .create_or_update_draft(&f.session, f.vessel.id, &f.morning, None, &[("A", "x")])
            .unwrap();
        assert_eq!(created.data.get("A"), Some("x"));

        let updated = f
            .service
            .create_or_update_draft(
                &f.session,
                f.vessel.id,
                &f.morning,
                Some(created.id),
                &[("B", "y")],
            )
            .unwrap();
        assert_eq!(updated.id, created.id);

        let stored = f.service.get_report(&f.session, created.id).unwrap();
        assert_eq!(stored.data.get("A"), Some("x"));
        assert_eq!(stored.data.get("B"), Some("y"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let f = fixture();
        let err = f
            .service
            .create_or_update_draft(&f.session, f.vessel.id, &f.morning, None, &[("C", "1")])
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(f.service.list_drafts(&f.session).unwrap().is_empty());

        let draft = f
            .service
            .open_draft(&f.session, f.vessel.id, &f.morning)
            .unwrap();
        let err = f
            .service
            .save_draft(&f.session, draft.id, &[("A", "1"), ("C", "2")])
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        let stored = f.service.get_report(&f.session, draft.id).unwrap();
        assert_eq!(stored.data.get("A"), Some(""));
    }

    #[test]
    fn test_update_checks_vessel_and_type() {
        let f = fixture();
        let other = testing::vessel(&f.service, &f.session, "V2");
        let draft = f
            .service
            .open_draft(&f.session, f.vessel.id, &f.morning)
            .unwrap();

        let err = f
            .service
            .create_or_update_draft(&f.session, other.id, &f.morning, Some(draft.id), &[])
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let noon = ReportType::parse("noon report").unwrap();
        let err = f
            .service
            .create_or_update_draft(&f.session, f.vessel.id, &noon, Some(draft.id), &[])
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_other_company_cannot_touch_report() {
        let f = fixture();
        let rival = testing::session(&f.service, "Rival");
        let draft = f
            .service
            .open_draft(&f.session, f.vessel.id, &f.morning)
            .unwrap();

        assert!(matches!(
            f.service.save_draft(&rival, draft.id, &[("A", "x")]),
            Err(Error::NotFound { entity: "report", .. })
        ));
        assert!(matches!(
            f.service.submit_report(&rival, draft.id, "ops@example.com"),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            f.service.open_draft(&rival, f.vessel.id, &f.morning),
            Err(Error::NotFound { entity: "vessel", .. })
        ));
    }

    #[test]
    fn test_submit_notifies() {
        let (service, sent) = testing::service();
        let session = testing::session(&service, "Acme");
        let vessel = testing::vessel(&service, &session, "V1");
        let morning = ReportType::parse("morning report").unwrap();
        service
            .define_template(&session, &morning, &fields(&["A", "B"]), None)
            .unwrap();
        let draft = service
            .create_or_update_draft(&session, vessel.id, &morning, None, &[("A", "x")])
            .unwrap();

        let submission = service
            .submit_report(&session, draft.id, " ops@example.com ")
            .unwrap();
        assert!(submission.notified());
        assert_eq!(submission.report.status, ReportStatus::Submitted);
        assert!(submission.report.submitted_at.is_some());

        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "ops@example.com");
        assert!(sent[0].subject.contains("V1"));
        assert!(sent[0].subject.contains("morning report"));
        assert!(sent[0].body.contains("A: x\n"));
    }

    #[test]
    fn test_submitted_report_is_immutable() {
        let f = fixture();
        let draft = f
            .service
            .open_draft(&f.session, f.vessel.id, &f.morning)
            .unwrap();
        f.service
            .submit_report(&f.session, draft.id, "ops@example.com")
            .unwrap();

        assert!(matches!(
            f.service.save_draft(&f.session, draft.id, &[("A", "late")]),
            Err(Error::InvalidStateTransition { .. })
        ));
        assert!(matches!(
            f.service.create_or_update_draft(
                &f.session,
                f.vessel.id,
                &f.morning,
                Some(draft.id),
                &[]
            ),
            Err(Error::InvalidStateTransition { .. })
        ));
        assert!(matches!(
            f.service.submit_report(&f.session, draft.id, "ops@example.com"),
            Err(Error::InvalidStateTransition { .. })
        ));
        let stored = f.service.get_report(&f.session, draft.id).unwrap();
        assert_eq!(stored.data.get("A"), Some(""));
    }

    #[test]
    fn test_submit_requires_recipient() {
        let f = fixture();
        let draft = f
            .service
            .open_draft(&f.session, f.vessel.id, &f.morning)
            .unwrap();
        assert!(matches!(
            f.service.submit_report(&f.session, draft.id, "  "),
            Err(Error::Validation { .. })
        ));
        assert!(f.service.get_report(&f.session, draft.id).unwrap().is_draft());
    }

    #[test]
    fn test_failed_notification_keeps_submission() {
        let f = fixture_with(RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        });
        let draft = f
            .service
            .open_draft(&f.session, f.vessel.id, &f.morning)
            .unwrap();

        let submission = f
            .service
            .submit_report(&f.session, draft.id, "ops@example.com")
            .unwrap();
        assert!(!submission.notified());
        assert!(matches!(
            submission.warning(),
            Some(Error::NotificationFailure { .. })
        ));
        assert!(!f.service.get_report(&f.session, draft.id).unwrap().is_draft());
    }

    #[test]
    fn test_unreachable_mail_relay_keeps_submission() {
        use crate::config::NotifyConfig;
        use crate::notify::SmtpNotifier;
        use crate::storage::Storage;

        let notifier = SmtpNotifier::new(NotifyConfig {
            enabled: true,
            smtp_host: Some("127.0.0.1".to_string()),
            smtp_port: 1,
            sender: Some("reports@example.com".to_string()),
            timeout_secs: 2,
            ..NotifyConfig::default()
        })
        .unwrap();
        let service = Service::new(Storage::open_in_memory().unwrap(), Box::new(notifier));
        let session = testing::session(&service, "Acme");
        let vessel = testing::vessel(&service, &session, "V1");
        let noon = ReportType::parse("noon report").unwrap();
        service
            .define_template(&session, &noon, &fields(&["A"]), None)
            .unwrap();
        let draft = service.open_draft(&session, vessel.id, &noon).unwrap();

        let submission = service
            .submit_report(&session, draft.id, "ops@example.com")
            .unwrap();
        assert!(matches!(
            submission.warning(),
            Some(Error::NotificationFailure { recipient, .. }) if recipient == "ops@example.com"
        ));
        assert_eq!(submission.report.status, ReportStatus::Submitted);
        assert!(!service.get_report(&session, draft.id).unwrap().is_draft());
    }

    #[test]
    fn test_listings() {
        let f = fixture();
        let noon = ReportType::parse("noon report").unwrap();
        f.service
            .define_template(&f.session, &noon, &fields(&["N"]), None)
            .unwrap();
        let v2 = testing::vessel(&f.service, &f.session, "V2");

        let first = f
            .service
            .open_draft(&f.session, f.vessel.id, &f.morning)
            .unwrap();
        let second = f.service.open_draft(&f.session, v2.id, &noon).unwrap();
        let open = f
            .service
            .open_draft(&f.session, f.vessel.id, &f.morning)
            .unwrap();
        f.service
            .submit_report(&f.session, first.id, "ops@example.com")
            .unwrap();
        f.service
            .submit_report(&f.session, second.id, "ops@example.com")
            .unwrap();

        let submitted = f
            .service
            .list_submitted_reports(&f.session, ReportFilter::default())
            .unwrap();
        assert_eq!(
            submitted.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        let by_vessel = f
            .service
            .list_submitted_reports(
                &f.session,
                ReportFilter {
                    vessel_id: Some(f.vessel.id),
                    ..ReportFilter::default()
                },
            )
            .unwrap();
        assert_eq!(by_vessel.len(), 1);
        assert_eq!(by_vessel[0].id, first.id);

        let by_type = f
            .service
            .list_submitted_reports(
                &f.session,
                ReportFilter {
                    report_type: Some(noon.clone()),
                    ..ReportFilter::default()
                },
            )
            .unwrap();
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].id, second.id);

        // Status in the filter cannot widen the listing to drafts.
        let forced = f
            .service
            .list_submitted_reports(&f.session, ReportFilter::drafts())
            .unwrap();
        assert_eq!(forced.len(), 2);

        let drafts = f.service.list_drafts(&f.session).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, open.id);
    }

    #[test]
    fn test_reports_outlive_vessel_and_template() {
        let f = fixture();
        let draft = f
            .service
            .create_or_update_draft(&f.session, f.vessel.id, &f.morning, None, &[("A", "x")])
            .unwrap();
        let token = f
            .service
            .delete_vessel(&f.session, f.vessel.id, None)
            .unwrap_err()
            .confirmation_token()
            .cloned()
            .unwrap();
        f.service
            .delete_vessel(&f.session, f.vessel.id, Some(&token))
            .unwrap();

        let templates = f.service.list_templates(&f.session).unwrap();
        let template = &templates[0];
        let token = f
            .service
            .delete_template(&f.session, template.id, None)
            .unwrap_err()
            .confirmation_token()
            .cloned()
            .unwrap();
        f.service
            .delete_template(&f.session, template.id, Some(&token))
            .unwrap();

        let report = f
            .service
            .save_draft(&f.session, draft.id, &[("B", "y")])
            .unwrap();
        assert_eq!(report.vessel_name, "V1");
        assert_eq!(report.data.get("A"), Some("x"));
        assert!(f
            .service
            .submit_report(&f.session, draft.id, "ops@example.com")
            .is_ok());
    }

    #[test]
    fn test_draft_keeps_fields_after_template_change() {
        let f = fixture();
        let draft = f
            .service
            .open_draft(&f.session, f.vessel.id, &f.morning)
            .unwrap();
        let token = f
            .service
            .define_template(&f.session, &f.morning, &fields(&["Z"]), None)
            .unwrap_err()
            .confirmation_token()
            .cloned()
            .unwrap();
        f.service
            .define_template(&f.session, &f.morning, &fields(&["Z"]), Some(&token))
            .unwrap();

        let stored = f.service.get_report(&f.session, draft.id).unwrap();
        assert_eq!(stored.data.fields().collect::<Vec<_>>(), vec!["A", "B"]);
        let fresh = f
            .service
            .open_draft(&f.session, f.vessel.id, &f.morning)
            .unwrap();
        assert_eq!(fresh.data.fields().collect::<Vec<_>>(), vec!["Z"]);
    }
}
