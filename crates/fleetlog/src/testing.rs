//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::model::{NewVessel, Session, Vessel};
use crate::notify::Notifier;
use crate::service::Service;
use crate::storage::Storage;

pub(crate) const PASSWORD: &str = "abc123!";

/// One message handed to a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SentMessage {
    pub subject: String,
    pub body: String,
    pub recipient: String,
}

/// Notifier that records attempts and optionally fails them.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingNotifier {
    pub sent: Rc<RefCell<Vec<SentMessage>>>,
    pub fail: bool,
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()> {
        self.sent.borrow_mut().push(SentMessage {
            subject: subject.to_string(),
            body: body.to_string(),
            recipient: recipient.to_string(),
        });
        if self.fail {
            return Err(Error::notification(recipient, "relay refused connection"));
        }
        Ok(())
    }
}

/// An in-memory service plus a handle on what it sent.
pub(crate) fn service() -> (Service, Rc<RefCell<Vec<SentMessage>>>) {
    service_with(RecordingNotifier::default())
}

pub(crate) fn service_with(
    notifier: RecordingNotifier,
) -> (Service, Rc<RefCell<Vec<SentMessage>>>) {
    crate::logging::init_test_logging();
    let sent = Rc::clone(&notifier.sent);
    let storage = Storage::open_in_memory().expect("failed to create test storage");
    (Service::new(storage, Box::new(notifier)), sent)
}

/// Register and log in a company.
pub(crate) fn session(service: &Service, name: &str) -> Session {
    service.register(name, PASSWORD).expect("register");
    service.login(name, PASSWORD).expect("login")
}

pub(crate) fn vessel(service: &Service, session: &Session, name: &str) -> Vessel {
    service
        .add_vessel(
            session,
            NewVessel {
                name: name.to_string(),
                imo_number: "9321483".to_string(),
                mmsi: "477995900".to_string(),
            },
        )
        .expect("add vessel")
}

pub(crate) fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}
