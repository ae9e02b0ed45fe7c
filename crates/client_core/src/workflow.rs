//! Registration form state machine.
//!
//! [`transition`] is pure: it takes the current [`Session`] and one [`Event`] and returns the
//! next session plus the [`Effect`]s the caller has to run. Effect results come back in as
//! further events, so the whole flow can be exercised without any network or UI.

use shared::{domain::WorkflowStatus, error::FormError, protocol::RegistrationPayload};
use tracing::debug;

/// Static rules the form is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub office_address: String,
    pub user_agent: String,
    pub policy_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub registrant_name: String,
    /// Absent until the identity lookup succeeds; stays absent after a failed lookup.
    pub detected_address: Option<String>,
    pub status: WorkflowStatus,
    pub error: Option<FormError>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Load,
    IdentityResolved(Result<String, FormError>),
    NameChanged(String),
    Submit,
    SubmissionFinished(Result<(), FormError>),
    RegisterAnother,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::Load => "load",
            Event::IdentityResolved(_) => "identity_resolved",
            Event::NameChanged(_) => "name_changed",
            Event::Submit => "submit",
            Event::SubmissionFinished(_) => "submission_finished",
            Event::RegisterAnother => "register_another",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LookupIdentity,
    Dispatch(RegistrationPayload),
}

pub fn transition(session: &Session, event: Event, policy: &Policy) -> (Session, Vec<Effect>) {
    let mut next = session.clone();
    let event_name = event.name();

    let effects = match (session.status, event) {
        (WorkflowStatus::Idle, Event::Load) => {
            next.status = WorkflowStatus::LoadingIp;
            next.detected_address = None;
            next.error = None;
            vec![Effect::LookupIdentity]
        }
        (WorkflowStatus::LoadingIp, Event::IdentityResolved(Ok(address))) => {
            next.detected_address = Some(address);
            next.status = WorkflowStatus::Ready;
            Vec::new()
        }
        (WorkflowStatus::LoadingIp, Event::IdentityResolved(Err(err))) => {
            next.error = Some(err);
            next.status = WorkflowStatus::Error;
            Vec::new()
        }
        (WorkflowStatus::Ready, Event::NameChanged(name)) => {
            next.registrant_name = name;
            Vec::new()
        }
        (WorkflowStatus::Ready, Event::Submit) => submit(&mut next, policy),
        (WorkflowStatus::Submitting, Event::SubmissionFinished(Ok(()))) => {
            next.status = WorkflowStatus::Success;
            next.error = None;
            Vec::new()
        }
        (WorkflowStatus::Submitting, Event::SubmissionFinished(Err(err))) => {
            next.status = WorkflowStatus::Ready;
            next.error = Some(err);
            Vec::new()
        }
        (WorkflowStatus::Success, Event::RegisterAnother) => {
            next.registrant_name.clear();
            next.error = None;
            next.status = WorkflowStatus::Ready;
            Vec::new()
        }
        (status, _) => {
            debug!(status = %status, event = event_name, "workflow: event ignored");
            return (next, Vec::new());
        }
    };

    debug!(
        from = %session.status,
        to = %next.status,
        event = event_name,
        effects = effects.len(),
        "workflow: transition"
    );
    (next, effects)
}

fn submit(next: &mut Session, policy: &Policy) -> Vec<Effect> {
    let name = next.registrant_name.trim();
    if name.is_empty() {
        next.error = Some(FormError::validation());
        return Vec::new();
    }

    let address = match next.detected_address.as_deref() {
        Some(address) if address == policy.office_address => address,
        _ => {
            next.error = Some(FormError::network_policy(policy.policy_message.clone()));
            return Vec::new();
        }
    };

    let payload = RegistrationPayload::new(name, policy.user_agent.clone(), address);
    next.error = None;
    next.status = WorkflowStatus::Submitting;
    vec![Effect::Dispatch(payload)]
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
