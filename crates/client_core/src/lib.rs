use std::collections::VecDeque;

use async_trait::async_trait;
use shared::{
    domain::WorkflowStatus,
    error::{ErrorKind, FormError},
    protocol::RegistrationPayload,
};
use tracing::{info, warn};

pub mod identity;
pub mod webhook;
pub mod workflow;

pub use identity::HttpIdentityLookup;
pub use webhook::HttpWebhookSink;
pub use workflow::{Effect, Event, Policy, Session};

/// HTTP client whose `User-Agent` header matches the `userAgent` reported in the payload.
pub fn http_client(user_agent: &str) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().user_agent(user_agent).build()
}

/// Source of the caller's public network address.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn lookup(&self) -> Result<String, FormError>;
}

/// Destination for accepted registrations.
#[async_trait]
pub trait RegistrationSink: Send + Sync {
    async fn deliver(&self, payload: &RegistrationPayload) -> Result<(), FormError>;
}

#[async_trait]
impl<T: IdentityLookup + ?Sized> IdentityLookup for std::sync::Arc<T> {
    async fn lookup(&self) -> Result<String, FormError> {
        (**self).lookup().await
    }
}

#[async_trait]
impl<T: RegistrationSink + ?Sized> RegistrationSink for std::sync::Arc<T> {
    async fn deliver(&self, payload: &RegistrationPayload) -> Result<(), FormError> {
        (**self).deliver(payload).await
    }
}

/// Owns the form session and runs the effects the state machine asks for.
///
/// Every operation takes `&mut self`, so at most one network call is in flight at a time.
pub struct RegistrationController<I, W> {
    identity: I,
    sink: W,
    policy: Policy,
    session: Session,
}

impl<I: IdentityLookup, W: RegistrationSink> RegistrationController<I, W> {
    pub fn new(identity: I, sink: W, policy: Policy) -> Self {
        Self {
            identity,
            sink,
            policy,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> WorkflowStatus {
        self.session.status
    }

    /// Runs the one-time identity check. A failure leaves the session in `error` for good.
    pub async fn start(&mut self) -> &Session {
        self.dispatch(Event::Load).await;
        &self.session
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &Session {
        self.apply_local(Event::NameChanged(name.into()));
        &self.session
    }

    /// Submits `name` and reports the error the form ended up showing, if any.
    pub async fn submit(&mut self, name: impl Into<String>) -> Result<(), FormError> {
        let status = self.session.status;
        if !status.accepts_input() {
            warn!(%status, "register: submit while input is disabled");
            return Err(match &self.session.error {
                Some(err) if err.kind.is_terminal() => err.clone(),
                _ => FormError::input_disabled(status),
            });
        }

        self.apply_local(Event::NameChanged(name.into()));
        self.dispatch(Event::Submit).await;

        match (self.session.status, &self.session.error) {
            (WorkflowStatus::Success, _) => Ok(()),
            (_, Some(err)) => Err(err.clone()),
            (status, None) => Err(FormError::new(
                ErrorKind::Submission,
                format!("submission ended in unexpected state {status}"),
            )),
        }
    }

    pub fn register_another(&mut self) -> &Session {
        self.apply_local(Event::RegisterAnother);
        &self.session
    }

    async fn dispatch(&mut self, event: Event) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            for effect in self.step(event) {
                pending.push_back(self.run_effect(effect).await);
            }
        }
    }

    fn apply_local(&mut self, event: Event) {
        let effects = self.step(event);
        debug_assert!(effects.is_empty(), "local events never produce effects");
    }

    fn step(&mut self, event: Event) -> Vec<Effect> {
        let (next, effects) = workflow::transition(&self.session, event, &self.policy);
        self.session = next;
        effects
    }

    async fn run_effect(&self, effect: Effect) -> Event {
        match effect {
            Effect::LookupIdentity => Event::IdentityResolved(self.identity.lookup().await),
            Effect::Dispatch(payload) => {
                let result = self.sink.deliver(&payload).await;
                if result.is_ok() {
                    info!(name = %payload.name, ip = %payload.ip, "register: submission finished");
                }
                Event::SubmissionFinished(result)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
