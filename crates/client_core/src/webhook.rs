use async_trait::async_trait;
use reqwest::Client;
use shared::{domain::SubmissionPolicy, error::FormError, protocol::RegistrationPayload};
use tracing::{info, warn};

use crate::RegistrationSink;

/// Posts registrations to the intake webhook as JSON.
///
/// Under [`SubmissionPolicy::Optimistic`] the response is dropped unread, so only a transport
/// failure is reported. [`SubmissionPolicy::Confirmed`] also rejects non-success statuses.
#[derive(Debug, Clone)]
pub struct HttpWebhookSink {
    http: Client,
    url: String,
    policy: SubmissionPolicy,
}

impl HttpWebhookSink {
    pub fn new(url: impl Into<String>, policy: SubmissionPolicy) -> Self {
        Self::with_client(Client::new(), url, policy)
    }

    pub fn with_client(http: Client, url: impl Into<String>, policy: SubmissionPolicy) -> Self {
        Self {
            http,
            url: url.into(),
            policy,
        }
    }
}

#[async_trait]
impl RegistrationSink for HttpWebhookSink {
    async fn deliver(&self, payload: &RegistrationPayload) -> Result<(), FormError> {
        info!(url = %self.url, ip = %payload.ip, "register: posting registration");

        let response = self
            .http
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "register: webhook unreachable");
                FormError::submission(e.to_string())
            })?;

        match self.policy {
            SubmissionPolicy::Optimistic => {
                info!("register: request dispatched");
            }
            SubmissionPolicy::Confirmed => {
                let status = response.status();
                if !status.is_success() {
                    warn!(url = %self.url, %status, "register: webhook rejected registration");
                    return Err(FormError::submission(format!(
                        "webhook answered with status {status}"
                    )));
                }
                info!(%status, "register: registration accepted");
            }
        }
        Ok(())
    }
}
