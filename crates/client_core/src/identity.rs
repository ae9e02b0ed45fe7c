use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::error::FormError;
use tracing::{info, warn};

use crate::IdentityLookup;

pub const DEFAULT_ADDRESS_FIELD: &str = "ip";

/// Looks up the caller's public address through a JSON IP-echo service.
#[derive(Debug, Clone)]
pub struct HttpIdentityLookup {
    http: Client,
    url: String,
    field: String,
}

impl HttpIdentityLookup {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            field: DEFAULT_ADDRESS_FIELD.to_string(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

#[async_trait]
impl IdentityLookup for HttpIdentityLookup {
    async fn lookup(&self) -> Result<String, FormError> {
        info!(url = %self.url, "identity: looking up public address");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| fail(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!(
                "identity service {} answered with status {status}",
                self.url
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| fail(format!("identity response was not valid JSON: {e}")))?;

        let address = body
            .get(&self.field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .ok_or_else(|| {
                fail(format!(
                    "identity response has no string field '{}'",
                    self.field
                ))
            })?;

        info!(address, "identity: public address resolved");
        Ok(address.to_string())
    }
}

fn fail(detail: String) -> FormError {
    warn!(detail = %detail, "identity: lookup failed");
    FormError::identity_lookup(detail)
}
