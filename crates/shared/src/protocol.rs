use serde::{Deserialize, Serialize};

/// Body posted to the registration webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    pub name: String,
    pub user_agent: String,
    pub ip: String,
}

impl RegistrationPayload {
    pub fn new(
        name: impl Into<String>,
        user_agent: impl Into<String>,
        ip: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            user_agent: user_agent.into(),
            ip: ip.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_webhook_field_names_in_order() {
        let payload = RegistrationPayload::new("Jane Doe", "ua/1.0", "203.0.113.5");
        assert_eq!(
            serde_json::to_string(&payload).expect("serialize"),
            r#"{"name":"Jane Doe","userAgent":"ua/1.0","ip":"203.0.113.5"}"#
        );
    }
}
