use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NAME_REQUIRED: &str = "name required";
pub const CONNECTIVITY_MESSAGE: &str =
    "Could not determine your network address; check your connection and reload.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    IdentityLookup,
    Validation,
    NetworkPolicy,
    Submission,
    /// Submit attempted while the form does not accept input (busy, locked or already done).
    InputDisabled,
}

impl ErrorKind {
    /// Only a failed identity lookup ends the session; everything else can be fixed by the user.
    pub fn is_terminal(self) -> bool {
        matches!(self, ErrorKind::IdentityLookup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct FormError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl FormError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn identity_lookup(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::IdentityLookup, CONNECTIVITY_MESSAGE).with_detail(detail)
    }

    pub fn validation() -> Self {
        Self::new(ErrorKind::Validation, NAME_REQUIRED)
    }

    pub fn network_policy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkPolicy, message)
    }

    pub fn submission(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(
            ErrorKind::Submission,
            format!("Registration could not be sent: {detail}"),
        )
        .with_detail(detail)
    }

    pub fn input_disabled(status: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::InputDisabled,
            format!("form is not accepting submissions while {status}"),
        )
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Text meant for the person filling in the form.
    pub fn user_message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_lookup_keeps_detail_out_of_user_message() {
        let err = FormError::identity_lookup("connection refused");
        assert_eq!(err.user_message(), CONNECTIVITY_MESSAGE);
        assert_eq!(err.detail.as_deref(), Some("connection refused"));
        assert!(err.kind.is_terminal());
    }

    #[test]
    fn validation_error_uses_fixed_message() {
        let err = FormError::validation();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, NAME_REQUIRED);
        assert!(!err.kind.is_terminal());
    }

    #[test]
    fn input_disabled_is_its_own_kind() {
        let err = FormError::input_disabled("success");
        assert_eq!(err.kind, ErrorKind::InputDisabled);
        assert_eq!(err.message, "form is not accepting submissions while success");
        assert!(!err.kind.is_terminal());
    }

    #[test]
    fn serializes_kind_as_snake_case() {
        let value =
            serde_json::to_value(FormError::network_policy("wrong network")).expect("serialize");
        assert_eq!(value["kind"], "network_policy");
        assert!(value.get("detail").is_none());
    }
}
