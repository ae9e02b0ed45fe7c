use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Idle,
    LoadingIp,
    Ready,
    Submitting,
    Success,
    Error,
}

impl WorkflowStatus {
    /// Whether the name field and submit action accept input in this status.
    pub fn accepts_input(self) -> bool {
        matches!(self, WorkflowStatus::Ready)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::Idle => "idle",
            WorkflowStatus::LoadingIp => "loading_ip",
            WorkflowStatus::Ready => "ready",
            WorkflowStatus::Submitting => "submitting",
            WorkflowStatus::Success => "success",
            WorkflowStatus::Error => "error",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a webhook response is interpreted once the request has been sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPolicy {
    /// Response is never inspected; anything short of a transport failure counts as delivered.
    #[default]
    Optimistic,
    /// A non-success HTTP status is reported as a submission failure.
    Confirmed,
}
