//! Terminal rendition of the registration form.

use std::io::Write;

use anyhow::Result;
use client_core::{IdentityLookup, RegistrationController, RegistrationSink, Session};
use shared::{
    domain::{SubmissionPolicy, WorkflowStatus},
    error::ErrorKind,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Prompts for names until the user stops, input ends, or the form locks.
///
/// After a failed send the kept name is offered as the default, so an empty line resubmits it.
/// Returns the status the session finished in.
pub async fn run_interactive<I, W, R, O>(
    controller: &mut RegistrationController<I, W>,
    delivery: SubmissionPolicy,
    input: R,
    out: &mut O,
) -> Result<WorkflowStatus>
where
    I: IdentityLookup,
    W: RegistrationSink,
    R: AsyncBufRead + Unpin,
    O: Write,
{
    let mut lines = input.lines();

    while controller.status() == WorkflowStatus::Ready {
        let kept = retry_name(controller.session());
        match &kept {
            Some(name) => write!(out, "Full name [{}]: ", name.trim())?,
            None => write!(out, "Full name: ")?,
        }
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let name = match kept {
            Some(kept) if line.trim().is_empty() => kept,
            _ => line,
        };

        match controller.submit(name).await {
            Ok(()) => {
                let name = controller.session().registrant_name.trim().to_string();
                writeln!(out, "{}", confirmation(delivery, &name))?;
            }
            Err(err) => {
                writeln!(out, "{}", err.user_message())?;
                continue;
            }
        }

        write!(out, "Register another device? [y/N]: ")?;
        out.flush()?;
        match lines.next_line().await? {
            Some(answer) if is_yes(&answer) => {
                controller.register_another();
            }
            _ => break,
        }
    }

    Ok(controller.status())
}

/// Submits `name` once and prints the outcome.
pub async fn run_once<I, W, O>(
    controller: &mut RegistrationController<I, W>,
    delivery: SubmissionPolicy,
    name: String,
    out: &mut O,
) -> Result<WorkflowStatus>
where
    I: IdentityLookup,
    W: RegistrationSink,
    O: Write,
{
    match controller.submit(name).await {
        Ok(()) => {
            let name = controller.session().registrant_name.trim().to_string();
            writeln!(out, "{}", confirmation(delivery, &name))?;
        }
        Err(err) => writeln!(out, "{}", err.user_message())?,
    }
    Ok(controller.status())
}

/// Name kept from a send that failed in transit.
fn retry_name(session: &Session) -> Option<String> {
    match &session.error {
        Some(err)
            if err.kind == ErrorKind::Submission && !session.registrant_name.trim().is_empty() =>
        {
            Some(session.registrant_name.clone())
        }
        _ => None,
    }
}

/// Under optimistic delivery success means dispatched, not recorded.
fn confirmation(delivery: SubmissionPolicy, name: &str) -> String {
    match delivery {
        SubmissionPolicy::Optimistic => format!("Registration sent for {name}."),
        SubmissionPolicy::Confirmed => format!("Device registered for {name}."),
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
