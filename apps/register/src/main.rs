use std::{io, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{http_client, HttpIdentityLookup, HttpWebhookSink, RegistrationController};
use shared::domain::WorkflowStatus;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod form;

use config::{Overrides, DEFAULT_CONFIG_PATH};

/// Registers this device from the office network.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    office_address: Option<String>,
    #[arg(long)]
    webhook_url: Option<String>,
    #[arg(long)]
    identity_url: Option<String>,
    /// `optimistic` or `confirmed`.
    #[arg(long)]
    submission_policy: Option<String>,
    /// Submit this name once instead of prompting.
    #[arg(long)]
    name: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            office_address: self.office_address.clone(),
            webhook_url: self.webhook_url.clone(),
            identity_url: self.identity_url.clone(),
            submission_policy: self.submission_policy.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = config::resolve(&args.config, &args.overrides(), |key| {
        std::env::var(key).ok()
    })?;
    info!(
        office_address = %config.office_address,
        identity_url = %config.identity_url,
        policy = ?config.submission_policy,
        "register: starting"
    );

    let http = http_client(&config.user_agent)
        .with_context(|| format!("invalid user agent '{}'", config.user_agent))?;
    let identity = HttpIdentityLookup::with_client(http.clone(), config.identity_url.as_str())
        .with_field(config.identity_field.clone());
    let sink = HttpWebhookSink::with_client(
        http,
        config.webhook_url.as_str(),
        config.submission_policy,
    );
    let mut controller = RegistrationController::new(identity, sink, config.policy());

    let mut out = io::stdout();
    println!("Checking network...");
    let session = controller.start().await;
    if let Some(err) = session.error.as_ref().filter(|err| err.kind.is_terminal()) {
        bail!("{}", err.user_message());
    }
    if let Some(address) = &session.detected_address {
        println!("Detected address: {address}");
    }

    let delivery = config.submission_policy;
    let status = match args.name {
        Some(name) => form::run_once(&mut controller, delivery, name, &mut out).await?,
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            form::run_interactive(&mut controller, delivery, stdin, &mut out).await?
        }
    };

    if status != WorkflowStatus::Success {
        bail!("registration not completed (status: {status})");
    }
    Ok(())
}
