use std::{collections::HashMap, fs, io, path::Path, str::FromStr};

use anyhow::{anyhow, bail, Context};
use client_core::{identity::DEFAULT_ADDRESS_FIELD, Policy};
use shared::domain::SubmissionPolicy;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "register.toml";
pub const DEFAULT_IDENTITY_URL: &str = "https://api.ipify.org?format=json";
pub const DEFAULT_POLICY_MESSAGE: &str =
    "This device is not on the office network. Connect to it and reload to register.";

/// Raw settings as gathered from defaults, the config file, env and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub office_address: Option<String>,
    pub webhook_url: Option<String>,
    pub identity_url: String,
    pub identity_field: String,
    pub user_agent: String,
    pub policy_message: String,
    pub submission_policy: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            office_address: None,
            webhook_url: None,
            identity_url: DEFAULT_IDENTITY_URL.into(),
            identity_field: DEFAULT_ADDRESS_FIELD.into(),
            user_agent: default_user_agent(),
            policy_message: DEFAULT_POLICY_MESSAGE.into(),
            submission_policy: "optimistic".into(),
        }
    }
}

/// Validated configuration the client runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterConfig {
    pub office_address: String,
    pub webhook_url: Url,
    pub identity_url: Url,
    pub identity_field: String,
    pub user_agent: String,
    pub policy_message: String,
    pub submission_policy: SubmissionPolicy,
}

impl RegisterConfig {
    pub fn policy(&self) -> Policy {
        Policy {
            office_address: self.office_address.clone(),
            user_agent: self.user_agent.clone(),
            policy_message: self.policy_message.clone(),
        }
    }
}

pub fn default_user_agent() -> String {
    format!("device-registration/{}", env!("CARGO_PKG_VERSION"))
}

/// Values given on the command line. They win over every other source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub office_address: Option<String>,
    pub webhook_url: Option<String>,
    pub identity_url: Option<String>,
    pub submission_policy: Option<String>,
}

/// Defaults < `path` < environment (read through `lookup`) < `overrides`.
pub fn resolve(
    path: &Path,
    overrides: &Overrides,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<RegisterConfig> {
    let mut settings = load_settings(path, lookup)?;
    apply_overrides(&mut settings, overrides);
    RegisterConfig::try_from(settings).context("invalid registration settings")
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_settings(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "config: no config file, using defaults");
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, lookup);
    Ok(settings)
}

pub fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    for (key, value) in file_cfg {
        if !set_field(settings, &key, value) {
            tracing::warn!(key = %key, "config: unknown key ignored");
        }
    }
    Ok(())
}

/// `APP__*` wins over `REGISTER_*` when both are set.
pub fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    for key in FIELDS {
        let upper = key.to_ascii_uppercase();
        for var in [format!("REGISTER_{upper}"), format!("APP__{upper}")] {
            if let Some(value) = lookup(&var) {
                set_field(settings, key, value);
            }
        }
    }
}

pub fn apply_overrides(settings: &mut Settings, overrides: &Overrides) {
    let flags = [
        ("office_address", &overrides.office_address),
        ("webhook_url", &overrides.webhook_url),
        ("identity_url", &overrides.identity_url),
        ("submission_policy", &overrides.submission_policy),
    ];
    for (key, value) in flags {
        if let Some(value) = value {
            set_field(settings, key, value.clone());
        }
    }
}

const FIELDS: [&str; 7] = [
    "office_address",
    "webhook_url",
    "identity_url",
    "identity_field",
    "user_agent",
    "policy_message",
    "submission_policy",
];

fn set_field(settings: &mut Settings, key: &str, value: String) -> bool {
    match key {
        "office_address" => settings.office_address = Some(value),
        "webhook_url" => settings.webhook_url = Some(value),
        "identity_url" => settings.identity_url = value,
        "identity_field" => settings.identity_field = value,
        "user_agent" => settings.user_agent = value,
        "policy_message" => settings.policy_message = value,
        "submission_policy" => settings.submission_policy = value,
        _ => return false,
    }
    true
}

pub fn parse_submission_policy(raw: &str) -> anyhow::Result<SubmissionPolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "optimistic" => Ok(SubmissionPolicy::Optimistic),
        "confirmed" => Ok(SubmissionPolicy::Confirmed),
        other => bail!("unknown submission policy '{other}' (expected optimistic or confirmed)"),
    }
}

impl TryFrom<Settings> for RegisterConfig {
    type Error = anyhow::Error;

    fn try_from(settings: Settings) -> anyhow::Result<Self> {
        let office_address = settings
            .office_address
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("office_address is not configured"))?;
        let webhook_url = settings
            .webhook_url
            .ok_or_else(|| anyhow!("webhook_url is not configured"))?;

        let identity_field = settings.identity_field.trim().to_string();
        if identity_field.is_empty() {
            bail!("identity_field must not be empty");
        }

        Ok(Self {
            office_address,
            webhook_url: parse_http_url("webhook_url", &webhook_url)?,
            identity_url: parse_http_url("identity_url", &settings.identity_url)?,
            identity_field,
            user_agent: settings.user_agent,
            policy_message: settings.policy_message,
            submission_policy: parse_submission_policy(&settings.submission_policy)?,
        })
    }
}

fn parse_http_url(name: &str, raw: &str) -> anyhow::Result<Url> {
    let url = Url::from_str(raw.trim()).with_context(|| format!("{name} '{raw}' is not a URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{name} must use http or https, got '{}'", url.scheme());
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
