use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn complete_settings() -> Settings {
    Settings {
        office_address: Some("203.0.113.5".into()),
        webhook_url: Some("https://hooks.example.com/register".into()),
        ..Settings::default()
    }
}

#[test]
fn defaults_use_optimistic_delivery_and_ip_field() {
    let config = RegisterConfig::try_from(complete_settings()).expect("valid config");
    assert_eq!(config.submission_policy, SubmissionPolicy::Optimistic);
    assert_eq!(config.identity_field, "ip");
    assert_eq!(config.identity_url.as_str(), "https://api.ipify.org/?format=json");
    assert!(config.user_agent.starts_with("device-registration/"));
    assert_eq!(config.policy().policy_message, DEFAULT_POLICY_MESSAGE);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
office_address = "198.51.100.7"
webhook_url = "https://hooks.example.com/intake"
submission_policy = "confirmed"
policy_message = "Nur im Büronetz möglich."
"#,
    )
    .expect("parse file");

    let config = RegisterConfig::try_from(settings).expect("valid config");
    assert_eq!(config.office_address, "198.51.100.7");
    assert_eq!(config.submission_policy, SubmissionPolicy::Confirmed);
    assert_eq!(config.policy_message, "Nur im Büronetz möglich.");
}

#[test]
fn unknown_file_keys_are_ignored() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "theme = \"dark\"\n").expect("parse file");
    assert_eq!(settings, Settings::default());
}

#[test]
fn app_env_prefix_wins_over_register_prefix() {
    let mut settings = complete_settings();
    apply_env(&mut settings, |key| match key {
        "REGISTER_OFFICE_ADDRESS" => Some("192.0.2.1".into()),
        "APP__OFFICE_ADDRESS" => Some("192.0.2.2".into()),
        "REGISTER_IDENTITY_FIELD" => Some("address".into()),
        _ => None,
    });
    assert_eq!(settings.office_address.as_deref(), Some("192.0.2.2"));
    assert_eq!(settings.identity_field, "address");
}

#[test]
fn missing_office_address_is_rejected() {
    let settings = Settings {
        office_address: Some("  ".into()),
        ..complete_settings()
    };
    let err = RegisterConfig::try_from(settings).expect_err("missing office address");
    assert!(err.to_string().contains("office_address"));
}

#[test]
fn missing_webhook_is_rejected() {
    let settings = Settings {
        webhook_url: None,
        ..complete_settings()
    };
    assert!(RegisterConfig::try_from(settings).is_err());
}

#[test]
fn non_http_urls_are_rejected() {
    let settings = Settings {
        webhook_url: Some("ftp://hooks.example.com/register".into()),
        ..complete_settings()
    };
    let err = RegisterConfig::try_from(settings).expect_err("ftp url");
    assert!(err.to_string().contains("http"));
}

#[test]
fn unknown_submission_policy_is_rejected() {
    assert!(parse_submission_policy("eventually").is_err());
    assert_eq!(
        parse_submission_policy(" Confirmed ").expect("policy"),
        SubmissionPolicy::Confirmed
    );
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("register_missing_{suffix}.toml"));

    let settings = load_settings(&path, |_| None).expect("load settings");
    assert_eq!(settings.identity_field, Settings::default().identity_field);
}

#[test]
fn malformed_config_file_is_an_error() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("register_bad_{suffix}.toml"));
    fs::write(&path, "office_address = [1, 2]\n").expect("write config");

    let err = load_settings(&path, |_| None).expect_err("bad file");
    assert!(err.to_string().contains("invalid config file"));

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn flags_beat_env_which_beats_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("register_layers_{suffix}.toml"));
    fs::write(
        &path,
        r#"
office_address = "198.51.100.1"
webhook_url = "https://file.example.com/hook"
identity_url = "https://file.example.com/ip"
submission_policy = "confirmed"
identity_field = "origin"
"#,
    )
    .expect("write config");

    let env_lookup = |key: &str| match key {
        "REGISTER_OFFICE_ADDRESS" => Some("198.51.100.2".to_string()),
        "APP__WEBHOOK_URL" => Some("https://env.example.com/hook".to_string()),
        "REGISTER_IDENTITY_URL" => Some("https://env.example.com/ip".to_string()),
        _ => None,
    };
    let overrides = Overrides {
        office_address: Some("198.51.100.3".into()),
        submission_policy: Some("optimistic".into()),
        ..Overrides::default()
    };

    let config = resolve(&path, &overrides, env_lookup).expect("resolve config");
    fs::remove_file(&path).expect("cleanup");

    // set in file, env and flag
    assert_eq!(config.office_address, "198.51.100.3");
    // set in file and flag
    assert_eq!(config.submission_policy, SubmissionPolicy::Optimistic);
    // set in file and env
    assert_eq!(config.webhook_url.as_str(), "https://env.example.com/hook");
    assert_eq!(config.identity_url.as_str(), "https://env.example.com/ip");
    // set in file only
    assert_eq!(config.identity_field, "origin");
    // set nowhere
    assert_eq!(config.policy_message, DEFAULT_POLICY_MESSAGE);
}

#[test]
fn empty_overrides_leave_settings_untouched() {
    let mut settings = complete_settings();
    apply_overrides(&mut settings, &Overrides::default());
    assert_eq!(settings, complete_settings());
}

#[test]
fn resolve_reports_missing_required_values() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("register_absent_{suffix}.toml"));

    let err = resolve(&path, &Overrides::default(), |_| None).expect_err("nothing configured");
    assert!(format!("{err:#}").contains("office_address"));
}
