use manage_my_queue::config::Config;
use manage_my_queue::constants::{DEFAULT_DATA_URL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_TICKS};
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.endpoints.data_url, DEFAULT_DATA_URL);
    assert_eq!(config.http.timeout_secs, 15);
    assert_eq!(config.polling.interval_ms, DEFAULT_POLL_INTERVAL_MS);
    assert_eq!(config.polling.max_ticks, DEFAULT_POLL_MAX_TICKS);
    assert_eq!(config.polling.interval(), Duration::from_secs(2));
    assert_eq!(config.countdown.duration_secs, 300);
    assert_eq!(config.countdown.refreshing_hold_secs, 2);
    assert!(config.features.show_countdown);
    assert!(!config.features.show_account_override);
    assert!(config.features.fence_loads);
    assert!(!config.logging.enabled);
    assert!(config.http.api_token.is_none());
}

#[test]
fn test_for_account() {
    let config = Config::for_account("ACC-42");
    assert_eq!(config.account, "ACC-42");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    // Timeout must stay within 10..=30 seconds
    config.http.timeout_secs = 5;
    assert!(config.validate().is_err());
    config.http.timeout_secs = 31;
    assert!(config.validate().is_err());
    config.http.timeout_secs = 30;
    assert!(config.validate().is_ok());

    config.endpoints.reorder_url = "  ".to_string();
    assert!(config.validate().is_err());
    config.endpoints.reorder_url = "http://localhost/reorder".to_string();

    config.polling.interval_ms = 0;
    assert!(config.validate().is_err());
    config.polling.interval_ms = 1000;

    config.http.retry.max_attempts = 0;
    assert!(config.validate().is_err());
    config.http.retry.max_attempts = 1;

    config.http.retry.jitter = 1.5;
    assert!(config.validate().is_err());
    config.http.retry.jitter = 0.0;

    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());
    config.logging.level = "debug".to_string();

    assert!(config.validate().is_ok());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("[endpoints]"));
    assert!(toml_str.contains("interval_ms = 2000"));
    assert!(toml_str.contains("fence_loads = true"));
}

#[test]
fn test_partial_config_deserialization() {
    // Test that partial TOML configs merge with defaults
    let partial_toml = r#"
account = "ACC-7"

[polling]
max_ticks = 3

[features]
show_account_override = true

[http]
api_token = "secret"
"#;

    let config = Config::from_toml_str(partial_toml).unwrap();

    // Check that specified values are used
    assert_eq!(config.account, "ACC-7");
    assert_eq!(config.polling.max_ticks, 3);
    assert!(config.features.show_account_override);
    assert_eq!(config.http.api_token.as_deref(), Some("secret"));

    // Check that unspecified values use defaults
    assert_eq!(config.polling.interval_ms, DEFAULT_POLL_INTERVAL_MS);
    assert!(config.features.show_countdown);
    assert!(config.features.fence_loads);
    assert_eq!(config.http.timeout_secs, 15);
    assert_eq!(config.http.retry.max_attempts, 3);
}

#[test]
fn test_invalid_toml_is_rejected() {
    assert!(Config::from_toml_str("[http]\ntimeout_secs = 2\n").is_err());
    assert!(Config::from_toml_str("account = [").is_err());
}

#[test]
fn test_generate_and_load_default_config() {
    let dir = std::env::temp_dir().join(format!("manage-my-queue-config-{}", std::process::id()));
    let path = dir.join("nested").join("config.toml");

    Config::generate_default_config(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# Manage My Queue Configuration File"));

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.polling.max_ticks, DEFAULT_POLL_MAX_TICKS);
    assert_eq!(loaded.endpoints.data_url, DEFAULT_DATA_URL);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_load_missing_file() {
    let result = Config::load_from_file("/nonexistent/manage-my-queue/config.toml");
    assert!(result.is_err());
}
