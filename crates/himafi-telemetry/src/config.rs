//! Telemetry configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Run mode, mirroring the site's development/production split.
///
/// Development prints records to the console immediately and suppresses
/// network delivery; production delivers over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Whether telemetry is enabled (default: true, opt-out model)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Debug mode - print payloads instead of sending (default: false)
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub run_mode: RunMode,

    /// Endpoint for error batches and single log lines
    #[serde(default = "default_logs_url")]
    pub logs_url: String,

    /// Endpoint for analytics events
    #[serde(default = "default_analytics_url")]
    pub analytics_url: String,

    /// Maximum records per error flush
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Flush age threshold for a non-empty queue
    #[serde(default = "default_batch_timeout_ms")]
    pub batch_timeout_ms: u64,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Delivery attempts per batch before it is dead-lettered
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay; doubles per failed attempt
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debug: false,
            run_mode: RunMode::Production,
            logs_url: default_logs_url(),
            analytics_url: default_analytics_url(),
            batch_size: default_batch_size(),
            batch_timeout_ms: default_batch_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl TelemetryConfig {
    pub fn is_development(&self) -> bool {
        self.run_mode == RunMode::Development
    }
}

fn default_enabled() -> bool {
    true
}

fn default_logs_url() -> String {
    "http://localhost:3000/api/logs".to_string()
}

fn default_analytics_url() -> String {
    "http://localhost:3000/api/analytics".to_string()
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_timeout_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

/// Partial `[telemetry]` section as read from one config file. Only the
/// fields actually present override earlier layers.
#[derive(Debug, Default, Deserialize)]
struct TelemetryPatch {
    enabled: Option<bool>,
    debug: Option<bool>,
    run_mode: Option<RunMode>,
    logs_url: Option<String>,
    analytics_url: Option<String>,
    batch_size: Option<usize>,
    batch_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    max_retries: Option<u32>,
    retry_base_delay_ms: Option<u64>,
}

/// Load telemetry configuration with precedence:
/// 1. Environment variables (highest priority)
/// 2. Local config (.himafi/config.local.toml)
/// 3. Project config (.himafi/config.toml)
/// 4. User config (~/.himafi/config.toml)
/// 5. Defaults (enabled=true, production)
pub fn load_telemetry_config() -> Result<TelemetryConfig> {
    let mut config = TelemetryConfig::default();

    // Load from user config
    if let Some(home_dir) = dirs::home_dir() {
        let user_config = home_dir.join(".himafi/config.toml");
        if user_config.exists() {
            if let Ok(patch) = load_patch_from_file(&user_config) {
                apply_patch(&mut config, patch);
            }
        }
    }

    // Load from project config
    let project_config = PathBuf::from(".himafi/config.toml");
    if project_config.exists() {
        if let Ok(patch) = load_patch_from_file(&project_config) {
            apply_patch(&mut config, patch);
        }
    }

    // Load from local config
    let local_config = PathBuf::from(".himafi/config.local.toml");
    if local_config.exists() {
        if let Ok(patch) = load_patch_from_file(&local_config) {
            apply_patch(&mut config, patch);
        }
    }

    // Apply environment variable overrides
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Read the `[telemetry]` section of a TOML config file
fn load_patch_from_file(path: &PathBuf) -> Result<TelemetryPatch> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;

    // Parse the full config to extract the telemetry section
    #[derive(Deserialize)]
    struct FullConfig {
        #[serde(default)]
        telemetry: Option<TelemetryPatch>,
    }

    let full_config: FullConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;

    Ok(full_config.telemetry.unwrap_or_default())
}

/// Apply the fields a later layer actually set
fn apply_patch(base: &mut TelemetryConfig, patch: TelemetryPatch) {
    if let Some(enabled) = patch.enabled {
        base.enabled = enabled;
    }
    if let Some(debug) = patch.debug {
        base.debug = debug;
    }
    if let Some(run_mode) = patch.run_mode {
        base.run_mode = run_mode;
    }
    if let Some(logs_url) = patch.logs_url {
        base.logs_url = logs_url;
    }
    if let Some(analytics_url) = patch.analytics_url {
        base.analytics_url = analytics_url;
    }
    if let Some(batch_size) = patch.batch_size {
        base.batch_size = batch_size;
    }
    if let Some(batch_timeout_ms) = patch.batch_timeout_ms {
        base.batch_timeout_ms = batch_timeout_ms;
    }
    if let Some(request_timeout_ms) = patch.request_timeout_ms {
        base.request_timeout_ms = request_timeout_ms;
    }
    if let Some(max_retries) = patch.max_retries {
        base.max_retries = max_retries;
    }
    if let Some(retry_base_delay_ms) = patch.retry_base_delay_ms {
        base.retry_base_delay_ms = retry_base_delay_ms;
    }
}

/// Apply environment variable overrides
fn apply_env_overrides(config: &mut TelemetryConfig) {
    // HIMAFI_ENV selects the run mode before the kill switches are checked,
    // so a disabled config still reports the right mode.
    if let Ok(mode) = env::var("HIMAFI_ENV") {
        if mode.eq_ignore_ascii_case("development") {
            config.run_mode = RunMode::Development;
        } else if mode.eq_ignore_ascii_case("production") {
            config.run_mode = RunMode::Production;
        }
    }

    // HIMAFI_TELEMETRY_DISABLED=1 disables telemetry
    if env::var("HIMAFI_TELEMETRY_DISABLED").is_ok() {
        config.enabled = false;
        return;
    }

    // DO_NOT_TRACK=1 (universal opt-out)
    if env::var("DO_NOT_TRACK").is_ok() {
        config.enabled = false;
        return;
    }

    // HIMAFI_TELEMETRY_DEBUG=1 enables debug mode
    if env::var("HIMAFI_TELEMETRY_DEBUG").is_ok() {
        config.debug = true;
    }

    // Auto-disable in CI unless explicitly enabled
    if is_ci() && env::var("HIMAFI_TELEMETRY_IN_CI").is_err() {
        config.enabled = false;
    }
}

/// Check if running in a CI environment
fn is_ci() -> bool {
    env::var("CI").is_ok()
        || env::var("CONTINUOUS_INTEGRATION").is_ok()
        || env::var("GITHUB_ACTIONS").is_ok()
        || env::var("GITLAB_CI").is_ok()
        || env::var("CIRCLECI").is_ok()
        || env::var("TRAVIS").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert!(config.enabled);
        assert!(!config.debug);
        assert_eq!(config.run_mode, RunMode::Production);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.batch_timeout_ms, 5_000);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    #[serial]
    fn test_env_var_disables_telemetry() {
        let original = env::var("HIMAFI_TELEMETRY_DISABLED").ok();

        env::set_var("HIMAFI_TELEMETRY_DISABLED", "1");
        let mut config = TelemetryConfig::default();
        apply_env_overrides(&mut config);
        assert!(!config.enabled);

        env::remove_var("HIMAFI_TELEMETRY_DISABLED");
        if let Some(val) = original {
            env::set_var("HIMAFI_TELEMETRY_DISABLED", val);
        }
    }

    #[test]
    #[serial]
    fn test_do_not_track_disables_telemetry() {
        let original = env::var("DO_NOT_TRACK").ok();

        env::set_var("DO_NOT_TRACK", "1");
        let mut config = TelemetryConfig::default();
        apply_env_overrides(&mut config);
        assert!(!config.enabled);

        env::remove_var("DO_NOT_TRACK");
        if let Some(val) = original {
            env::set_var("DO_NOT_TRACK", val);
        }
    }

    #[test]
    #[serial]
    fn test_himafi_env_selects_run_mode() {
        let original = env::var("HIMAFI_ENV").ok();

        env::set_var("HIMAFI_ENV", "development");
        let mut config = TelemetryConfig::default();
        apply_env_overrides(&mut config);
        assert_eq!(config.run_mode, RunMode::Development);

        env::set_var("HIMAFI_ENV", "production");
        let mut config = TelemetryConfig::default();
        apply_env_overrides(&mut config);
        assert_eq!(config.run_mode, RunMode::Production);

        env::remove_var("HIMAFI_ENV");
        if let Some(val) = original {
            env::set_var("HIMAFI_ENV", val);
        }
    }

    #[test]
    #[serial]
    fn test_debug_mode_from_env() {
        let original = env::var("HIMAFI_TELEMETRY_DEBUG").ok();

        env::set_var("HIMAFI_TELEMETRY_DEBUG", "1");
        let mut config = TelemetryConfig::default();
        apply_env_overrides(&mut config);
        assert!(config.debug);

        env::remove_var("HIMAFI_TELEMETRY_DEBUG");
        if let Some(val) = original {
            env::set_var("HIMAFI_TELEMETRY_DEBUG", val);
        }
    }

    #[test]
    #[serial]
    fn test_ci_auto_disables_telemetry() {
        let original_ci = env::var("CI").ok();
        let original_telemetry = env::var("HIMAFI_TELEMETRY_IN_CI").ok();

        env::set_var("CI", "true");
        env::remove_var("HIMAFI_TELEMETRY_IN_CI");

        let mut config = TelemetryConfig::default();
        apply_env_overrides(&mut config);
        assert!(!config.enabled);

        env::remove_var("CI");
        if let Some(val) = original_ci {
            env::set_var("CI", val);
        }
        if let Some(val) = original_telemetry {
            env::set_var("HIMAFI_TELEMETRY_IN_CI", val);
        }
    }

    #[test]
    fn test_patch_only_overrides_present_fields() {
        let mut base = TelemetryConfig::default();
        base.logs_url = "https://collector.example/logs".to_string();

        let patch = TelemetryPatch {
            enabled: Some(false),
            batch_size: Some(25),
            ..Default::default()
        };
        apply_patch(&mut base, patch);

        assert!(!base.enabled);
        assert_eq!(base.batch_size, 25);
        // Untouched fields survive the merge.
        assert_eq!(base.logs_url, "https://collector.example/logs");
        assert_eq!(base.batch_timeout_ms, 5_000);
    }

    #[test]
    #[serial]
    fn test_load_patch_from_file_with_telemetry_section() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        fs::write(
            &config_file,
            r#"
[telemetry]
enabled = false
debug = true
run_mode = "development"
batch_size = 5
"#,
        )
        .unwrap();

        let patch = load_patch_from_file(&config_file).unwrap();
        assert_eq!(patch.enabled, Some(false));
        assert_eq!(patch.debug, Some(true));
        assert_eq!(patch.run_mode, Some(RunMode::Development));
        assert_eq!(patch.batch_size, Some(5));
        assert!(patch.logs_url.is_none());
    }

    #[test]
    #[serial]
    fn test_load_patch_from_file_without_telemetry_section() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        fs::write(
            &config_file,
            r#"
[site]
name = "himafi"
"#,
        )
        .unwrap();

        let patch = load_patch_from_file(&config_file).unwrap();
        assert!(patch.enabled.is_none());
        assert!(patch.run_mode.is_none());
    }
}
