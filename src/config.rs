use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Donor Dashboard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base URL of the platform serving `/api/patients/{id}/`.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// How long a notification stays before the auto-dismiss timer fires.
pub const NOTIFICATION_DISMISS_MS: u64 = 5000;

/// Fade-out transition before a dismissed message leaves the tree.
pub const FADE_OUT_MS: u64 = 300;

/// Request timeout for the patient detail endpoint.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Currency shown next to treatment cost estimates.
pub const CURRENCY: &str = "TZS";

const ENV_API_BASE: &str = "DONOR_DASHBOARD_API_BASE";
const ENV_TIMEOUT_SECS: &str = "DONOR_DASHBOARD_TIMEOUT_SECS";
const ENV_NOTIFY_MS: &str = "DONOR_DASHBOARD_NOTIFY_MS";
const ENV_CLAMP_PROGRESS: &str = "DONOR_DASHBOARD_CLAMP_PROGRESS";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "donor_dashboard_lib=debug,donor_dashboard=debug,warn"
    } else {
        "donor_dashboard_lib=info,donor_dashboard=info,warn"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime settings for the dashboard client.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub api_base: String,
    pub request_timeout: Duration,
    pub notification_delay: Duration,
    pub fade_out: Duration,
    /// Clamp `treatment_progress` into 0..=100 before rendering.
    /// Off by default: the server value is shown as-is.
    pub clamp_progress: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            notification_delay: Duration::from_millis(NOTIFICATION_DISMISS_MS),
            fade_out: Duration::from_millis(FADE_OUT_MS),
            clamp_progress: false,
        }
    }
}

impl DashboardConfig {
    /// Build the config from `DONOR_DASHBOARD_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup(ENV_API_BASE) {
            let trimmed = base.trim().trim_end_matches('/');
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    key: ENV_API_BASE,
                    value: base,
                });
            }
            config.api_base = trimmed.to_string();
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = parse_positive(ENV_TIMEOUT_SECS, &raw)?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(ENV_NOTIFY_MS) {
            let ms = parse_positive(ENV_NOTIFY_MS, &raw)?;
            config.notification_delay = Duration::from_millis(ms);
        }

        if let Some(raw) = lookup(ENV_CLAMP_PROGRESS) {
            config.clamp_progress = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_CLAMP_PROGRESS,
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
