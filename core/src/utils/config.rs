use crate::contracts::CoreError;
use serde::Deserialize;

/// # NDOC
/// component: `utils::config`
/// purpose: Typed configuration surface covering every key enumerated for
///   the external interfaces, loaded from an optional TOML file overlaid by
///   `LEADLOOP_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_polling_interval_minutes")]
    pub interval_minutes: u64,
}

fn default_true() -> bool {
    true
}

fn default_polling_interval_minutes() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationConfig {
    #[serde(default = "default_cycle_hours")]
    pub cycle_hours: u64,
    #[serde(default = "default_min_improvement_pct")]
    pub min_improvement_pct: f64,
    #[serde(default = "default_testing_days")]
    pub testing_days_default: u32,
}

fn default_cycle_hours() -> u64 {
    6
}

fn default_min_improvement_pct() -> f64 {
    5.0
}

fn default_testing_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_error_rate_threshold")]
    pub error_rate_threshold: f64,
    #[serde(default = "default_critical_per_hour")]
    pub critical_per_hour: u32,
    #[serde(default = "default_cb_trips_per_hour")]
    pub cb_trips_per_hour: u32,
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u64,
}

fn default_error_rate_threshold() -> f64 {
    10.0
}

fn default_critical_per_hour() -> u32 {
    5
}

fn default_cb_trips_per_hour() -> u32 {
    3
}

fn default_cooldown_minutes() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub port: u16,
    pub secret: String,
}

/// Opaque source credentials. The core never interprets these values; they
/// are handed verbatim to the external pollers/adapters that need them.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SourceCredentials {
    #[serde(default)]
    pub gmail_oauth_token: Option<String>,
    #[serde(default)]
    pub meta_app_secret: Option<String>,
    #[serde(default)]
    pub meta_verify_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default = "PollingConfig::default")]
    pub polling: PollingConfig,
    #[serde(default = "OptimizationConfig::default")]
    pub optimization: OptimizationConfig,
    #[serde(default = "AlertsConfig::default")]
    pub alerts: AlertsConfig,
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub sources: SourceCredentials,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_minutes: default_polling_interval_minutes(),
        }
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            cycle_hours: default_cycle_hours(),
            min_improvement_pct: default_min_improvement_pct(),
            testing_days_default: default_testing_days(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            error_rate_threshold: default_error_rate_threshold(),
            critical_per_hour: default_critical_per_hour(),
            cb_trips_per_hour: default_cb_trips_per_hour(),
            cooldown_minutes: default_cooldown_minutes(),
        }
    }
}

impl Config {
    /// Loads configuration from an optional TOML file, overlaid by
    /// `LEADLOOP_`-prefixed environment variables (e.g.
    /// `LEADLOOP_DATABASE__HOST`). Returns `CoreError::validation` on
    /// missing required fields or malformed values — the caller treats this
    /// as a fatal init failure (exit code 1).
    pub fn load(toml_path: Option<&str>) -> Result<Self, CoreError> {
        let mut builder = config::Config::builder();
        if let Some(path) = toml_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("LEADLOOP")
                .separator("__")
                .try_parsing(true),
        );
        let built = builder
            .build()
            .map_err(|e| CoreError::validation(format!("config load failed: {e}")))?;
        built
            .try_deserialize()
            .map_err(|e| CoreError::validation(format!("config shape invalid: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polling_defaults_match_spec() {
        let polling = PollingConfig::default();
        assert!(polling.enabled);
        assert_eq!(polling.interval_minutes, 5);
    }

    #[test]
    fn optimization_defaults_match_spec() {
        let opt = OptimizationConfig::default();
        assert_eq!(opt.cycle_hours, 6);
        assert_eq!(opt.min_improvement_pct, 5.0);
        assert_eq!(opt.testing_days_default, 7);
    }

    #[test]
    fn missing_required_database_config_fails_to_load() {
        std::env::remove_var("LEADLOOP_DATABASE__HOST");
        let result = Config::load(Some("/nonexistent/config-that-does-not-exist"));
        assert!(result.is_err());
    }
}
