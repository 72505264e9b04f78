//! Dashboard configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `PROBEWATCH_*` environment variables (nested keys use
//! `__`, e.g. `PROBEWATCH_API__URL`). Command-line flags are applied last
//! by the binary through [`DashboardConfig::apply_overrides`].

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::format::parse_duration;
use crate::data::Thresholds;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "probewatch.toml";

const ENV_PREFIX: &str = "PROBEWATCH";

/// Shortest refresh interval accepted.
const MIN_REFRESH: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL every API path is joined onto.
    pub url: String,
    /// Bearer token for the admin endpoints.
    pub token: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/api".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Name shown in the header.
    pub system_name: String,
    /// Refetch interval as a duration string ("30s", "1m").
    pub refresh: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            system_name: "Probewatch".to_string(),
            refresh: "30s".to_string(),
        }
    }
}

/// Resolved configuration, passed explicitly to the app and renderers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api: ApiSettings,
    pub dashboard: DashboardSettings,
    pub thresholds: Thresholds,
}

impl DashboardConfig {
    /// Load from `path` (required) or from [`DEFAULT_CONFIG_FILE`] if it exists,
    /// layered under the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Self = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn apply_overrides(
        &mut self,
        url: Option<String>,
        token: Option<String>,
        refresh: Option<String>,
    ) -> Result<()> {
        if let Some(url) = url {
            self.api.url = url;
        }
        if token.is_some() {
            self.api.token = token;
        }
        if let Some(refresh) = refresh {
            self.dashboard.refresh = refresh;
        }
        self.validate()
    }

    /// Parsed refetch interval.
    pub fn refresh_interval(&self) -> Result<Duration> {
        parse_duration(&self.dashboard.refresh)
            .with_context(|| format!("Invalid refresh interval: {}", self.dashboard.refresh))
    }

    fn validate(&self) -> Result<()> {
        let refresh = self.refresh_interval()?;
        if refresh < MIN_REFRESH {
            bail!("Refresh interval must be at least 1s, got {}", self.dashboard.refresh);
        }
        if self.api.url.trim().is_empty() {
            bail!("api.url must not be empty");
        }
        let t = &self.thresholds;
        if t.uptime_critical > t.uptime_warning {
            bail!(
                "thresholds.uptime_critical ({}) must not exceed thresholds.uptime_warning ({})",
                t.uptime_critical,
                t.uptime_warning
            );
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
