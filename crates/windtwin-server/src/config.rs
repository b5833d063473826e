// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of WindTwin.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use windtwin_adapters::{DEFAULT_API_VERSION, RequestShape};
use windtwin_core::{
    DEFAULT_HISTORY_LIMIT, DEFAULT_SENSOR_MODEL_ID, DEFAULT_STEP_MINUTES, DEFAULT_STEPS,
    DEFAULT_THRESHOLD_PERCENT,
};

/// Environment variable consulted when `twins.token` is not in the file
pub const TWINS_TOKEN_ENV: &str = "WINDTWIN_TWINS_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub twins: TwinsSettings,
    pub models: ModelsSettings,
    #[serde(default)]
    pub interpolation: InterpolationSettings,
    #[serde(default)]
    pub discrepancy: DiscrepancySettings,
    #[serde(default)]
    pub forecast: ForecastSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwinsSettings {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_sensor_model_id")]
    pub sensor_model_id: String,
    /// Attempts per request, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsSettings {
    pub ml: MlModelSettings,
    pub physics: PhysicsModelSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MlModelSettings {
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhysicsModelSettings {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub request_shape: RequestShape,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterpolationSettings {
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_step_minutes")]
    pub step_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscrepancySettings {
    #[serde(default = "default_threshold_percent")]
    pub threshold_percent: f64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastSettings {
    /// Forecast feed; the built-in sample day is served when unset
    #[serde(default)]
    pub url: Option<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_owned()
}

fn default_sensor_model_id() -> String {
    DEFAULT_SENSOR_MODEL_ID.to_owned()
}

fn default_max_retries() -> u32 {
    1
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_steps() -> usize {
    DEFAULT_STEPS
}

fn default_step_minutes() -> i64 {
    DEFAULT_STEP_MINUTES
}

fn default_threshold_percent() -> f64 {
    DEFAULT_THRESHOLD_PERCENT
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for InterpolationSettings {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            step_minutes: default_step_minutes(),
        }
    }
}

impl Default for DiscrepancySettings {
    fn default() -> Self {
        Self {
            threshold_percent: default_threshold_percent(),
            history_limit: default_history_limit(),
        }
    }
}

impl MlModelSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PhysicsModelSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl InterpolationSettings {
    pub fn step_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.step_minutes)
    }
}

impl ServiceConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content, std::env::var(TWINS_TOKEN_ENV).ok())
    }

    /// Parse and validate, taking the twin-store token from `env_token` when
    /// the file has none
    pub fn from_toml_str(content: &str, env_token: Option<String>) -> Result<Self> {
        let mut config: Self =
            toml::from_str(content).with_context(|| "Failed to parse config TOML")?;
        if config.twins.token.as_deref().is_none_or(str::is_empty) {
            config.twins.token = env_token;
        }
        config.validate()?;
        Ok(config)
    }

    /// Twin-store bearer token; present once the config validated
    pub fn twins_token(&self) -> &str {
        self.twins.token.as_deref().unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        if !self.twins.base_url.starts_with("http://") && !self.twins.base_url.starts_with("https://")
        {
            bail!("twins.base_url must be an http(s) URL");
        }
        if self.twins.token.as_deref().is_none_or(str::is_empty) {
            bail!("twins.token must be set in the config file or via {TWINS_TOKEN_ENV}");
        }
        if self.models.ml.url.is_empty() {
            bail!("models.ml.url must be set");
        }
        if self.models.physics.url.is_empty() {
            bail!("models.physics.url must be set");
        }
        if self.models.ml.timeout_secs == 0 || self.models.physics.timeout_secs == 0 {
            bail!("model timeouts must be at least one second");
        }
        if self.interpolation.steps == 0 {
            bail!("interpolation.steps must be at least 1");
        }
        if self.interpolation.step_minutes <= 0 {
            bail!("interpolation.step_minutes must be positive");
        }
        if !self.discrepancy.threshold_percent.is_finite() || self.discrepancy.threshold_percent <= 0.0 {
            bail!("discrepancy.threshold_percent must be a positive number");
        }
        if self.discrepancy.history_limit == 0 {
            bail!("discrepancy.history_limit must be at least 1");
        }
        Ok(())
    }
}
