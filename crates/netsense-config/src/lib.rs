//! Configuration for netsense.
//!
//! A TOML file merged over built-in defaults and `NETSENSE_` environment
//! variables, then validated into `netsense_core::SourceConfig`. The core
//! crate never reads files itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use netsense_api::platform::SamplingRate;
use netsense_core::config::{
    DEFAULT_LATENCY_HOST, DEFAULT_QUICK_TEST_URL, DEFAULT_SPEED_TEST_URLS, NOMINAL_PAYLOAD_BYTES,
};
use netsense_core::{SensorConfig, SourceConfig, SpeedTestConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub speed_test: SpeedTestSettings,

    #[serde(default)]
    pub sensors: SensorSettings,

    #[serde(default)]
    pub platform: PlatformSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpeedTestSettings {
    /// Download targets for the full test, probed in order.
    #[serde(default = "default_urls")]
    pub urls: Vec<String>,

    /// Target for the quick probe folded into network info.
    #[serde(default = "default_quick_url")]
    pub quick_url: String,

    #[serde(default = "default_latency_host")]
    pub latency_host: String,

    #[serde(default = "default_latency_port")]
    pub latency_port: u16,

    #[serde(default = "default_latency_timeout")]
    pub latency_timeout_secs: u64,

    /// Idle time allowed between body reads before a probe is dropped.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Byte count assumed when converting probe time to Mbps.
    #[serde(default = "default_payload")]
    pub nominal_payload_bytes: u64,
}

impl Default for SpeedTestSettings {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            quick_url: default_quick_url(),
            latency_host: default_latency_host(),
            latency_port: default_latency_port(),
            latency_timeout_secs: default_latency_timeout(),
            read_timeout_secs: default_read_timeout(),
            nominal_payload_bytes: default_payload(),
        }
    }
}

fn default_urls() -> Vec<String> {
    DEFAULT_SPEED_TEST_URLS.iter().map(|u| (*u).to_owned()).collect()
}
fn default_quick_url() -> String {
    DEFAULT_QUICK_TEST_URL.into()
}
fn default_latency_host() -> String {
    DEFAULT_LATENCY_HOST.into()
}
fn default_latency_port() -> u16 {
    53
}
fn default_latency_timeout() -> u64 {
    5
}
fn default_read_timeout() -> u64 {
    30
}
fn default_payload() -> u64 {
    NOMINAL_PAYLOAD_BYTES
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SensorSettings {
    /// One of "fastest", "game", "ui", "normal".
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: String,

    #[serde(default = "default_location_interval")]
    pub location_interval_ms: u64,

    #[serde(default = "default_location_distance")]
    pub location_distance_m: f32,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            sampling_rate: default_sampling_rate(),
            location_interval_ms: default_location_interval(),
            location_distance_m: default_location_distance(),
        }
    }
}

fn default_sampling_rate() -> String {
    "normal".into()
}
fn default_location_interval() -> u64 {
    1000
}
fn default_location_distance() -> f32 {
    1.0
}

/// Which platform services back the telemetry sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Host services where available, otherwise simulated.
    #[default]
    Auto,
    Linux,
    Simulated,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Linux => "linux",
            Self::Simulated => "simulated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlatformSettings {
    #[serde(default)]
    pub backend: Backend,

    /// Filesystem root for sysfs/procfs reads. Only useful for testing.
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            sysfs_root: default_sysfs_root(),
        }
    }
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/")
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "netsense", "netsense").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netsense");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETSENSE_").split("__"))
}

/// Load config from `path` (or the canonical path) plus environment.
/// A missing file is not an error; defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    debug!(path = %path.display(), "loading config");
    let config: Config = figment_for(&path).extract()?;
    Ok(config)
}

/// Load config, returning a default on any failure.
pub fn load_config_or_default(path: Option<&Path>) -> Config {
    load_config(path).unwrap_or_default()
}

/// Parse a TOML document over the defaults, ignoring the environment.
pub fn from_toml_str(toml_str: &str) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml_str))
        .extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path` (or the canonical path).
pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(path)
}

// ── Translation ─────────────────────────────────────────────────────

/// Map a sampling-rate name onto the platform delay class.
pub fn parse_sampling_rate(name: &str) -> Result<SamplingRate, ConfigError> {
    match name.to_ascii_lowercase().as_str() {
        "fastest" => Ok(SamplingRate::Fastest),
        "game" => Ok(SamplingRate::Game),
        "ui" => Ok(SamplingRate::Ui),
        "normal" => Ok(SamplingRate::Normal),
        other => Err(invalid(
            "sensors.sampling_rate",
            format!("expected 'fastest', 'game', 'ui', or 'normal', got '{other}'"),
        )),
    }
}

fn check_url(field: &str, raw: &str) -> Result<(), ConfigError> {
    let url: url::Url = raw
        .parse()
        .map_err(|_| invalid(field, format!("invalid URL: {raw}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field, format!("unsupported scheme '{scheme}' in {raw}"))),
    }
}

fn nonzero_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(invalid(field, "must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

impl Config {
    /// Validate and build the runtime configuration for the sources.
    pub fn to_source_config(&self) -> Result<SourceConfig, ConfigError> {
        let st = &self.speed_test;
        if st.urls.is_empty() {
            return Err(invalid("speed_test.urls", "at least one URL is required"));
        }
        for url in &st.urls {
            check_url("speed_test.urls", url)?;
        }
        check_url("speed_test.quick_url", &st.quick_url)?;
        if st.latency_host.trim().is_empty() {
            return Err(invalid("speed_test.latency_host", "must not be empty"));
        }
        if st.nominal_payload_bytes == 0 {
            return Err(invalid("speed_test.nominal_payload_bytes", "must be greater than zero"));
        }

        let latency_timeout =
            nonzero_secs("speed_test.latency_timeout_secs", st.latency_timeout_secs)?;
        let read_timeout =
            nonzero_secs("speed_test.read_timeout_secs", st.read_timeout_secs)?;

        let sensors = &self.sensors;
        if !sensors.location_distance_m.is_finite() || sensors.location_distance_m < 0.0 {
            return Err(invalid("sensors.location_distance_m", "must be a non-negative number"));
        }

        Ok(SourceConfig {
            speed_test: SpeedTestConfig {
                urls: st.urls.clone(),
                quick_url: st.quick_url.clone(),
                latency_host: st.latency_host.clone(),
                latency_port: st.latency_port,
                latency_timeout,
                read_timeout,
                nominal_payload_bytes: st.nominal_payload_bytes,
            },
            sensors: SensorConfig {
                sampling_rate: parse_sampling_rate(&sensors.sampling_rate)?,
                location_interval: Duration::from_millis(sensors.location_interval_ms),
                location_min_distance_m: sensors.location_distance_m,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_translate_to_source_defaults() {
        let source = Config::default().to_source_config().unwrap();
        assert_eq!(source, SourceConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = from_toml_str(
            r#"
            [speed_test]
            latency_host = "1.1.1.1"

            [sensors]
            sampling_rate = "game"

            [platform]
            backend = "simulated"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.speed_test.latency_host, "1.1.1.1");
        assert_eq!(cfg.speed_test.urls.len(), 3);
        assert_eq!(cfg.platform.backend, Backend::Simulated);

        let source = cfg.to_source_config().unwrap();
        assert_eq!(source.sensors.sampling_rate, SamplingRate::Game);
        assert_eq!(source.speed_test.latency_port, 53);
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.speed_test.urls = vec!["ftp://example.com/file".into()];
        assert!(matches!(
            cfg.to_source_config(),
            Err(ConfigError::Validation { field, .. }) if field == "speed_test.urls"
        ));

        let mut cfg = Config::default();
        cfg.speed_test.read_timeout_secs = 0;
        assert!(cfg.to_source_config().is_err());

        let mut cfg = Config::default();
        cfg.sensors.sampling_rate = "turbo".into();
        let err = cfg.to_source_config().unwrap_err();
        assert!(err.to_string().contains("turbo"));

        let mut cfg = Config::default();
        cfg.speed_test.urls.clear();
        assert!(cfg.to_source_config().is_err());
    }

    #[test]
    fn unknown_backend_fails_to_load() {
        let err = from_toml_str("[platform]\nbackend = \"android\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
    }

    #[test]
    fn save_then_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.speed_test.latency_port = 443;
        cfg.sensors.location_interval_ms = 250;
        let written = save_config(&cfg, Some(&path)).unwrap();
        assert_eq!(written, path);

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.speed_test.latency_port, 443);
        assert_eq!(loaded.sensors.location_interval_ms, 250);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_or_default(Some(&dir.path().join("absent.toml")));
        assert_eq!(cfg.platform.backend, Backend::Auto);
    }
}
