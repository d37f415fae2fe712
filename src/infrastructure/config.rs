use crate::domain::threshold::MetricThreshold;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub feed: FeedSettings,
    /// Overrides for the built-in threshold table
    #[serde(default)]
    pub thresholds: Vec<MetricThreshold>,
    #[serde(default)]
    pub theme: ThemeSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedSettings {
    pub enabled: bool,
    pub interval_ms: u64,
    pub channel_capacity: usize,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 2000,
            channel_capacity: 64,
            seed: None,
        }
    }
}

impl FeedSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ThemeSettings {
    pub store_path: PathBuf,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data/theme.toml"),
        }
    }
}

/// Defaults, then `config/tbm.toml` if present, then `TBM__SECTION__KEY` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_app_config_from("config/tbm")
}

pub fn load_app_config_from(file: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(file).required(false))
        .add_source(
            config::Environment::with_prefix("TBM")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let config = load_app_config_from(missing.to_str().unwrap()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.feed.enabled);
        assert_eq!(config.feed.interval(), Duration::from_secs(2));
        assert_eq!(config.feed.channel_capacity, 64);
        assert!(config.thresholds.is_empty());
        assert_eq!(config.theme.store_path, PathBuf::from("data/theme.toml"));
    }

    #[test]
    fn test_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tbm.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9090

[feed]
interval_ms = 500
seed = 7

[[thresholds]]
metric_id = "hydraulic.temp_out"
warn = 70.0
crit = 85.0
scale_max = 100.0

[[thresholds]]
metric_id = "cutting.advance_rate"
warn = 6.0
crit = 4.0
invert = true
scale_max = 12.0
"#,
        )
        .unwrap();

        let config = load_app_config_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.feed.interval_ms, 500);
        assert_eq!(config.feed.seed, Some(7));
        assert!(config.feed.enabled);

        assert_eq!(config.thresholds.len(), 2);
        assert_eq!(
            config.thresholds[0],
            MetricThreshold::new("hydraulic.temp_out", 70.0, 85.0, false, 100.0)
        );
        assert!(config.thresholds[1].invert);
    }
}
