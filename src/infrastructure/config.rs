use anyhow::{Context, ensure};
use chrono::FixedOffset;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config/blemap";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserEntry {
    pub username: String,
    pub password: String,
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
            port: 5555,
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceSettings {
    pub address: String,
    pub endpoint: String,
    pub value_field: String,
    pub timeout_secs: u64,
    pub device_ids: Vec<u32>,
    pub fetch_concurrency: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:5000".to_string(),
            endpoint: "/database/export_data?id={id}&after={after}&before={before}".to_string(),
            value_field: "close".to_string(),
            timeout_secs: 5,
            device_ids: (1..=100).collect(),
            fetch_concurrency: 8,
        }
    }
}

impl SourceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingSettings {
    pub window_minutes: i64,
    pub interval_secs: u64,
    pub utc_offset_hours: i32,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            window_minutes: 10,
            interval_secs: 10,
            utc_offset_hours: 9,
        }
    }
}

impl PollingSettings {
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.window_minutes)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .with_context(|| format!("invalid utc_offset_hours {}", self.utc_offset_hours))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapSettings {
    pub title: String,
    pub scale_max: f64,
    pub marker_radius: u32,
    pub fill_opacity: f64,
    pub refresh_secs: u64,
    pub tile_url: String,
    pub tile_subdomains: String,
    pub tile_span: u32,
    pub attribution: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            title: "BLE sensors map".to_string(),
            scale_max: 80.0,
            marker_radius: 25,
            fill_opacity: 0.85,
            refresh_secs: 10,
            tile_url: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png".to_string(),
            tile_subdomains: "abcd".to_string(),
            tile_span: 4,
            attribution: "&copy; OpenStreetMap contributors &copy; CARTO".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub map_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            map_path: PathBuf::from("map/map.html"),
        }
    }
}

/// Load the config file (TOML) and apply `BLEMAP__SECTION__KEY` overrides.
pub fn load_app_config(path: &str) -> anyhow::Result<AppConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(
            config::Environment::with_prefix("BLEMAP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    build_app_config(builder)
}

fn build_app_config(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> anyhow::Result<AppConfig> {
    let settings = builder.build().context("failed to read configuration")?;
    let app_config: AppConfig = settings
        .try_deserialize()
        .context("failed to parse configuration")?;
    app_config.validate()?;
    Ok(app_config)
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.source.device_ids.is_empty(), "source.device_ids must not be empty");
        ensure!(!self.source.value_field.is_empty(), "source.value_field must not be empty");
        ensure!(self.source.fetch_concurrency > 0, "source.fetch_concurrency must be positive");
        ensure!(self.source.timeout_secs > 0, "source.timeout_secs must be positive");
        ensure!(
            self.map.scale_max.is_finite() && self.map.scale_max > 0.0,
            "map.scale_max must be a positive number"
        );
        ensure!(
            (0.0..=1.0).contains(&self.map.fill_opacity),
            "map.fill_opacity must be within 0..=1"
        );
        ensure!(self.polling.window_minutes > 0, "polling.window_minutes must be positive");
        ensure!(self.polling.interval_secs > 0, "polling.interval_secs must be positive");
        self.polling.offset()?;
        Ok(())
    }
}

/// Replace `{key}` placeholders in a URL template
pub fn fill_template(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("{{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}
