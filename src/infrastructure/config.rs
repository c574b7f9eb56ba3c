use crate::domain::sample::{ChartKind, TimeRange};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub sampler: SamplerSettings,
    #[serde(default)]
    pub live: LiveSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RenderSettings {
    pub refresh_hz: u32,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub device_pixel_ratio: f64,
    pub cell_size: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            refresh_hz: 60,
            canvas_width: 800.0,
            canvas_height: 400.0,
            device_pixel_ratio: 1.0,
            cell_size: 10.0,
        }
    }
}

impl RenderSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.refresh_hz.max(1)))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SamplerSettings {
    pub interval_ms: u64,
    pub history_size: usize,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            history_size: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LiveSettings {
    pub enabled: bool,
    pub chart_type: ChartKind,
    pub count: usize,
    pub time_range: TimeRange,
    pub auto_refresh_ms: u64,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            chart_type: ChartKind::Line,
            count: 1000,
            time_range: TimeRange::OneDay,
            auto_refresh_ms: 1000,
        }
    }
}

/// Load `config/dashboard.toml` (optional) overlaid with `DASHBOARD__*`
/// environment variables, e.g. `DASHBOARD__SERVER__BIND=127.0.0.1:9000`.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
