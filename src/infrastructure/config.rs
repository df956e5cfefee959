use crate::domain::series::TimeWindow;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub chart: ChartConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Used when the caller brings no token of its own
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub endpoints: EndpointsConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            token: None,
            timeout_secs: 8,
            endpoints: EndpointsConfig::default(),
        }
    }
}

/// Backend paths; `${id}` is replaced with the url-encoded resource id
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EndpointsConfig {
    pub devices: String,
    pub device: String,
    pub telemetry: String,
    pub control: String,
    pub users: String,
    pub user: String,
    pub schedules: String,
    pub schedule: String,
    pub stats: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            devices: "/api/admin/devices".to_string(),
            device: "/api/admin/devices/${id}".to_string(),
            telemetry: "/api/admin/devices/${id}/telemetry".to_string(),
            control: "/api/admin/devices/${id}/control".to_string(),
            users: "/api/admin/users".to_string(),
            user: "/api/admin/users/${id}".to_string(),
            schedules: "/api/admin/schedules".to_string(),
            schedule: "/api/admin/schedules/${id}".to_string(),
            stats: "/api/admin/stats".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartConfig {
    /// Records requested from the backend per chart
    pub telemetry_limit: usize,
    /// Downsample above this many points; 0 disables downsampling
    pub max_points: usize,
    pub utc_offset_minutes: i32,
    pub default_window: TimeWindow,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            telemetry_limit: 500,
            max_points: 150,
            utc_offset_minutes: 0,
            default_window: TimeWindow::OneHour,
        }
    }
}

/// Load `config/dashboard.*` (optional) overlaid with `DASHBOARD__*` env vars
pub fn load_config() -> anyhow::Result<AppConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"));

    build_config(builder)
}

fn build_config(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<AppConfig> {
    let settings = builder.build()?;
    Ok(settings.try_deserialize()?)
}

/// Replace template variables in an endpoint path
pub fn prepare_endpoint(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, &urlencoding::encode(value));
    }
    result
}
