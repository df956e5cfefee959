// Device domain models as returned by the device-management backend
use super::telemetry::TelemetryRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Entry of the backend's device listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceListing {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub device: DeviceOwner,
    #[serde(default)]
    pub actuators: BTreeMap<String, Value>,
    #[serde(default)]
    pub sensors: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceOwner {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
    pub user_id: Option<String>,
    pub sensor_count: usize,
    pub actuator_count: usize,
}

impl From<DeviceListing> for DeviceSummary {
    fn from(listing: DeviceListing) -> Self {
        Self {
            name: display_name(listing.device.name.as_deref(), "Unnamed Device"),
            id: listing.id,
            user_id: listing.device.user_id,
            sensor_count: listing.sensors.len(),
            actuator_count: listing.actuators.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    #[serde(default)]
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub device: DeviceInfo,
    #[serde(default)]
    pub sensors: BTreeMap<String, bool>,
    #[serde(default)]
    pub update_interval: Option<u64>,
}

/// Full device document, including its control block and recent telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDetail {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub config: DeviceConfig,
    #[serde(default)]
    pub control: BTreeMap<String, ActuatorState>,
    #[serde(default)]
    pub telemetry_history: Vec<TelemetryRecord>,
}

impl DeviceDetail {
    /// Identifier used for control and delete calls
    pub fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.config.id.as_deref())
    }

    pub fn name(&self) -> String {
        display_name(self.config.device.name.as_deref(), "Unknown Device")
    }

    /// Newest telemetry record; the backend returns history newest first
    pub fn latest_telemetry(&self) -> Option<&TelemetryRecord> {
        self.telemetry_history.first()
    }

    pub fn actuator(&self, key: &str) -> ActuatorState {
        self.control.get(key).copied().unwrap_or_default()
    }
}

fn display_name(name: Option<&str>, fallback: &str) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => fallback.to_string(),
    }
}
