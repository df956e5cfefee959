// Device service - Use cases for listing, inspecting and controlling devices
use crate::application::device_repository::{DeviceRepository, Session};
use crate::application::error::{RepositoryError, Result};
use crate::domain::device::{ActuatorState, DeviceDetail, DeviceSummary};
use crate::domain::sensor::{SensorReading, sensor_readings};
use serde::Serialize;
use std::sync::Arc;

/// A device together with the tiles for its latest reading
#[derive(Debug, Clone, Serialize)]
pub struct DeviceOverview {
    pub name: String,
    pub device: DeviceDetail,
    pub sensors: Vec<SensorReading>,
}

#[derive(Clone)]
pub struct DeviceService {
    repository: Arc<dyn DeviceRepository>,
}

impl DeviceService {
    pub fn new(repository: Arc<dyn DeviceRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_devices(&self, session: &Session) -> Result<Vec<DeviceSummary>> {
        let devices = self.repository.list_devices(session).await?;
        Ok(devices.into_iter().map(DeviceSummary::from).collect())
    }

    pub async fn device_overview(&self, session: &Session, device_id: &str) -> Result<DeviceOverview> {
        let device = self.load_device(session, device_id).await?;
        let sensors = device
            .latest_telemetry()
            .map(sensor_readings)
            .unwrap_or_default();

        Ok(DeviceOverview {
            name: device.name(),
            device,
            sensors,
        })
    }

    /// Flip an actuator and return its new state
    pub async fn toggle_actuator(
        &self,
        session: &Session,
        device_id: &str,
        actuator: &str,
    ) -> Result<ActuatorState> {
        let device = self.load_device(session, device_id).await?;
        let mut state = device.actuator(actuator);
        state.status = !state.status;

        let target = device.key().unwrap_or(device_id);
        self.repository
            .set_actuator(session, target, actuator, state.status)
            .await?;

        tracing::info!(
            "Toggled {} to {} for device {}",
            actuator,
            state.status,
            target
        );
        Ok(state)
    }

    pub async fn delete_device(&self, session: &Session, device_id: &str) -> Result<()> {
        self.repository.delete_device(session, device_id).await?;
        tracing::info!("Deleted device {}", device_id);
        Ok(())
    }

    async fn load_device(&self, session: &Session, device_id: &str) -> Result<DeviceDetail> {
        self.repository
            .get_device(session, device_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(format!("device {}", device_id)))
    }
}
