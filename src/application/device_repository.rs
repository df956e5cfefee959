// Repository trait for the device-management backend
use crate::application::error::Result;
use crate::domain::device::{DeviceDetail, DeviceListing};
use crate::domain::telemetry::TelemetryRecord;
use async_trait::async_trait;

/// Bearer token forwarded to the backend on behalf of the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// List every device registered on the backend
    async fn list_devices(&self, session: &Session) -> Result<Vec<DeviceListing>>;

    /// Fetch one device; `None` when the backend does not know it
    async fn get_device(&self, session: &Session, device_id: &str)
    -> Result<Option<DeviceDetail>>;

    /// Telemetry history, newest first, capped at `limit` records
    async fn telemetry_history(
        &self,
        session: &Session,
        device_id: &str,
        limit: usize,
    ) -> Result<Vec<TelemetryRecord>>;

    /// Switch one actuator on or off
    async fn set_actuator(
        &self,
        session: &Session,
        device_id: &str,
        actuator: &str,
        status: bool,
    ) -> Result<()>;

    async fn delete_device(&self, session: &Session, device_id: &str) -> Result<()>;
}
