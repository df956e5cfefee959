// In-memory repository used by service tests
use crate::application::admin_repository::AdminRepository;
use crate::application::device_repository::{DeviceRepository, Session};
use crate::application::error::{RepositoryError, Result};
use crate::domain::admin::{NewUser, Schedule, Stats, User};
use crate::domain::device::{ActuatorState, DeviceDetail, DeviceListing};
use crate::domain::telemetry::TelemetryRecord;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryRepository {
    devices: Mutex<HashMap<String, DeviceDetail>>,
    history: HashMap<String, Vec<TelemetryRecord>>,
    required_token: Option<String>,
    actuator_calls: Mutex<Vec<(String, String, bool)>>,
    users: Mutex<Vec<User>>,
    schedules: Mutex<Vec<Schedule>>,
    telemetry_failure: Option<fn() -> RepositoryError>,
    stats_failure: Option<fn() -> RepositoryError>,
}

impl InMemoryRepository {
    /// One device `dev1` with a pump actuator and a short telemetry history
    pub fn with_greenhouse() -> Self {
        let detail: DeviceDetail = serde_json::from_value(json!({
            "_id": "dev1",
            "config": { "device": { "name": "Greenhouse" } },
            "control": { "pump": { "status": false } },
            "telemetry_history": [
                { "_id": "507f1f77bcf86cd799439011", "t": 23.5, "h": 60, "ts": "2024-05-01T11:50:00Z" }
            ],
        }))
        .unwrap();

        let history = vec![
            json!({ "ts": "2024-05-01T11:50:00Z", "t": 23.5, "h": 60, "rssi": -61 }),
            json!({ "ts": "2024-05-01T09:00:00Z", "t": 21.0, "h": 64, "rssi": -70 }),
            json!({ "ts": "2024-04-29T09:00:00Z", "t": 18.0, "ec": 1.4, "ph": 6.5 }),
            json!({ "deviceId": "dev1", "t": 99.0 }),
        ];

        let mut repo = Self::default();
        repo.devices
            .get_mut()
            .unwrap()
            .insert("dev1".to_string(), detail);
        repo.history.insert("dev1".to_string(), records(history));
        repo.users.get_mut().unwrap().push(User {
            id: "user1".to_string(),
            short_id: "AB12CD34".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: "admin".to_string(),
        });
        repo.schedules.get_mut().unwrap().push(Schedule {
            id: "sched1".to_string(),
            name: "Morning watering".to_string(),
            device_id: "dev1".to_string(),
            schedule: "0 6 * * *".to_string(),
            active: true,
        });
        repo
    }

    /// Telemetry history calls fail with the given error
    pub fn failing_telemetry(mut self, error: fn() -> RepositoryError) -> Self {
        self.telemetry_failure = Some(error);
        self
    }

    pub fn failing_stats(mut self, error: fn() -> RepositoryError) -> Self {
        self.stats_failure = Some(error);
        self
    }

    pub fn requiring_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_string());
        self
    }

    pub fn actuator_calls(&self) -> Vec<(String, String, bool)> {
        self.actuator_calls.lock().unwrap().clone()
    }

    fn authorize(&self, session: &Session) -> Result<()> {
        match &self.required_token {
            Some(required) if session.token.as_ref() != Some(required) => {
                Err(RepositoryError::Unauthorized)
            }
            _ => Ok(()),
        }
    }
}

fn records(values: Vec<Value>) -> Vec<TelemetryRecord> {
    values
        .into_iter()
        .filter_map(TelemetryRecord::from_value)
        .collect()
}

#[async_trait]
impl DeviceRepository for InMemoryRepository {
    async fn list_devices(&self, session: &Session) -> Result<Vec<DeviceListing>> {
        self.authorize(session)?;
        let devices = self.devices.lock().unwrap();
        let mut listings: Vec<DeviceListing> = devices
            .iter()
            .map(|(id, detail)| DeviceListing {
                id: id.clone(),
                device: crate::domain::device::DeviceOwner {
                    user_id: detail.config.user_id.clone(),
                    name: detail.config.device.name.clone(),
                },
                actuators: detail
                    .control
                    .keys()
                    .map(|k| (k.clone(), Value::Null))
                    .collect(),
                sensors: Vec::new(),
            })
            .collect();
        listings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listings)
    }

    async fn get_device(&self, session: &Session, device_id: &str) -> Result<Option<DeviceDetail>> {
        self.authorize(session)?;
        Ok(self.devices.lock().unwrap().get(device_id).cloned())
    }

    async fn telemetry_history(
        &self,
        session: &Session,
        device_id: &str,
        limit: usize,
    ) -> Result<Vec<TelemetryRecord>> {
        self.authorize(session)?;
        if let Some(error) = self.telemetry_failure {
            return Err(error());
        }
        Ok(self
            .history
            .get(device_id)
            .map(|h| h.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn set_actuator(
        &self,
        session: &Session,
        device_id: &str,
        actuator: &str,
        status: bool,
    ) -> Result<()> {
        self.authorize(session)?;
        let mut devices = self.devices.lock().unwrap();
        let device = devices
            .get_mut(device_id)
            .ok_or_else(|| RepositoryError::not_found(device_id))?;
        device
            .control
            .entry(actuator.to_string())
            .or_insert_with(ActuatorState::default)
            .status = status;

        self.actuator_calls.lock().unwrap().push((
            device_id.to_string(),
            actuator.to_string(),
            status,
        ));
        Ok(())
    }

    async fn delete_device(&self, session: &Session, device_id: &str) -> Result<()> {
        self.authorize(session)?;
        self.devices
            .lock()
            .unwrap()
            .remove(device_id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found(device_id))
    }
}

#[async_trait]
impl AdminRepository for InMemoryRepository {
    async fn list_users(&self, session: &Session) -> Result<Vec<User>> {
        self.authorize(session)?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn create_user(&self, session: &Session, user: &NewUser) -> Result<()> {
        self.authorize(session)?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Rejected {
                status: 409,
                message: "Email already registered".to_string(),
            });
        }

        let role = serde_json::to_value(user.role)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let id = format!("user{}", users.len() + 1);
        users.push(User {
            id,
            short_id: String::new(),
            name: user.name.clone(),
            email: user.email.clone(),
            role,
        });
        Ok(())
    }

    async fn delete_user(&self, session: &Session, user_id: &str) -> Result<()> {
        self.authorize(session)?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != user_id);
        if users.len() == before {
            return Err(RepositoryError::not_found(user_id));
        }
        Ok(())
    }

    async fn list_schedules(&self, session: &Session) -> Result<Vec<Schedule>> {
        self.authorize(session)?;
        Ok(self.schedules.lock().unwrap().clone())
    }

    async fn delete_schedule(&self, session: &Session, schedule_id: &str) -> Result<()> {
        self.authorize(session)?;
        let mut schedules = self.schedules.lock().unwrap();
        let before = schedules.len();
        schedules.retain(|s| s.id != schedule_id);
        if schedules.len() == before {
            return Err(RepositoryError::not_found(schedule_id));
        }
        Ok(())
    }

    async fn stats(&self, session: &Session) -> Result<Stats> {
        self.authorize(session)?;
        if let Some(error) = self.stats_failure {
            return Err(error());
        }
        Ok(Stats {
            users: self.users.lock().unwrap().len() as u64,
            devices: self.devices.lock().unwrap().len() as u64,
            telemetry_records: self.history.values().map(Vec::len).sum::<usize>() as u64,
            schedules: self
                .schedules
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.active)
                .count() as u64,
        })
    }
}
