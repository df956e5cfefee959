// Device-management backend repository over its REST API
use crate::application::admin_repository::AdminRepository;
use crate::application::device_repository::{DeviceRepository, Session};
use crate::application::error::{RepositoryError, Result};
use crate::domain::admin::{NewUser, Schedule, Stats, User};
use crate::domain::device::{DeviceDetail, DeviceListing};
use crate::domain::telemetry::TelemetryRecord;
use crate::infrastructure::config::{BackendConfig, EndpointsConfig, prepare_endpoint};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiRepository {
    client: reqwest::Client,
    base_url: String,
    service_token: Option<String>,
    endpoints: EndpointsConfig,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    devices: Vec<DeviceListing>,
}

#[derive(Debug, Deserialize)]
struct DeviceResponse {
    #[serde(default)]
    device: Option<DeviceDetail>,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct SchedulesResponse {
    #[serde(default)]
    schedules: Vec<Schedule>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    stats: Stats,
}

impl ApiRepository {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_token: config.token.clone(),
            endpoints: config.endpoints.clone(),
        })
    }

    fn build_url(&self, template: &str, id: Option<&str>) -> String {
        let mut vars = HashMap::new();
        if let Some(id) = id {
            vars.insert("id", id);
        }
        format!("{}{}", self.base_url, prepare_endpoint(template, &vars))
    }

    fn request(&self, session: &Session, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("Accept", "application/json");

        match session.token.as_ref().or(self.service_token.as_ref()) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::error!("Request for {} timed out", what);
                RepositoryError::Timeout
            } else {
                RepositoryError::Transport(e)
            }
        })?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => Err(RepositoryError::Unauthorized),
            StatusCode::NOT_FOUND => Err(RepositoryError::not_found(what)),
            status if status.is_client_error() => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!("Backend refused {}: {}", what, status);
                Err(RepositoryError::Rejected {
                    status: status.as_u16(),
                    message: rejection_message(status, &body),
                })
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::error!("Failed to fetch {}: {}", what, status);
                Err(RepositoryError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        session: &Session,
        url: &str,
        what: &str,
    ) -> Result<T> {
        let response = self
            .execute(self.request(session, Method::GET, url), what)
            .await?;
        response.json::<T>().await.map_err(RepositoryError::decode)
    }
}

/// Backend `message` (or `error`) from a refusal body, else the status reason
fn rejection_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|key| v.get(*key)?.as_str().map(str::to_string))
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request rejected")
                .to_string()
        })
}

/// Telemetry arrives either as a bare array or wrapped in `telemetry` / `items`
fn telemetry_records(body: Value) -> Vec<TelemetryRecord> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => match (obj.remove("telemetry"), obj.remove("items")) {
            (Some(Value::Array(items)), _) | (_, Some(Value::Array(items))) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(TelemetryRecord::from_value)
        .collect()
}

#[async_trait]
impl DeviceRepository for ApiRepository {
    async fn list_devices(&self, session: &Session) -> Result<Vec<DeviceListing>> {
        let url = self.build_url(&self.endpoints.devices, None);
        let response: DevicesResponse = self.get_json(session, &url, "devices").await?;

        tracing::debug!("Fetched {} devices", response.devices.len());
        Ok(response.devices)
    }

    async fn get_device(&self, session: &Session, device_id: &str) -> Result<Option<DeviceDetail>> {
        let url = self.build_url(&self.endpoints.device, Some(device_id));
        match self
            .get_json::<DeviceResponse>(session, &url, &format!("device {}", device_id))
            .await
        {
            Ok(response) => Ok(response.device),
            Err(RepositoryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn telemetry_history(
        &self,
        session: &Session,
        device_id: &str,
        limit: usize,
    ) -> Result<Vec<TelemetryRecord>> {
        let url = format!(
            "{}?limit={}",
            self.build_url(&self.endpoints.telemetry, Some(device_id)),
            limit
        );
        let body: Value = self
            .get_json(session, &url, &format!("telemetry for {}", device_id))
            .await?;

        let records = telemetry_records(body);
        tracing::debug!("Fetched {} telemetry records for {}", records.len(), device_id);
        Ok(records)
    }

    async fn set_actuator(
        &self,
        session: &Session,
        device_id: &str,
        actuator: &str,
        status: bool,
    ) -> Result<()> {
        let url = self.build_url(&self.endpoints.control, Some(device_id));
        let mut actuators = serde_json::Map::new();
        actuators.insert(actuator.to_string(), json!({ "status": status }));
        let body = json!({ "actuators": actuators });

        let request = self.request(session, Method::POST, &url).json(&body);
        self.execute(request, &format!("control of {}", device_id))
            .await?;
        Ok(())
    }

    async fn delete_device(&self, session: &Session, device_id: &str) -> Result<()> {
        let url = self.build_url(&self.endpoints.device, Some(device_id));
        let request = self.request(session, Method::DELETE, &url);
        self.execute(request, &format!("device {}", device_id))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AdminRepository for ApiRepository {
    async fn list_users(&self, session: &Session) -> Result<Vec<User>> {
        let url = self.build_url(&self.endpoints.users, None);
        let response: UsersResponse = self.get_json(session, &url, "users").await?;
        Ok(response.users)
    }

    async fn create_user(&self, session: &Session, user: &NewUser) -> Result<()> {
        let url = self.build_url(&self.endpoints.users, None);
        let request = self.request(session, Method::POST, &url).json(user);
        self.execute(request, "new user").await?;
        Ok(())
    }

    async fn delete_user(&self, session: &Session, user_id: &str) -> Result<()> {
        let url = self.build_url(&self.endpoints.user, Some(user_id));
        let request = self.request(session, Method::DELETE, &url);
        self.execute(request, &format!("user {}", user_id)).await?;
        Ok(())
    }

    async fn list_schedules(&self, session: &Session) -> Result<Vec<Schedule>> {
        let url = self.build_url(&self.endpoints.schedules, None);
        let response: SchedulesResponse = self.get_json(session, &url, "schedules").await?;
        Ok(response.schedules)
    }

    async fn delete_schedule(&self, session: &Session, schedule_id: &str) -> Result<()> {
        let url = self.build_url(&self.endpoints.schedule, Some(schedule_id));
        let request = self.request(session, Method::DELETE, &url);
        self.execute(request, &format!("schedule {}", schedule_id))
            .await?;
        Ok(())
    }

    async fn stats(&self, session: &Session) -> Result<Stats> {
        let url = self.build_url(&self.endpoints.stats, None);
        let response: StatsResponse = self.get_json(session, &url, "stats").await?;
        Ok(response.stats)
    }
}
