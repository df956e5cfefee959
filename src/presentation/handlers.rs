// HTTP request handlers
use crate::application::admin_service::StatsOverview;
use crate::application::device_service::DeviceOverview;
use crate::application::error::RepositoryError;
use crate::application::telemetry_service::TelemetryChart;
use crate::domain::admin::{NewUser, Schedule, User};
use crate::domain::device::{ActuatorState, DeviceSummary};
use crate::domain::selection::SeriesSelection;
use crate::domain::series::TimeWindow;
use crate::presentation::app_state::AppState;
use crate::presentation::error::AppError;
use crate::presentation::session::RequestSession;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct TelemetryQuery {
    pub window: Option<String>,
    /// Comma separated series labels
    pub series: Option<String>,
}

impl TelemetryQuery {
    fn window(&self, default: TimeWindow) -> Result<TimeWindow, AppError> {
        match self.window.as_deref() {
            None | Some("") => Ok(default),
            Some(raw) => raw
                .parse::<TimeWindow>()
                .map_err(|e| AppError::BadRequest(e.to_string())),
        }
    }

    fn selection(&self) -> SeriesSelection {
        self.series
            .as_deref()
            .map(SeriesSelection::from_param)
            .unwrap_or_default()
    }
}

/// Device detail page: overview tiles plus the default-window chart
#[derive(Debug, Serialize)]
pub struct DevicePage {
    #[serde(flatten)]
    pub overview: DeviceOverview,
    pub chart: Option<TelemetryChart>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    RequestSession(session): RequestSession,
) -> Result<Json<Vec<DeviceSummary>>, AppError> {
    let devices = state.device_service.list_devices(&session).await?;
    Ok(Json(devices))
}

/// Device overview and telemetry chart, fetched concurrently.
///
/// A failing telemetry fetch only drops the chart; an expired session still fails the page.
pub async fn get_device(
    Path(id): Path<String>,
    Query(query): Query<TelemetryQuery>,
    State(state): State<Arc<AppState>>,
    RequestSession(session): RequestSession,
) -> Result<Json<DevicePage>, AppError> {
    let window = query.window(state.telemetry_service.default_window())?;
    let now = chrono::Utc::now();

    let (overview, chart) = futures::join!(
        state.device_service.device_overview(&session, &id),
        state
            .telemetry_service
            .telemetry_chart(&session, &id, window, query.selection(), now)
    );

    let overview = overview?;
    let chart = match chart {
        Ok(chart) => Some(chart),
        Err(RepositoryError::Unauthorized) => return Err(RepositoryError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!("Error fetching telemetry for {}: {}", id, e);
            None
        }
    };

    Ok(Json(DevicePage { overview, chart }))
}

pub async fn get_telemetry(
    Path(id): Path<String>,
    Query(query): Query<TelemetryQuery>,
    State(state): State<Arc<AppState>>,
    RequestSession(session): RequestSession,
) -> Result<Json<TelemetryChart>, AppError> {
    let window = query.window(state.telemetry_service.default_window())?;
    let chart = state
        .telemetry_service
        .telemetry_chart(&session, &id, window, query.selection(), chrono::Utc::now())
        .await?;
    Ok(Json(chart))
}

pub async fn toggle_actuator(
    Path((id, actuator)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    RequestSession(session): RequestSession,
) -> Result<Json<ActuatorState>, AppError> {
    let new_state = state
        .device_service
        .toggle_actuator(&session, &id, &actuator)
        .await?;
    Ok(Json(new_state))
}

pub async fn delete_device(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    RequestSession(session): RequestSession,
) -> Result<StatusCode, AppError> {
    state.device_service.delete_device(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    RequestSession(session): RequestSession,
) -> Result<Json<StatsOverview>, AppError> {
    let overview = state.admin_service.stats_overview(&session).await?;
    Ok(Json(overview))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    RequestSession(session): RequestSession,
) -> Result<Json<Vec<User>>, AppError> {
    let users = state.admin_service.list_users(&session).await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    RequestSession(session): RequestSession,
    Json(user): Json<NewUser>,
) -> Result<StatusCode, AppError> {
    let user = user
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    state.admin_service.create_user(&session, &user).await?;
    Ok(StatusCode::CREATED)
}

pub async fn delete_user(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    RequestSession(session): RequestSession,
) -> Result<StatusCode, AppError> {
    state.admin_service.delete_user(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_schedules(
    State(state): State<Arc<AppState>>,
    RequestSession(session): RequestSession,
) -> Result<Json<Vec<Schedule>>, AppError> {
    let schedules = state.admin_service.list_schedules(&session).await?;
    Ok(Json(schedules))
}

pub async fn delete_schedule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    RequestSession(session): RequestSession,
) -> Result<StatusCode, AppError> {
    state.admin_service.delete_schedule(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
