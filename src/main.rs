// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::admin_service::AdminService;
use crate::application::device_service::DeviceService;
use crate::application::telemetry_service::TelemetryService;
use crate::infrastructure::api_repository::ApiRepository;
use crate::infrastructure::config::load_config;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_user, delete_device, delete_schedule, delete_user, get_device, get_stats,
    get_telemetry, health_check, list_devices, list_schedules, list_users, toggle_actuator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(ApiRepository::new(&config.backend)?);

    // Create services (application layer)
    let device_service = DeviceService::new(repository.clone());
    let telemetry_service = TelemetryService::new(repository.clone(), config.chart.clone());
    let admin_service = AdminService::new(repository.clone());

    // Create application state
    let state = Arc::new(AppState {
        device_service,
        telemetry_service,
        admin_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/devices", get(list_devices))
        .route("/devices/:id", get(get_device).delete(delete_device))
        .route("/devices/:id/telemetry", get(get_telemetry))
        .route("/devices/:id/actuators/:actuator/toggle", post(toggle_actuator))
        .route("/stats", get(get_stats))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", delete(delete_user))
        .route("/schedules", get(list_schedules))
        .route("/schedules/:id", delete(delete_schedule))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind_addr.parse()?;
    tracing::info!(
        "Starting device-dashboard on {} (backend {})",
        addr,
        config.backend.base_url
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
