// Telemetry service - Use case for building windowed telemetry charts
use crate::application::device_repository::{DeviceRepository, Session};
use crate::application::error::Result;
use crate::domain::selection::{SeriesOption, SeriesSelection, series_options};
use crate::domain::series::{ChartPoint, SeriesBuilder, SeriesStatus, TimeWindow, downsample};
use crate::infrastructure::config::ChartConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Above this many points the chart shows a range brush
const BRUSH_THRESHOLD: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct WindowOption {
    pub window: TimeWindow,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TelemetryChart {
    pub device_id: String,
    pub window: TimeWindow,
    pub windows: Vec<WindowOption>,
    pub status: SeriesStatus,
    pub points: Vec<ChartPoint>,
    /// Admitted points before downsampling
    pub total_points: usize,
    pub series: Vec<SeriesOption>,
    pub visible_series: Vec<String>,
    pub show_brush: bool,
}

#[derive(Clone)]
pub struct TelemetryService {
    repository: Arc<dyn DeviceRepository>,
    chart_config: ChartConfig,
    builder: SeriesBuilder,
}

impl TelemetryService {
    pub fn new(repository: Arc<dyn DeviceRepository>, chart_config: ChartConfig) -> Self {
        let builder = SeriesBuilder::with_offset_minutes(chart_config.utc_offset_minutes);
        Self {
            repository,
            chart_config,
            builder,
        }
    }

    pub fn default_window(&self) -> TimeWindow {
        self.chart_config.default_window
    }

    pub async fn telemetry_chart(
        &self,
        session: &Session,
        device_id: &str,
        window: TimeWindow,
        mut selection: SeriesSelection,
        now: DateTime<Utc>,
    ) -> Result<TelemetryChart> {
        let history = self
            .repository
            .telemetry_history(session, device_id, self.chart_config.telemetry_limit)
            .await?;

        tracing::debug!(
            "Building {} chart for {} from {} records",
            window,
            device_id,
            history.len()
        );

        let series = self.builder.build(&history, window, now);
        let total_points = series.points.len();
        let points = downsample(series.points, self.chart_config.max_points);

        selection.initialize(&series.available_series);
        let visible_series = selection
            .visible(&series.available_series)
            .into_iter()
            .map(str::to_string)
            .collect();

        let windows = TimeWindow::ALL_WINDOWS
            .into_iter()
            .map(|w| WindowOption {
                window: w,
                label: w.label(),
                selected: w == window,
            })
            .collect();

        Ok(TelemetryChart {
            device_id: device_id.to_string(),
            window,
            windows,
            status: series.status,
            show_brush: points.len() > BRUSH_THRESHOLD,
            points,
            total_points,
            series: series_options(&series.available_series, &selection),
            visible_series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::RepositoryError;
    use crate::application::testing::InMemoryRepository;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn service(max_points: usize) -> TelemetryService {
        let config = ChartConfig {
            max_points,
            ..ChartConfig::default()
        };
        TelemetryService::new(Arc::new(InMemoryRepository::with_greenhouse()), config)
    }

    #[tokio::test]
    async fn test_chart_for_window() {
        let chart = service(150)
            .telemetry_chart(
                &Session::anonymous(),
                "dev1",
                TimeWindow::SixHours,
                SeriesSelection::default(),
                now(),
            )
            .await
            .unwrap();

        assert_eq!(chart.status, SeriesStatus::Ready);
        assert_eq!(chart.points.len(), 2);
        assert_eq!(chart.total_points, 2);
        assert!(chart.points[0].timestamp < chart.points[1].timestamp);
        assert!(chart.series.iter().all(|s| s.selected));
        assert_eq!(chart.visible_series.len(), 3);
        assert!(chart.visible_series.contains(&"Temperature".to_string()));
        assert!(!chart.show_brush);

        let selected: Vec<TimeWindow> = chart
            .windows
            .iter()
            .filter(|w| w.selected)
            .map(|w| w.window)
            .collect();
        assert_eq!(selected, vec![TimeWindow::SixHours]);
    }

    #[tokio::test]
    async fn test_default_selection_caps_at_four() {
        let chart = service(150)
            .telemetry_chart(
                &Session::anonymous(),
                "dev1",
                TimeWindow::All,
                SeriesSelection::default(),
                now(),
            )
            .await
            .unwrap();

        // The record without any timestamp is dropped even for "all"
        assert_eq!(chart.points.len(), 3);
        assert_eq!(chart.series.len(), 5);
        assert_eq!(chart.visible_series.len(), 4);
    }

    #[tokio::test]
    async fn test_explicit_selection_survives_window_change() {
        let svc = service(150);
        let selection = SeriesSelection::from_param("EC,Temperature");

        let narrow = svc
            .telemetry_chart(&Session::anonymous(), "dev1", TimeWindow::OneHour, selection.clone(), now())
            .await
            .unwrap();
        assert_eq!(narrow.visible_series, vec!["Temperature"]);

        let wide = svc
            .telemetry_chart(&Session::anonymous(), "dev1", TimeWindow::All, selection, now())
            .await
            .unwrap();
        assert_eq!(wide.visible_series, vec!["EC", "Temperature"]);
    }

    #[tokio::test]
    async fn test_status_for_unknown_and_empty_window() {
        let svc = service(150);
        let empty = svc
            .telemetry_chart(&Session::anonymous(), "other", TimeWindow::All, SeriesSelection::default(), now())
            .await
            .unwrap();
        assert_eq!(empty.status, SeriesStatus::NoData);

        let later = now() + chrono::Duration::days(30);
        let stale = svc
            .telemetry_chart(&Session::anonymous(), "dev1", TimeWindow::OneDay, SeriesSelection::default(), later)
            .await
            .unwrap();
        assert_eq!(stale.status, SeriesStatus::NoDataInWindow);
        assert!(stale.series.is_empty());
    }

    #[tokio::test]
    async fn test_downsampling_keeps_total() {
        let chart = service(2)
            .telemetry_chart(&Session::anonymous(), "dev1", TimeWindow::All, SeriesSelection::default(), now())
            .await
            .unwrap();
        assert_eq!(chart.total_points, 3);
        assert_eq!(chart.points.len(), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_propagates() {
        let repo = Arc::new(InMemoryRepository::with_greenhouse().requiring_token("secret"));
        let svc = TelemetryService::new(repo, ChartConfig::default());
        let err = svc
            .telemetry_chart(&Session::anonymous(), "dev1", TimeWindow::All, SeriesSelection::default(), now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Unauthorized));
    }
}
