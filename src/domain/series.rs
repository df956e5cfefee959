// Telemetry windowing and chart series building
use super::sensor::IGNORE_KEYS;
use super::telemetry::TelemetryRecord;
use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Metadata fields that are never charted, on top of the tile ignore-set
const SERIES_EXCLUDED_KEYS: &[&str] = &[
    "_id", "updatedAt", "createdAt", "ts", "timestamp", "__v", "deviceId", "id", "up", "fw",
];

/// Abbreviated sensor keys and their chart labels
const SERIES_LABELS: &[(&str, &str)] = &[
    ("t", "Temperature"),
    ("temp", "Temperature"),
    ("h", "Humidity"),
    ("hum", "Humidity"),
    ("n", "Nitrogen (N)"),
    ("p", "Phosphorus (P)"),
    ("k", "Potassium (K)"),
    ("ph", "pH"),
    ("ec", "EC"),
    ("vb", "Battery Voltage"),
    ("rssi", "Signal Strength"),
];

const TIME_LABEL_FORMAT: &str = "%b %-d, %I:%M %p";

/// Relative time range used to filter records before charting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "all")]
    All,
}

impl TimeWindow {
    pub const ALL_WINDOWS: [TimeWindow; 7] = [
        TimeWindow::OneHour,
        TimeWindow::SixHours,
        TimeWindow::TwelveHours,
        TimeWindow::OneDay,
        TimeWindow::ThreeDays,
        TimeWindow::SevenDays,
        TimeWindow::All,
    ];

    /// Window length in hours; `None` for the unbounded window
    pub fn hours(self) -> Option<i64> {
        match self {
            TimeWindow::OneHour => Some(1),
            TimeWindow::SixHours => Some(6),
            TimeWindow::TwelveHours => Some(12),
            TimeWindow::OneDay => Some(24),
            TimeWindow::ThreeDays => Some(72),
            TimeWindow::SevenDays => Some(168),
            TimeWindow::All => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            TimeWindow::OneHour => "1h",
            TimeWindow::SixHours => "6h",
            TimeWindow::TwelveHours => "12h",
            TimeWindow::OneDay => "24h",
            TimeWindow::ThreeDays => "3d",
            TimeWindow::SevenDays => "7d",
            TimeWindow::All => "all",
        }
    }

    /// Button label shown in the window picker
    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::All => "All",
            TimeWindow::OneHour => "1H",
            TimeWindow::SixHours => "6H",
            TimeWindow::TwelveHours => "12H",
            TimeWindow::OneDay => "24H",
            TimeWindow::ThreeDays => "3D",
            TimeWindow::SevenDays => "7D",
        }
    }

    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.hours().map(|h| now - Duration::hours(h))
    }

    pub fn admits(self, ts: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.cutoff(now).is_none_or(|cutoff| ts >= cutoff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown time window '{0}'")]
pub struct UnknownWindow(pub String);

impl FromStr for TimeWindow {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TimeWindow::ALL_WINDOWS
            .into_iter()
            .find(|w| w.token() == wanted)
            .ok_or_else(|| UnknownWindow(s.to_string()))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One chart sample: the record's numeric values keyed by series label.
///
/// A series missing from `values` means no data at this point, not zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Epoch milliseconds of the resolved record timestamp
    pub timestamp: i64,
    pub time: String,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesStatus {
    /// No records were supplied at all
    NoData,
    /// Records exist but none fall inside the window
    NoDataInWindow,
    /// Records were admitted but carry no numeric fields
    NoNumericSeries,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySeries {
    pub status: SeriesStatus,
    pub points: Vec<ChartPoint>,
    pub available_series: Vec<String>,
}

impl TelemetrySeries {
    fn empty(status: SeriesStatus) -> Self {
        Self {
            status,
            points: Vec::new(),
            available_series: Vec::new(),
        }
    }
}

/// Chart label for a raw sensor key
pub fn series_label(key: &str) -> &str {
    SERIES_LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
        .unwrap_or(key)
}

fn is_series_key(key: &str) -> bool {
    !SERIES_EXCLUDED_KEYS.contains(&key) && !IGNORE_KEYS.contains(&key)
}

fn label_priority(key: &str) -> usize {
    SERIES_LABELS
        .iter()
        .position(|(k, _)| *k == key)
        .unwrap_or(SERIES_LABELS.len())
}

/// Numeric series of one record, keyed by display name.
///
/// Keys from the label table claim their label in table order, so `t` wins
/// over `temp`. A key whose label is already taken in the same record is
/// charted under its raw name instead.
fn record_series(record: &TelemetryRecord) -> Vec<(String, f64)> {
    let mut numeric: Vec<(&str, f64)> = record
        .fields()
        .filter(|(key, _)| is_series_key(key))
        .filter_map(|(key, value)| value.as_f64().map(|v| (key.as_str(), v)))
        .collect();
    numeric.sort_by_key(|(key, _)| label_priority(key));

    let mut series: Vec<(String, f64)> = Vec::with_capacity(numeric.len());
    for (key, v) in numeric {
        let label = series_label(key);
        let name = if series.iter().any(|(taken, _)| taken.as_str() == label) {
            key
        } else {
            label
        };
        series.push((name.to_string(), v));
    }
    series
}

/// Builds chart series, rendering time labels in a fixed display offset
#[derive(Debug, Clone, Copy)]
pub struct SeriesBuilder {
    offset: FixedOffset,
}

impl Default for SeriesBuilder {
    fn default() -> Self {
        Self { offset: Utc.fix() }
    }
}

impl SeriesBuilder {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Offset in minutes east of UTC; out-of-range values fall back to UTC
    pub fn with_offset_minutes(minutes: i32) -> Self {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn format_time(&self, ts: DateTime<Utc>) -> String {
        ts.with_timezone(&self.offset)
            .format(TIME_LABEL_FORMAT)
            .to_string()
    }

    /// Resolve, window, sort and project records into chart points.
    ///
    /// Records without a resolvable timestamp are dropped before windowing,
    /// so they never appear, not even for [`TimeWindow::All`].
    pub fn build(
        &self,
        records: &[TelemetryRecord],
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> TelemetrySeries {
        if records.is_empty() {
            return TelemetrySeries::empty(SeriesStatus::NoData);
        }

        let mut admitted: Vec<(DateTime<Utc>, &TelemetryRecord)> = records
            .iter()
            .filter_map(|r| r.resolve_timestamp().map(|ts| (ts, r)))
            .filter(|(ts, _)| window.admits(*ts, now))
            .collect();

        if admitted.is_empty() {
            return TelemetrySeries::empty(SeriesStatus::NoDataInWindow);
        }

        // Stable, so equal timestamps keep their input order
        admitted.sort_by_key(|(ts, _)| *ts);

        let mut available_series: Vec<String> = Vec::new();
        let points: Vec<ChartPoint> = admitted
            .into_iter()
            .map(|(ts, record)| {
                let mut values = BTreeMap::new();
                for (name, v) in record_series(record) {
                    if !available_series.contains(&name) {
                        available_series.push(name.clone());
                    }
                    values.insert(name, v);
                }
                ChartPoint {
                    timestamp: ts.timestamp_millis(),
                    time: self.format_time(ts),
                    values,
                }
            })
            .collect();

        let status = if available_series.is_empty() {
            SeriesStatus::NoNumericSeries
        } else {
            SeriesStatus::Ready
        };

        TelemetrySeries {
            status,
            points,
            available_series,
        }
    }
}

/// Build chart series with UTC time labels
pub fn build_series(
    records: &[TelemetryRecord],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> TelemetrySeries {
    SeriesBuilder::default().build(records, window, now)
}

/// Downsample chart points using bucket averaging.
///
/// Each bucket keeps its middle point's time and averages every series over
/// the points that carry it; a series absent from a whole bucket stays absent.
pub fn downsample(points: Vec<ChartPoint>, max_points: usize) -> Vec<ChartPoint> {
    if max_points == 0 || points.len() <= max_points {
        return points;
    }

    let bucket_size = (points.len() as f64 / max_points as f64).ceil() as usize;
    let mut downsampled = Vec::with_capacity(max_points);

    for chunk in points.chunks(bucket_size) {
        let mid = &chunk[chunk.len() / 2];

        let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for point in chunk {
            for (name, value) in &point.values {
                let entry = sums.entry(name.as_str()).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }

        let values = sums
            .into_iter()
            .map(|(name, (sum, count))| (name.to_string(), sum / count as f64))
            .collect();

        downsampled.push(ChartPoint {
            timestamp: mid.timestamp,
            time: mid.time.clone(),
            values,
        });
    }

    downsampled
}
