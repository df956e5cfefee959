// Sensor classifier - maps loosely named telemetry fields to display metadata
use super::telemetry::TelemetryRecord;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// Fields that never render as a sensor tile
pub const IGNORE_KEYS: &[&str] = &[
    "_id", "id", "uid", "uuid", "deviceId", "device_id", "chipId", "chip_id", "__v", "ts",
    "timestamp", "createdAt", "updatedAt", "time", "date", "meta", "raw", "up", "fw",
    "actuators",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorIcon {
    Thermometer,
    Snowflake,
    Gauge,
    Wind,
    Activity,
    Lightbulb,
    Sprout,
    Leaf,
    FlaskConical,
    Waves,
    Battery,
    Zap,
    Wifi,
    CloudRain,
    Sun,
    Flame,
    Percent,
    Ruler,
    AlarmClock,
    Microchip,
    Eye,
}

/// Color category used to group sensor tiles visually
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Hot,
    Wet,
    Sun,
    Plant,
    Power,
    Warning,
    Danger,
    Nitrogen,
    Phosphorus,
    Potassium,
    Neutral,
}

impl Tone {
    /// Color family the tone renders with
    pub fn palette(self) -> &'static str {
        match self {
            Tone::Hot => "red",
            Tone::Wet => "sky",
            Tone::Sun => "amber",
            Tone::Plant => "green",
            Tone::Power => "yellow",
            Tone::Warning => "orange",
            Tone::Danger => "rose",
            Tone::Nitrogen => "blue",
            Tone::Phosphorus => "purple",
            Tone::Potassium => "emerald",
            Tone::Neutral => "zinc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorMeta {
    pub icon: SensorIcon,
    pub unit: &'static str,
    pub tone: Tone,
}

impl SensorMeta {
    const fn new(icon: SensorIcon, unit: &'static str, tone: Tone) -> Self {
        Self { icon, unit, tone }
    }
}

const DEFAULT_META: SensorMeta = SensorMeta::new(SensorIcon::Eye, "", Tone::Neutral);

/// Short agronomic keys that would otherwise collide with catalog keywords
const EXACT_MATCHES: &[(&str, SensorMeta)] = &[
    ("t", SensorMeta::new(SensorIcon::Thermometer, "°C", Tone::Hot)),
    ("h", SensorMeta::new(SensorIcon::Snowflake, "%", Tone::Wet)),
    ("ph", SensorMeta::new(SensorIcon::FlaskConical, "", Tone::Plant)),
    ("n", SensorMeta::new(SensorIcon::Leaf, "ppm", Tone::Nitrogen)),
    ("p", SensorMeta::new(SensorIcon::Leaf, "ppm", Tone::Phosphorus)),
    ("k", SensorMeta::new(SensorIcon::Leaf, "ppm", Tone::Potassium)),
];

struct CatalogEntry {
    keywords: &'static [&'static str],
    meta: SensorMeta,
}

// Order matters: the first entry with a matching keyword wins.
const SENSOR_CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        keywords: &["temp", "temperature", "temperature_c", "t_c", "t_f", "heat"],
        meta: SensorMeta::new(SensorIcon::Thermometer, "°C", Tone::Hot),
    },
    CatalogEntry {
        keywords: &["hum", "humidity", "humidity_rh", "rh", "humid"],
        meta: SensorMeta::new(SensorIcon::Snowflake, "%", Tone::Wet),
    },
    CatalogEntry {
        keywords: &["pressure", "bar", "psi", "kpa", "hpa"],
        meta: SensorMeta::new(SensorIcon::Gauge, "", Tone::Neutral),
    },
    CatalogEntry {
        keywords: &["co2", "carbon", "ppm", "gas", "mq", "smoke"],
        meta: SensorMeta::new(SensorIcon::Wind, "ppm", Tone::Warning),
    },
    CatalogEntry {
        keywords: &["voc", "aqi", "airquality", "air_quality"],
        meta: SensorMeta::new(SensorIcon::Activity, "", Tone::Warning),
    },
    CatalogEntry {
        keywords: &["lux", "light", "ldr", "illum"],
        meta: SensorMeta::new(SensorIcon::Lightbulb, "lux", Tone::Sun),
    },
    CatalogEntry {
        keywords: &["soil", "moist", "moisture", "vwc"],
        meta: SensorMeta::new(SensorIcon::Sprout, "%", Tone::Plant),
    },
    CatalogEntry {
        keywords: &["n"],
        meta: SensorMeta::new(SensorIcon::Leaf, "ppm", Tone::Nitrogen),
    },
    CatalogEntry {
        keywords: &["p"],
        meta: SensorMeta::new(SensorIcon::Leaf, "ppm", Tone::Phosphorus),
    },
    CatalogEntry {
        keywords: &["k"],
        meta: SensorMeta::new(SensorIcon::Leaf, "ppm", Tone::Potassium),
    },
    CatalogEntry {
        keywords: &["acidity", "alkaline", "ph"],
        meta: SensorMeta::new(SensorIcon::Leaf, "", Tone::Plant),
    },
    CatalogEntry {
        keywords: &["ec", "tds", "conduct", "conductivity"],
        meta: SensorMeta::new(SensorIcon::Sprout, "ppm", Tone::Plant),
    },
    CatalogEntry {
        keywords: &["level", "waterlevel", "water_level", "flow", "lpm", "ml", "litre"],
        meta: SensorMeta::new(SensorIcon::Waves, "", Tone::Wet),
    },
    CatalogEntry {
        keywords: &["volt", "voltage", "vbat", "battery", "bat", "vb"],
        meta: SensorMeta::new(SensorIcon::Battery, "V", Tone::Power),
    },
    CatalogEntry {
        keywords: &["amp", "current", "ma", "a"],
        meta: SensorMeta::new(SensorIcon::Zap, "A", Tone::Power),
    },
    CatalogEntry {
        keywords: &["watt", "power", "kw", "wh"],
        meta: SensorMeta::new(SensorIcon::Zap, "W", Tone::Power),
    },
    CatalogEntry {
        keywords: &["rssi", "signal", "wifi", "ssid", "lte", "gsm"],
        meta: SensorMeta::new(SensorIcon::Wifi, "", Tone::Wet),
    },
    CatalogEntry {
        keywords: &["rain", "rainfall"],
        meta: SensorMeta::new(SensorIcon::CloudRain, "", Tone::Wet),
    },
    CatalogEntry {
        keywords: &["sun", "uv", "uvi"],
        meta: SensorMeta::new(SensorIcon::Sun, "", Tone::Sun),
    },
    CatalogEntry {
        keywords: &["flame", "fire"],
        meta: SensorMeta::new(SensorIcon::Flame, "", Tone::Danger),
    },
    CatalogEntry {
        keywords: &["percent", "pct"],
        meta: SensorMeta::new(SensorIcon::Percent, "%", Tone::Neutral),
    },
    CatalogEntry {
        keywords: &["distance", "cm", "mm", "meter", "m"],
        meta: SensorMeta::new(SensorIcon::Ruler, "", Tone::Neutral),
    },
    CatalogEntry {
        keywords: &[
            "uptime", "runtime", "seconds", "sec", "mins", "minutes", "timer", "up",
        ],
        meta: SensorMeta::new(SensorIcon::AlarmClock, "", Tone::Neutral),
    },
    CatalogEntry {
        keywords: &["cpu", "ram", "mem", "heap", "disk", "storage", "fw"],
        meta: SensorMeta::new(SensorIcon::Microchip, "", Tone::Sun),
    },
];

/// One tile of the "latest readings" grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub key: String,
    pub normalized_key: String,
    pub label: String,
    pub value: String,
    /// Only set for numeric values
    pub unit: Option<&'static str>,
    pub icon: SensorIcon,
    pub tone: Tone,
    pub palette: &'static str,
}

/// Trim, lowercase, turn whitespace runs into `_` and drop anything outside `[a-z0-9_]`
pub fn normalize_key(key: &str) -> String {
    let lowered = key.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            out.push(c);
        }
    }
    out
}

/// Turn `soil_moisture` into `Soil moisture`
pub fn titleize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let trimmed = spaced.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        None => "-".to_string(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Classify a telemetry field name. Never fails; unknown names get a
/// generic icon with no unit.
pub fn classify(key: &str) -> SensorMeta {
    let normalized = normalize_key(key);

    if let Some((_, meta)) = EXACT_MATCHES.iter().find(|(k, _)| *k == normalized) {
        return *meta;
    }

    SENSOR_CATALOG
        .iter()
        .find(|entry| entry.keywords.iter().any(|kw| normalized.contains(kw)))
        .map(|entry| entry.meta)
        .unwrap_or(DEFAULT_META)
}

/// Render a scalar for display. Lossy; for UI only.
pub fn format_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::Bool(true)) => "TRUE".to_string(),
        Some(Value::Bool(false)) => "FALSE".to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) => format_number(v),
            None => n.to_string(),
        },
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn format_number(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1000.0 {
        // Halves round toward positive infinity
        return format!("{:.0}", (v + 0.5).floor());
    }
    if abs >= 10.0 {
        let fixed = format!("{:.1}", round_half_away(v, 1));
        return fixed.strip_suffix(".0").map(str::to_string).unwrap_or(fixed);
    }
    let fixed = format!("{:.2}", round_half_away(v, 2));
    let s = fixed.strip_suffix('0').unwrap_or(fixed.as_str());
    s.strip_suffix(".0").unwrap_or(s).to_string()
}

/// Round to `decimals` places with ties away from zero; `format!` alone rounds ties to even
fn round_half_away(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}

pub fn is_ignored(key: &str) -> bool {
    IGNORE_KEYS.contains(&key) || IGNORE_KEYS.contains(&normalize_key(key).as_str())
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Collation rank of a normalized-key character: `_`, then digits, then letters
fn collation_rank(c: char) -> u32 {
    match c {
        '_' => 0,
        '0'..='9' => 1 + c as u32 - '0' as u32,
        _ => 16 + c as u32,
    }
}

/// Dictionary order of normalized keys, placing `_` before digits
fn collation_order(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(collation_rank)
        .cmp(b.chars().map(collation_rank))
}

/// Build the sensor tiles for one record, sorted by normalized key
pub fn sensor_readings(record: &TelemetryRecord) -> Vec<SensorReading> {
    let mut readings: Vec<SensorReading> = record
        .fields()
        .filter(|(key, value)| !is_ignored(key) && is_scalar(value))
        .map(|(key, value)| {
            let meta = classify(key);
            let unit = (value.is_number() && !meta.unit.is_empty()).then_some(meta.unit);
            SensorReading {
                key: key.clone(),
                normalized_key: normalize_key(key),
                label: titleize(key),
                value: format_value(Some(value)),
                unit,
                icon: meta.icon,
                tone: meta.tone,
                palette: meta.tone.palette(),
            }
        })
        .collect();

    readings.sort_by(|a, b| collation_order(&a.normalized_key, &b.normalized_key));
    readings
}
