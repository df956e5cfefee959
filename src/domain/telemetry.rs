// Telemetry record domain model and timestamp resolution
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields checked, in order, for an explicit record timestamp
const TIMESTAMP_FIELDS: [&str; 4] = ["ts", "timestamp", "createdAt", "updatedAt"];

/// Numbers below this are treated as epoch seconds rather than milliseconds
const EPOCH_SECONDS_LIMIT: f64 = 1e11;

/// One snapshot of device sensor values as sent by the backend.
///
/// The shape is loosely typed: a flat map of field names to scalars plus
/// optional identifier and timestamp fields under several names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryRecord {
    fields: Map<String, Value>,
}

impl TelemetryRecord {
    /// Build a record from a JSON value; anything other than an object
    /// yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Record identifier, either a plain string or an extended JSON `{"$oid": ...}`
    pub fn identifier(&self) -> Option<&str> {
        ["_id", "id"].iter().find_map(|key| match self.fields.get(*key)? {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("$oid").and_then(Value::as_str),
            _ => None,
        })
    }

    /// Resolve when this record was taken.
    ///
    /// Explicit timestamp fields win in priority order; a field that is
    /// present but unparseable falls through to the next one. When none
    /// resolve, the creation time embedded in the identifier is used.
    pub fn resolve_timestamp(&self) -> Option<DateTime<Utc>> {
        TIMESTAMP_FIELDS
            .iter()
            .filter_map(|key| self.fields.get(*key))
            .find_map(parse_timestamp_value)
            .or_else(|| self.identifier().and_then(object_id_timestamp))
    }
}

/// Decode the creation time embedded in a 24-character hex object id.
///
/// The leading 8 hex characters are a big-endian u32 of Unix seconds.
pub fn object_id_timestamp(id: &str) -> Option<DateTime<Utc>> {
    if id.len() != 24 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let seconds = u32::from_str_radix(&id[..8], 16).ok()?;
    Utc.timestamp_opt(i64::from(seconds), 0).single()
}

fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            let raw = n.as_f64()?;
            if !raw.is_finite() || raw <= 0.0 {
                return None;
            }
            let millis = if raw < EPOCH_SECONDS_LIMIT {
                (raw * 1000.0) as i64
            } else {
                raw as i64
            };
            DateTime::from_timestamp_millis(millis)
        }
        _ => None,
    }
}

fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> TelemetryRecord {
        TelemetryRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_object_id_timestamp() {
        let ts = object_id_timestamp("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(ts.timestamp(), 0x507f1f77);

        assert!(object_id_timestamp("507f1f77").is_none());
        assert!(object_id_timestamp("zzzzzzzzbcf86cd799439011").is_none());
    }

    #[test]
    fn test_resolve_prefers_explicit_fields() {
        let r = record(json!({
            "_id": "507f1f77bcf86cd799439011",
            "updatedAt": "2024-05-01T10:00:00Z",
            "ts": "2024-05-02T10:00:00Z",
        }));
        assert_eq!(
            r.resolve_timestamp().unwrap().to_rfc3339(),
            "2024-05-02T10:00:00+00:00"
        );
    }

    #[test]
    fn test_resolve_falls_back_to_identifier() {
        let r = record(json!({ "_id": "507f1f77bcf86cd799439011", "t": 21.5 }));
        assert_eq!(r.resolve_timestamp().unwrap().timestamp(), 0x507f1f77);

        let r = record(json!({ "_id": { "$oid": "507f1f77bcf86cd799439011" } }));
        assert_eq!(r.resolve_timestamp().unwrap().timestamp(), 0x507f1f77);
    }

    #[test]
    fn test_unparseable_field_falls_through() {
        let r = record(json!({ "ts": "not a date", "createdAt": "2024-01-01 08:30:00" }));
        assert_eq!(
            r.resolve_timestamp().unwrap().to_rfc3339(),
            "2024-01-01T08:30:00+00:00"
        );
    }

    #[test]
    fn test_numeric_timestamps() {
        let millis = record(json!({ "ts": 1_700_000_000_000_i64 }));
        let seconds = record(json!({ "ts": 1_700_000_000_i64 }));
        assert_eq!(millis.resolve_timestamp(), seconds.resolve_timestamp());
    }

    #[test]
    fn test_unresolvable_record() {
        let r = record(json!({ "id": "device-7", "t": 20 }));
        assert!(r.resolve_timestamp().is_none());
        assert!(TelemetryRecord::from_value(json!([1, 2])).is_none());
    }
}
