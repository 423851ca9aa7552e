//! Patrol location snapshots and everything derived from them

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDateTime, Utc};
use patrol_time::{Millis, Timestamp};
use serde_json::Value;

use crate::{
    errors::WireError,
    wire::{lenient_f64, lenient_string, Object, Variants},
};

const KEY_IDENTITY: Variants = Variants(&["patrulla", "nombre", "id"]);
const KEY_FEATURE_IDENTITY: Variants = Variants(&["nombre", "patrulla"]);
const KEY_LAT: Variants = Variants(&["lat", "latitude", "latitud", "y"]);
const KEY_LNG: Variants = Variants(&["lng", "lon", "longitude", "longitud", "x"]);
const KEY_STATE: Variants = Variants(&["estado"]);
const KEY_ACTIVE_FLAG: Variants = Variants(&["activo"]);
const KEY_TIMESTAMP: Variants = Variants(&["ts", "updated_at", "created_at"]);
const KEY_ACCURACY: Variants = Variants(&["accuracy", "accuracy_m"]);
const KEY_COLLECTION: Variants = Variants(&["data", "items"]);

/// State labels used by the backend
pub const STATE_LABEL_ACTIVE: &str = "activa";
pub const STATE_LABEL_INACTIVE: &str = "inactiva";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LocationState {
    Active,
    Inactive,
    #[default]
    Unknown,
}

impl LocationState {
    /// Case insensitive, anything unrecognized is [`LocationState::Unknown`]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case(STATE_LABEL_ACTIVE) {
            Self::Active
        } else if label.eq_ignore_ascii_case(STATE_LABEL_INACTIVE) {
            Self::Inactive
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LocationRecord {
    pub identity: String,
    pub lat: f64,
    pub lng: f64,
    pub state: LocationState,
    /// As sent by the backend, used for display
    pub state_label: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Radius in meters
    pub accuracy: Option<f64>,
}

/// One poll's worth of records, superseded as a whole by the next poll
pub type LocationSnapshot = Vec<LocationRecord>;

impl LocationRecord {
    /// Used to key markers. Falls back to the coordinates when the backend did
    /// not name the patrol
    pub fn marker_key(&self) -> String {
        if self.identity.is_empty() {
            format!("{},{}", self.lat, self.lng)
        } else {
            self.identity.clone()
        }
    }

    /// Only positive radii are drawn
    pub fn accuracy_radius(&self) -> Option<f64> {
        self.accuracy.filter(|radius| *radius > 0.0)
    }

    pub fn popup_text(&self) -> String {
        let mut result = format!(
            "{}\n{:.5}, {:.5}",
            if self.identity.is_empty() {
                "-"
            } else {
                &self.identity
            },
            self.lat,
            self.lng
        );
        if let Some(ts) = self.timestamp {
            let _ = write!(result, "\n{}", display_timestamp(Some(ts)));
        }
        result
    }

    fn from_flat(obj: &Object) -> Option<Self> {
        let geometry = geometry_coordinates(obj);
        let lat = KEY_LAT
            .number(obj)
            .or_else(|| geometry.and_then(|c| c.get(1)).and_then(lenient_f64))?;
        let lng = KEY_LNG
            .number(obj)
            .or_else(|| geometry.and_then(|c| c.first()).and_then(lenient_f64))?;
        let state_label = state_label(obj);
        Some(Self {
            identity: KEY_IDENTITY.string(obj).unwrap_or_default(),
            lat,
            lng,
            state: state_label
                .as_deref()
                .map(LocationState::from_label)
                .unwrap_or_default(),
            state_label,
            timestamp: KEY_TIMESTAMP.lookup(obj).and_then(parse_timestamp),
            accuracy: KEY_ACCURACY.number(obj),
        })
    }

    fn from_feature(feature: &Object) -> Option<Self> {
        let empty = Object::new();
        let properties = feature
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let coordinates = geometry_coordinates(feature)?;
        let lat = coordinates.get(1).and_then(lenient_f64)?;
        let lng = coordinates.first().and_then(lenient_f64)?;
        let state_label = state_label(properties);
        Some(Self {
            identity: KEY_FEATURE_IDENTITY
                .string(properties)
                .or_else(|| feature.get("id").and_then(lenient_string))
                .unwrap_or_default(),
            lat,
            lng,
            state: state_label
                .as_deref()
                .map(LocationState::from_label)
                .unwrap_or_default(),
            state_label,
            timestamp: KEY_TIMESTAMP.lookup(properties).and_then(parse_timestamp),
            accuracy: KEY_ACCURACY.number(properties),
        })
    }
}

fn geometry_coordinates(obj: &Object) -> Option<&Vec<Value>> {
    obj.get("geometry")?
        .as_object()?
        .get("coordinates")?
        .as_array()
}

/// `estado` as sent, else the `activo` flag turned into a label
fn state_label(obj: &Object) -> Option<String> {
    KEY_STATE.string(obj).or_else(|| {
        KEY_ACTIVE_FLAG.boolean(obj).map(|active| {
            if active {
                STATE_LABEL_ACTIVE.to_string()
            } else {
                STATE_LABEL_INACTIVE.to_string()
            }
        })
    })
}

/// Accepts RFC 3339, naive `YYYY-MM-DD HH:MM:SS` (taken as UTC) and unix
/// milliseconds
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n
            .as_f64()
            .filter(|millis| millis.is_finite() && *millis >= 0.0)
            .and_then(|millis| DateTime::from_timestamp_millis(millis as i64)),
        _ => None,
    }
}

pub fn display_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => Timestamp::from(ts).display_as_locale_datetime(),
        None => "—".to_string(),
    }
}

/// Reads any of the shapes the locations endpoint has used: a bare array,
/// `{data: [..]}`, `{items: [..]}` or a GeoJSON feature collection. Records
/// without finite coordinates are dropped. An empty body is an empty snapshot
pub fn normalize_snapshot(value: &Value) -> Result<LocationSnapshot, WireError> {
    let records = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(obj) => {
            if let Some(items) = KEY_COLLECTION.array(obj) {
                items
            } else if let Some(features) = obj.get("features").and_then(Value::as_array) {
                return Ok(features
                    .iter()
                    .filter_map(Value::as_object)
                    .filter_map(LocationRecord::from_feature)
                    .collect());
            } else {
                return Err(WireError::NoCollection);
            }
        }
        other => return Err(WireError::not_an_object(other)),
    };
    let result: LocationSnapshot = records
        .iter()
        .filter_map(Value::as_object)
        .filter_map(LocationRecord::from_flat)
        .collect();
    if result.len() < records.len() {
        tracing::debug!(
            dropped = records.len() - result.len(),
            "location records without usable coordinates"
        );
    }
    Ok(result)
}

/// Summary figures shown above the map
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct Kpis {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// Timestamp of the first record (the backend sends newest first)
    pub latest: Option<DateTime<Utc>>,
}

impl Kpis {
    pub fn from_snapshot(snapshot: &[LocationRecord]) -> Self {
        let total = snapshot.len();
        let active = snapshot
            .iter()
            .filter(|record| record.state == LocationState::Active)
            .count();
        Self {
            total,
            active,
            inactive: total - active,
            latest: snapshot.first().and_then(|record| record.timestamp),
        }
    }
}

/// Time window offered for the location table
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::EnumIter,
    strum::Display,
    strum::AsRefStr,
)]
pub enum TimeRange {
    #[strum(serialize = "1h")]
    LastHour,
    #[strum(serialize = "6h")]
    LastSixHours,
    #[default]
    #[strum(serialize = "24h")]
    LastDay,
    #[strum(serialize = "7d")]
    LastWeek,
    #[strum(serialize = "30d")]
    LastMonth,
    #[strum(serialize = "all")]
    All,
}

impl TimeRange {
    pub fn window(&self) -> Option<Millis> {
        const HOUR: u64 = 60 * 60 * 1000;
        match self {
            TimeRange::LastHour => Some(Millis::new(HOUR)),
            TimeRange::LastSixHours => Some(Millis::new(6 * HOUR)),
            TimeRange::LastDay => Some(Millis::new(24 * HOUR)),
            TimeRange::LastWeek => Some(Millis::new(7 * 24 * HOUR)),
            TimeRange::LastMonth => Some(Millis::new(30 * 24 * HOUR)),
            TimeRange::All => None,
        }
    }

    /// Rows inside the window ending at `now`. Rows without a timestamp only
    /// pass for [`TimeRange::All`]
    pub fn filter<'a>(
        &self,
        rows: &'a [LocationRecord],
        now: Timestamp,
    ) -> Vec<&'a LocationRecord> {
        let Some(window) = self.window() else {
            return rows.iter().collect();
        };
        let since = now.saturating_sub(window);
        rows.iter()
            .filter(|row| {
                row.timestamp
                    .is_some_and(|ts| Timestamp::from(ts) >= since)
            })
            .collect()
    }

    pub fn csv_file_name(&self) -> String {
        format!("ubicaciones_{self}.csv")
    }
}

const CSV_HEADER: [&str; 5] = ["Patrulla", "Lat", "Lng", "Estado", "Actualizado"];

fn csv_escape(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// UTF-8 with BOM, every value quoted, CRLF between lines. `format_ts` decides
/// how timestamps are shown (local time in the app)
pub fn locations_csv<'a>(
    rows: impl IntoIterator<Item = &'a LocationRecord>,
    format_ts: impl Fn(Option<DateTime<Utc>>) -> String,
) -> String {
    let mut lines = vec![CSV_HEADER
        .iter()
        .map(|h| csv_escape(h))
        .collect::<Vec<_>>()
        .join(",")];
    for row in rows {
        let identity = if row.identity.is_empty() {
            "-"
        } else {
            &row.identity
        };
        lines.push(
            [
                csv_escape(identity),
                csv_escape(&row.lat.to_string()),
                csv_escape(&row.lng.to_string()),
                csv_escape(row.state_label.as_deref().unwrap_or_default()),
                csv_escape(&format_ts(row.timestamp)),
            ]
            .join(","),
        );
    }
    format!("\u{FEFF}{}", lines.join("\r\n"))
}
