//! Helpers for reading the backend's loosely shaped JSON.
//!
//! The backend has gone through several naming conventions for the same
//! concept. Instead of chains of fallbacks at every call site each concept
//! gets a [`Variants`] table listing the accepted keys in priority order. The
//! first key that is present (and not `null`) wins.

use serde_json::{Map, Value};

/// Accepted keys for one concept, highest priority first
#[derive(Debug, Clone, Copy)]
pub struct Variants(pub &'static [&'static str]);

pub type Object = Map<String, Value>;

impl Variants {
    /// First present non-null value
    pub fn lookup<'a>(&self, obj: &'a Object) -> Option<&'a Value> {
        self.0
            .iter()
            .filter_map(|key| obj.get(*key))
            .find(|value| !value.is_null())
    }

    /// First value that can be read as a finite number
    pub fn number(&self, obj: &Object) -> Option<f64> {
        self.0
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(lenient_f64)
    }

    /// First value that can be read as a non-empty string (numbers are
    /// converted)
    pub fn string(&self, obj: &Object) -> Option<String> {
        self.0
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(lenient_string)
    }

    pub fn boolean(&self, obj: &Object) -> Option<bool> {
        self.0
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(lenient_bool)
    }

    /// First value that is an array
    pub fn array<'a>(&self, obj: &'a Object) -> Option<&'a Vec<Value>> {
        self.0
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(Value::as_array)
    }
}

/// Numbers and numeric strings are accepted, anything not finite is rejected
pub fn lenient_f64(value: &Value) -> Option<f64> {
    let result = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    result.is_finite().then_some(result)
}

pub fn lenient_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "si" | "sí" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Strings only, kept as they are
pub fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(lenient_string).collect())
        .unwrap_or_default()
}

/// Percent encodes everything except the unreserved characters so a record id
/// can be used as a path segment
pub fn encode_path_segment(segment: &str) -> String {
    let mut result = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            result.push(byte as char);
        } else {
            result.push_str(&format!("%{byte:02X}"));
        }
    }
    result
}
