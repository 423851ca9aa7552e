use std::fmt::Display;

use serde_json::Value;

use crate::wire::lenient_string;

/// Backend record id. Some endpoints send numbers and others strings so it is
/// kept in its textual form
#[derive(
    Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct EntityId(String);

impl EntityId {
    pub fn from_wire(value: &Value) -> Option<Self> {
        lenient_string(value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
