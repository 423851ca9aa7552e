//! Simple wrappers to make many errors hard to make

#![warn(unused_crate_dependencies)]

use std::{fmt::Display, time::Duration};

/// Monotonic clock that works both natively and in the browser
pub use web_time::Instant;

/// Intended to be similar to Duration but always clear that it is in
/// milliseconds (the unit every browser timer and the backend config use)
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    PartialOrd,
    Ord,
)]
pub struct Millis(u64);

/// Wall clock time as milliseconds since the unix epoch. Only works with
/// date/time after the epoch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, PartialOrd, Ord,
)]
pub struct Timestamp(u64);

impl Millis {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns true if this represents zero milliseconds
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(&self, other: Millis) -> Millis {
        Self(self.0.saturating_sub(other.0))
    }

    /// Returns `None` if `self` is below `floor`
    pub fn at_least(self, floor: Millis) -> Option<Self> {
        (self >= floor).then_some(self)
    }
}

impl Timestamp {
    pub fn now() -> Self {
        Self(
            web_time::SystemTime::UNIX_EPOCH
                .elapsed()
                .map(|elapsed| elapsed.as_millis() as u64)
                .unwrap_or_default(),
        )
    }

    pub const fn from_unix_millis(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_unix_millis(&self) -> u64 {
        self.0
    }

    pub fn saturating_sub(&self, rhs: Millis) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub fn as_utc_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.0.try_into().ok()?)
    }

    pub fn display_as_locale_datetime(&self) -> String {
        match self.as_utc_datetime() {
            Some(utc) => chrono::DateTime::<chrono::Local>::from(utc)
                .format("%c")
                .to_string(),
            None => "—".to_string(),
        }
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Timestamp {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        Self(value.timestamp_millis().max(0) as u64)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl std::ops::Add<Millis> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Millis) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Add for Millis {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Mul<u64> for Millis {
    type Output = Self;

    fn mul(self, rhs: u64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl From<u64> for Millis {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u32> for Millis {
    fn from(value: u32) -> Self {
        Self(value.into())
    }
}

impl From<Millis> for Duration {
    fn from(value: Millis) -> Self {
        Duration::from_millis(value.0)
    }
}

impl From<Duration> for Millis {
    fn from(value: Duration) -> Self {
        Self(value.as_millis() as u64)
    }
}

impl Display for Millis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Milliseconds elapsed from `earlier` to `later` (zero if `later` is before)
pub fn millis_between(earlier: Instant, later: Instant) -> Millis {
    later.saturating_duration_since(earlier).into()
}

/// A point on the monotonic clock after which something should happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(now: Instant, delay: Millis) -> Self {
        Self(now + Duration::from(delay))
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.0
    }

    /// Time left until expiry (zero once expired)
    pub fn remaining(&self, now: Instant) -> Millis {
        millis_between(now, self.0)
    }

    pub fn instant(&self) -> Instant {
        self.0
    }
}
