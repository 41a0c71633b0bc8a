//! Process-local monotonic timebase
//!
//! Provides microsecond-precision timestamps measured from a process-local
//! epoch. Hardware reports and pointer-hook notifications are both stamped
//! against the same epoch so that the intercept heuristic can correlate them.

use std::sync::OnceLock;
use std::time::Instant;

/// Epoch captured on first use
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Monotonic microsecond clock
///
/// - Microsecond precision
/// - Monotonic (backed by `std::time::Instant`)
/// - Raw micros stored in the hot path, converted lazily
#[derive(Debug, Clone, Copy)]
pub struct Timebase;

impl Timebase {
    /// Pin the epoch. Optional; the first `now_micros()` call does the same.
    pub fn init() {
        EPOCH.get_or_init(Instant::now);
    }

    /// Microseconds elapsed since the epoch.
    #[inline]
    pub fn now_micros() -> u64 {
        let epoch = EPOCH.get_or_init(Instant::now);
        u64::try_from(epoch.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// A point in time, in microseconds since the process epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from raw microseconds.
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Create a timestamp from milliseconds.
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    /// Capture the current time.
    #[inline]
    pub fn now() -> Self {
        Self(Timebase::now_micros())
    }

    /// Raw microsecond value.
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Convert to milliseconds.
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }

    /// Duration since an earlier timestamp, saturating at zero.
    #[inline]
    pub fn duration_since(&self, earlier: Timestamp) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Check if this timestamp is after another.
    #[inline]
    pub fn is_after(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }

    /// Shift forward by a duration.
    #[inline]
    pub fn advanced_by(&self, duration: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(duration.0))
    }
}

impl serde::Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let micros = u64::deserialize(deserializer)?;
        Ok(Timestamp(micros))
    }
}

/// A span of time in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(u64);

impl Duration {
    /// Zero duration.
    pub const ZERO: Duration = Duration(0);

    /// Create a duration from microseconds.
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Create a duration from milliseconds.
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    /// Raw microsecond value.
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Convert to milliseconds.
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }

    /// Convert to seconds as f64.
    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Convert to a `std::time::Duration` for sleeping.
    #[inline]
    pub fn to_std(self) -> std::time::Duration {
        std::time::Duration::from_micros(self.0)
    }
}

impl std::ops::Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Self) -> Self::Output {
        Duration(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0.saturating_sub(rhs.0))
    }
}
