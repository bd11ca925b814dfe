//! Rates and running totals.
//!
//! The management API reports most counters twice: as a running total since
//! the object was created and as a per-second rate sampled over an interval.

/// A per-second rate sampled by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Rate {
    /// Current value, per second.
    pub value: f64,

    /// Length of the sampling window in milliseconds, when the broker
    /// reported one.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub interval_ms: Option<u64>,
}

impl Rate {
    /// A rate with no sampling interval attached.
    pub const fn new(value: f64) -> Self {
        Self {
            value,
            interval_ms: None,
        }
    }

    /// A rate sampled over `interval_ms` milliseconds.
    pub const fn sampled(value: f64, interval_ms: u64) -> Self {
        Self {
            value,
            interval_ms: Some(interval_ms),
        }
    }

    /// Whether the value is usable for comparisons (finite and not negative).
    pub fn is_valid(&self) -> bool {
        self.value.is_finite() && self.value >= 0.0
    }
}

impl From<f64> for Rate {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// A message counter: total since creation plus the current rate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MessageStat {
    pub total: u64,
    pub rate: Rate,
}

impl MessageStat {
    pub const fn new(total: u64, rate: f64) -> Self {
        Self {
            total,
            rate: Rate::new(rate),
        }
    }

    /// A counter with a total only.
    pub const fn total(total: u64) -> Self {
        Self::new(total, 0.0)
    }
}
