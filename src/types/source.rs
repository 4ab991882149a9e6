//! Rows as delivered by the external session data provider.
//!
//! These mirror the provider's tables one-to-one. Times are already converted
//! to milliseconds by the provider adapter; `None` means the source did not
//! supply the field.

use serde::{Deserialize, Serialize};

/// One competitor's row in the session results table.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Stable short driver code (e.g. "VER")
    pub driver_code: String,
    /// Display name, when the source provides one beyond the code
    pub driver_name: Option<String>,
    /// Classified finishing position
    pub position: Option<i32>,
    /// Best qualifying-segment time in milliseconds
    pub qualifying_time_ms: Option<i64>,
    /// Overall/race time in milliseconds
    pub overall_time_ms: Option<i64>,
    /// Classification status text ("Finished", "+1 Lap", "Retired", ...)
    pub status: Option<String>,
    /// Championship points awarded
    pub points: Option<f64>,
    /// Starting grid position
    pub grid: Option<i32>,
}

/// One completed lap in the provider's lap table.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRow {
    /// Stable short driver code
    pub driver_code: String,
    /// Lap number; `None` for incomplete/deleted laps, which are never stored
    pub lap_number: Option<i32>,
    /// Lap time in milliseconds
    pub lap_time_ms: Option<i64>,
    /// Tire compound label ("SOFT", "MEDIUM", ...)
    pub compound: Option<String>,
    /// Stint ordinal as reported by the source
    pub stint: Option<i32>,
    /// Personal-best flag as reported by the source
    pub is_personal_best: Option<bool>,
    /// Cumulative elapsed race time at lap completion, in milliseconds.
    /// Derived by the provider from its time-of-day field.
    pub cumulative_time_ms: Option<i64>,
}

/// One raw telemetry sample within a lap.
///
/// Channels are independent: any subset may be undefined on any sample, and a
/// whole channel may be absent for an entire trace (older sources do not
/// carry X/Y position).
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Distance traveled along the lap, meters
    pub distance: Option<f64>,
    /// Speed, km/h
    pub speed: Option<f64>,
    /// Throttle application, percent
    pub throttle: Option<f64>,
    /// Brake application (0/1 or percent depending on source)
    pub brake: Option<f64>,
    /// Selected gear
    pub gear: Option<f64>,
    /// DRS state flag
    pub drs: Option<f64>,
    /// World X coordinate
    pub pos_x: Option<f64>,
    /// World Y coordinate
    pub pos_y: Option<f64>,
}

/// An unevenly-sampled telemetry trace for one lap, in sample order.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrace {
    pub samples: Vec<TelemetrySample>,
}

impl RawTrace {
    /// Number of raw samples, including those without a distance coordinate.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
