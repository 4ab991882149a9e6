//! Normalized records written through the persistence sink.
//!
//! Each record type corresponds to one entity in the data model and is keyed
//! by the natural unique key given in its documentation. Sinks upsert on that
//! key and hand back a durable id for downstream foreign-key references.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Durable identifier for a stored weekend.
pub type WeekendId = i64;
/// Durable identifier for a stored session.
pub type SessionId = i64;
/// Durable identifier for a stored driver.
pub type DriverId = i64;

/// A race event. Unique key: (season, round).
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekendRecord {
    /// Season year
    pub season: i32,
    /// 1-based round ordinal within the season
    pub round: i32,
    /// Display name ("Bahrain Grand Prix")
    pub name: Option<String>,
    /// Circuit name
    pub circuit: Option<String>,
    /// Event date
    pub date: Option<NaiveDate>,
}

/// One timed activity within a weekend. Unique key: (weekend_id, session_code).
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Short session identifier ("R", "Q", "FP1", "SS")
    pub session_code: String,
    /// Session start time, when known
    pub start_time: Option<DateTime<Utc>>,
}

/// A competitor. Unique key: code. Shared across all sessions and weekends;
/// the display name may be refreshed on each ingestion.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRecord {
    pub code: String,
    pub name: String,
}

/// One driver's classification for a session.
/// Unique key: (session_id, driver_id).
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResultRecord {
    pub position: Option<i32>,
    pub best_lap_time_ms: Option<i64>,
    pub status: Option<String>,
    pub points: Option<f64>,
    pub grid: Option<i32>,
}

/// One completed lap by a driver in a session.
/// Unique key: (session_id, driver_id, lap_number).
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub lap_number: i32,
    pub lap_time_ms: Option<i64>,
    pub compound: Option<String>,
    pub stint: Option<i32>,
    pub is_personal_best: Option<bool>,
}

/// The resampled telemetry trace for one driver's key lap in a session.
/// Unique key: (session_id, driver_id, lap_number); at most one per driver
/// per session.
///
/// `distance` is always present; the other channels are parallel arrays of
/// the same length, present only when the source carried the channel.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyLapTelemetry {
    pub lap_number: i32,
    pub point_count: i32,
    pub distance: Vec<f64>,
    pub speed: Option<Vec<f64>>,
    pub throttle: Option<Vec<f64>>,
    pub brake: Option<Vec<f64>>,
    pub gear: Option<Vec<f64>>,
    pub drs: Option<Vec<f64>>,
    pub pos_x: Option<Vec<f64>>,
    pub pos_y: Option<Vec<f64>>,
}

/// A contiguous run of laps on one tire compound, for one driver in a race
/// session. Unique key: (session_id, driver_id, stint_number).
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stint {
    /// 1-based stint ordinal per driver, chronological
    pub number: i32,
    pub compound: String,
    pub start_lap: i32,
    pub end_lap: i32,
    /// Starting tire age is not derivable from the source; always recorded
    /// as the placeholder 0.
    pub tire_age_at_start: i32,
}

/// One driver's ranking on one lap of a race session.
/// Unique key: (session_id, lap_number, driver_id).
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapPosition {
    pub lap_number: i32,
    /// 1 = leader
    pub position: i32,
    /// Cumulative time behind the leader; `None` for the leader
    pub gap_to_leader_ms: Option<i64>,
    /// Cumulative time behind the car immediately ahead; `None` for the leader
    pub interval_ms: Option<i64>,
}
