//! Provider trait for session data sources.

use crate::types::{LapRow, RawTrace, ResultRow, WeekendRecord};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Natural key identifying one session at the timing source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Season year
    pub season: i32,
    /// 1-based round ordinal within the season
    pub round: i32,
    /// Short session identifier ("R", "Q", "FP1", "SS")
    pub session_code: String,
}

impl SessionKey {
    pub fn new(season: i32, round: i32, session_code: impl Into<String>) -> Self {
        Self { season, round, session_code: session_code.into() }
    }

    /// Classify the session by its code.
    pub fn kind(&self) -> SessionKind {
        match self.session_code.as_str() {
            "R" => SessionKind::Race,
            "Q" | "SQ" | "SS" => SessionKind::Qualifying,
            "S" => SessionKind::Sprint,
            _ => SessionKind::Practice,
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} round {} {}", self.season, self.round, self.session_code)
    }
}

/// Session classification derived from the session code.
///
/// Stint and lap-position derivation runs for [`SessionKind::Race`] only.
/// Telemetry grid sizing is chosen per session code, not per kind; see
/// [`crate::job::telemetry_points_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    Practice,
    Qualifying,
    Sprint,
    Race,
}

/// Everything a provider delivers for one session, as in-memory tables.
#[derive(Default, Debug, Clone)]
pub struct SessionData {
    /// Weekend the session belongs to
    pub weekend: WeekendRecord,
    /// Session start time, when the source knows it
    pub start_time: Option<DateTime<Utc>>,
    /// Results table; not every session type has one
    pub results: Option<Vec<ResultRow>>,
    /// Lap table across all drivers
    pub laps: Vec<LapRow>,
    /// Raw telemetry traces keyed by (driver code, lap number)
    pub telemetry: HashMap<(String, i32), RawTrace>,
}

impl SessionData {
    /// Telemetry trace for one driver's lap, if the source captured one.
    pub fn telemetry_for(&self, driver_code: &str, lap_number: i32) -> Option<&RawTrace> {
        self.telemetry.get(&(driver_code.to_string(), lap_number))
    }

    /// Driver codes appearing in the lap table, in first-seen order.
    pub fn driver_codes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for lap in &self.laps {
            if !seen.contains(&lap.driver_code.as_str()) {
                seen.push(lap.driver_code.as_str());
            }
        }
        seen
    }
}

/// Trait for session data sources.
///
/// Providers abstract over where session data comes from (a timing API, an
/// on-disk cache, canned fixtures in tests) and hand the orchestrator
/// ready-to-derive in-memory tables. One-time setup such as enabling a local
/// on-disk cache belongs in the provider's constructor, not in this trait.
///
/// Capability differences between source variants (e.g. availability of X/Y
/// position channels) are expressed through optional fields on the delivered
/// data, never through separate provider methods.
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    /// Fetch one session's raw data.
    ///
    /// Returns:
    /// - `Ok(data)` - the session's tables, possibly with an empty lap table
    /// - `Err(e)` - fetch failure; the caller does not retry internally
    async fn load_session(&self, key: &SessionKey) -> Result<SessionData>;
}
