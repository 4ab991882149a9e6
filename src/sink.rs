//! Sink traits for persistence and progress reporting.
//!
//! The orchestrator never talks to a database directly: it writes through
//! [`PersistenceSink`], whose operations are idempotent upserts keyed by each
//! entity's natural key. Re-running ingestion for a session must converge to
//! the same stored state given the same source data.
//!
//! [`ProgressSink`] is a separate, advisory collaborator: coarse named-stage
//! percentages and a terminal status, keyed by an external job id. Progress
//! failures never gate ingestion correctness.

use crate::types::{
    DriverId, DriverRecord, KeyLapTelemetry, LapPosition, LapRecord, SessionId,
    SessionRecord, SessionResultRecord, Stint, WeekendId, WeekendRecord,
};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Coarse progress milestones on the 0–100 scale, reported per session code.
pub mod milestones {
    /// Session queued by the job runner, not yet fetching
    pub const QUEUED: u8 = 10;
    /// Provider fetch started
    pub const STARTED: u8 = 20;
    /// Source tables loaded; results persisted next
    pub const RESULTS_LOADED: u8 = 40;
    /// Lap rows persisting
    pub const LAPS_LOADED: u8 = 60;
    /// All derivation persisted, awaiting commit
    pub const DERIVATION_COMPLETE: u8 = 95;
    /// Session fully ingested
    pub const DONE: u8 = 100;
}

/// Terminal and in-flight status of an ingestion job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed {
        /// Full error detail, preserved for operators
        error: String,
    },
}

/// Idempotent persistence operations, one per entity in the data model.
///
/// Each upsert is keyed by the entity's natural unique key and returns the
/// durable identifier needed for downstream foreign-key references, so
/// implementations must create Weekend → Session → Driver rows before any
/// dependent row is written; the orchestrator calls them in that order.
///
/// Statements are issued as derivation proceeds; [`commit`](Self::commit) is
/// called once at the end of a session. A crash mid-session can leave partial
/// rows, which the upsert design makes safe to re-run from scratch.
#[async_trait::async_trait]
pub trait PersistenceSink: Send {
    /// Upsert a weekend by (season, round).
    async fn upsert_weekend(&mut self, weekend: &WeekendRecord) -> Result<WeekendId>;

    /// Upsert a session by (weekend_id, session_code).
    async fn upsert_session(
        &mut self,
        weekend_id: WeekendId,
        session: &SessionRecord,
    ) -> Result<SessionId>;

    /// Upsert a driver by code, refreshing the display name.
    async fn upsert_driver(&mut self, driver: &DriverRecord) -> Result<DriverId>;

    /// Upsert one driver's classification by (session_id, driver_id).
    async fn upsert_result(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        result: &SessionResultRecord,
    ) -> Result<()>;

    /// Upsert one lap by (session_id, driver_id, lap_number).
    async fn upsert_lap(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        lap: &LapRecord,
    ) -> Result<()>;

    /// Upsert the key-lap telemetry trace by (session_id, driver_id, lap_number).
    async fn upsert_key_lap_telemetry(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        telemetry: &KeyLapTelemetry,
    ) -> Result<()>;

    /// Upsert one stint by (session_id, driver_id, stint_number).
    async fn upsert_stint(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        stint: &Stint,
    ) -> Result<()>;

    /// Upsert one lap position by (session_id, lap_number, driver_id).
    async fn upsert_lap_position(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        position: &LapPosition,
    ) -> Result<()>;

    /// Commit everything issued for the current session.
    async fn commit(&mut self) -> Result<()>;
}

/// Advisory progress reporting, keyed by an external job identifier.
#[async_trait::async_trait]
pub trait ProgressSink: Send + Sync {
    /// Report a milestone percentage for one session code of a job.
    async fn report_progress(&self, job_id: i64, session_code: &str, percent: u8) -> Result<()>;

    /// Record the job's status, including full error detail on failure.
    async fn set_status(&self, job_id: i64, status: JobStatus) -> Result<()>;
}
