//! In-memory sink implementations.
//!
//! `MemorySink` stores rows in maps keyed by the same natural keys the
//! relational schema uses, which makes idempotence directly observable: two
//! ingestions of identical source data leave identical maps. It backs the
//! crate's integration tests and is useful as a reference implementation for
//! real sinks.

use crate::sink::{JobStatus, PersistenceSink, ProgressSink};
use crate::types::{
    DriverId, DriverRecord, KeyLapTelemetry, LapPosition, LapRecord, SessionId,
    SessionRecord, SessionResultRecord, Stint, WeekendId, WeekendRecord,
};
use crate::Result;
use std::collections::HashMap;
use std::sync::Mutex;

/// A [`PersistenceSink`] holding all rows in memory.
///
/// Ids are allocated sequentially on first insert and remain stable across
/// repeated upserts of the same natural key.
#[derive(Default, Debug)]
pub struct MemorySink {
    next_id: i64,
    /// (season, round) → row
    pub weekends: HashMap<(i32, i32), (WeekendId, WeekendRecord)>,
    /// (weekend_id, session_code) → row
    pub sessions: HashMap<(WeekendId, String), (SessionId, SessionRecord)>,
    /// code → row
    pub drivers: HashMap<String, (DriverId, DriverRecord)>,
    /// (session_id, driver_id) → row
    pub results: HashMap<(SessionId, DriverId), SessionResultRecord>,
    /// (session_id, driver_id, lap_number) → row
    pub laps: HashMap<(SessionId, DriverId, i32), LapRecord>,
    /// (session_id, driver_id, lap_number) → row
    pub key_lap_telemetry: HashMap<(SessionId, DriverId, i32), KeyLapTelemetry>,
    /// (session_id, driver_id, stint_number) → row
    pub stints: HashMap<(SessionId, DriverId, i32), Stint>,
    /// (session_id, lap_number, driver_id) → row
    pub lap_positions: HashMap<(SessionId, i32, DriverId), LapPosition>,
    /// Number of commits issued
    pub commits: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Total row count across all entity maps; convenient for idempotence
    /// assertions.
    pub fn row_count(&self) -> usize {
        self.weekends.len()
            + self.sessions.len()
            + self.drivers.len()
            + self.results.len()
            + self.laps.len()
            + self.key_lap_telemetry.len()
            + self.stints.len()
            + self.lap_positions.len()
    }
}

#[async_trait::async_trait]
impl PersistenceSink for MemorySink {
    async fn upsert_weekend(&mut self, weekend: &WeekendRecord) -> Result<WeekendId> {
        let key = (weekend.season, weekend.round);
        if let Some((id, row)) = self.weekends.get_mut(&key) {
            *row = weekend.clone();
            return Ok(*id);
        }
        let id = self.allocate_id();
        self.weekends.insert(key, (id, weekend.clone()));
        Ok(id)
    }

    async fn upsert_session(
        &mut self,
        weekend_id: WeekendId,
        session: &SessionRecord,
    ) -> Result<SessionId> {
        let key = (weekend_id, session.session_code.clone());
        if let Some((id, row)) = self.sessions.get_mut(&key) {
            *row = session.clone();
            return Ok(*id);
        }
        let id = self.allocate_id();
        self.sessions.insert(key, (id, session.clone()));
        Ok(id)
    }

    async fn upsert_driver(&mut self, driver: &DriverRecord) -> Result<DriverId> {
        if let Some((id, row)) = self.drivers.get_mut(&driver.code) {
            *row = driver.clone();
            return Ok(*id);
        }
        let id = self.allocate_id();
        self.drivers.insert(driver.code.clone(), (id, driver.clone()));
        Ok(id)
    }

    async fn upsert_result(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        result: &SessionResultRecord,
    ) -> Result<()> {
        self.results.insert((session_id, driver_id), result.clone());
        Ok(())
    }

    async fn upsert_lap(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        lap: &LapRecord,
    ) -> Result<()> {
        self.laps.insert((session_id, driver_id, lap.lap_number), lap.clone());
        Ok(())
    }

    async fn upsert_key_lap_telemetry(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        telemetry: &KeyLapTelemetry,
    ) -> Result<()> {
        self.key_lap_telemetry
            .insert((session_id, driver_id, telemetry.lap_number), telemetry.clone());
        Ok(())
    }

    async fn upsert_stint(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        stint: &Stint,
    ) -> Result<()> {
        self.stints.insert((session_id, driver_id, stint.number), stint.clone());
        Ok(())
    }

    async fn upsert_lap_position(
        &mut self,
        session_id: SessionId,
        driver_id: DriverId,
        position: &LapPosition,
    ) -> Result<()> {
        self.lap_positions
            .insert((session_id, position.lap_number, driver_id), position.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}

/// A [`ProgressSink`] recording every update in memory, for tests.
#[derive(Default, Debug)]
pub struct MemoryProgress {
    /// (job_id, session_code, percent) in report order
    pub updates: Mutex<Vec<(i64, String, u8)>>,
    /// (job_id, status) in report order
    pub statuses: Mutex<Vec<(i64, JobStatus)>>,
}

impl MemoryProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last status recorded for a job, if any.
    pub fn last_status(&self, job_id: i64) -> Option<JobStatus> {
        self.statuses
            .lock()
            .expect("progress mutex poisoned")
            .iter()
            .rev()
            .find(|(id, _)| *id == job_id)
            .map(|(_, status)| status.clone())
    }
}

#[async_trait::async_trait]
impl ProgressSink for MemoryProgress {
    async fn report_progress(&self, job_id: i64, session_code: &str, percent: u8) -> Result<()> {
        self.updates
            .lock()
            .expect("progress mutex poisoned")
            .push((job_id, session_code.to_string(), percent));
        Ok(())
    }

    async fn set_status(&self, job_id: i64, status: JobStatus) -> Result<()> {
        self.statuses
            .lock()
            .expect("progress mutex poisoned")
            .push((job_id, status));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeated_upserts_keep_ids_stable() {
        let mut sink = MemorySink::new();
        let weekend = WeekendRecord { season: 2024, round: 1, ..Default::default() };

        let first = sink.upsert_weekend(&weekend).await.unwrap();
        let second = sink.upsert_weekend(&weekend).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(sink.weekends.len(), 1);
    }

    #[tokio::test]
    async fn driver_name_is_refreshed_on_upsert() {
        let mut sink = MemorySink::new();
        let id = sink
            .upsert_driver(&DriverRecord { code: "VER".into(), name: "VER".into() })
            .await
            .unwrap();
        let refreshed = sink
            .upsert_driver(&DriverRecord { code: "VER".into(), name: "Max Verstappen".into() })
            .await
            .unwrap();

        assert_eq!(id, refreshed);
        assert_eq!(sink.drivers["VER"].1.name, "Max Verstappen");
    }
}
