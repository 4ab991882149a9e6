//! Session ingestion orchestration.
//!
//! One call to [`ingest_session`] takes a session start-to-finish: fetch the
//! raw tables from the provider, upsert Weekend → Session → Driver in
//! foreign-key order, persist results and laps, resample and store each
//! driver's key-lap telemetry, and, for race sessions, derive stints and
//! per-lap positions. All writes are idempotent upserts with a single commit
//! at the end, so a crash mid-session is recovered by simply re-running.
//!
//! Progress milestones are reported to an optional advisory sink; progress
//! failures are logged and never fail ingestion.

use crate::provider::{SessionData, SessionKey, SessionKind, SessionProvider};
use crate::resample::{resample, ResampledTrace};
use crate::sink::{milestones, PersistenceSink, ProgressSink};
use crate::types::{
    DriverId, DriverRecord, KeyLapTelemetry, LapPosition, LapRecord, LapRow,
    SessionRecord, SessionResultRecord,
};
use crate::{positions, roster, stints, Result};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A key lap with fewer raw telemetry samples than this is treated as
/// telemetry-less, not as an error.
pub const MIN_TELEMETRY_SAMPLES: usize = 10;

/// Tunables for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Size of the uniform distance grid for key-lap telemetry
    pub telemetry_points: usize,
    /// External job identifier for progress reporting; `None` disables it
    pub job_id: Option<i64>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { telemetry_points: 1200, job_id: None }
    }
}

/// Row counts from one ingested session, for logging and tests.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub drivers: usize,
    pub laps: usize,
    pub key_laps: usize,
    pub stints: usize,
    pub lap_positions: usize,
}

/// Ingest one session start-to-finish.
///
/// External failures (provider fetch, sink round-trips) are propagated
/// without internal retry; already-issued upserts are not rolled back, and
/// re-running converges to the same stored state.
pub async fn ingest_session(
    provider: &dyn SessionProvider,
    sink: &mut dyn PersistenceSink,
    progress: Option<&dyn ProgressSink>,
    key: &SessionKey,
    options: &IngestOptions,
) -> Result<IngestStats> {
    info!("Ingesting {key}");
    report(progress, options.job_id, &key.session_code, milestones::STARTED).await;

    let data = provider.load_session(key).await?;
    report(progress, options.job_id, &key.session_code, milestones::RESULTS_LOADED).await;

    let weekend_id = sink.upsert_weekend(&data.weekend).await?;
    let session_id = sink
        .upsert_session(
            weekend_id,
            &SessionRecord {
                session_code: key.session_code.clone(),
                start_time: data.start_time,
            },
        )
        .await?;

    let mut stats = IngestStats::default();
    let mut driver_ids: HashMap<String, DriverId> = HashMap::new();

    if let Some(results) = &data.results {
        for row in results {
            let code = row.driver_code.trim();
            if code.is_empty() {
                continue;
            }
            let name = row
                .driver_name
                .clone()
                .unwrap_or_else(|| display_name(key.season, code));
            let driver_id = upsert_driver(sink, &mut driver_ids, code, &name).await?;

            sink.upsert_result(
                session_id,
                driver_id,
                &SessionResultRecord {
                    position: row.position,
                    best_lap_time_ms: best_lap_ms(row.qualifying_time_ms, row.overall_time_ms),
                    status: row.status.clone(),
                    points: row.points,
                    grid: row.grid,
                },
            )
            .await?;
        }
    }

    if data.laps.is_empty() {
        debug!("{key}: no lap data, committing results only");
        sink.commit().await?;
        report(progress, options.job_id, &key.session_code, milestones::DERIVATION_COMPLETE)
            .await;
        stats.drivers = driver_ids.len();
        return Ok(stats);
    }

    report(progress, options.job_id, &key.session_code, milestones::LAPS_LOADED).await;

    for code in data.driver_codes() {
        let mut driver_laps: Vec<&LapRow> =
            data.laps.iter().filter(|l| l.driver_code == code).collect();
        driver_laps.sort_by_key(|l| l.lap_number);

        let name = display_name(key.season, code);
        let driver_id = upsert_driver(sink, &mut driver_ids, code, &name).await?;

        // Every lap with a defined lap number is stored, not just the key lap
        for lap in &driver_laps {
            let Some(lap_number) = lap.lap_number else {
                continue;
            };
            sink.upsert_lap(
                session_id,
                driver_id,
                &LapRecord {
                    lap_number,
                    lap_time_ms: lap.lap_time_ms,
                    compound: lap.compound.clone(),
                    stint: lap.stint,
                    is_personal_best: lap.is_personal_best,
                },
            )
            .await?;
            stats.laps += 1;
        }

        let Some(key_lap_number) = key_lap(&driver_laps) else {
            debug!("{key}: no key lap for {code}");
            continue;
        };

        let Some(trace) = data.telemetry_for(code, key_lap_number) else {
            debug!("{key}: no telemetry for {code} lap {key_lap_number}");
            continue;
        };
        if trace.len() < MIN_TELEMETRY_SAMPLES {
            debug!(
                "{key}: {code} lap {key_lap_number} has {} raw samples, treating as telemetry-less",
                trace.len()
            );
            continue;
        }

        let resampled = resample(trace, options.telemetry_points);
        sink.upsert_key_lap_telemetry(
            session_id,
            driver_id,
            &telemetry_record(key_lap_number, resampled),
        )
        .await?;
        stats.key_laps += 1;
    }

    if key.kind() == SessionKind::Race {
        derive_race_data(sink, &mut driver_ids, key, &data, session_id, &mut stats).await?;
    }

    sink.commit().await?;
    report(progress, options.job_id, &key.session_code, milestones::DERIVATION_COMPLETE).await;

    stats.drivers = driver_ids.len();
    info!(
        "Ingested {key}: {} drivers, {} laps, {} key laps, {} stints, {} lap positions",
        stats.drivers, stats.laps, stats.key_laps, stats.stints, stats.lap_positions
    );
    Ok(stats)
}

/// Race-only derivation: stints per driver, positions per lap number.
async fn derive_race_data(
    sink: &mut dyn PersistenceSink,
    driver_ids: &mut HashMap<String, DriverId>,
    key: &SessionKey,
    data: &SessionData,
    session_id: i64,
    stats: &mut IngestStats,
) -> Result<()> {
    for code in data.driver_codes() {
        let mut driver_laps: Vec<LapRow> = data
            .laps
            .iter()
            .filter(|l| l.driver_code == code)
            .cloned()
            .collect();
        driver_laps.sort_by_key(|l| l.lap_number);

        let name = display_name(key.season, code);
        let driver_id = upsert_driver(sink, driver_ids, code, &name).await?;

        for stint in stints::segment(&driver_laps) {
            sink.upsert_stint(session_id, driver_id, &stint).await?;
            stats.stints += 1;
        }
    }

    for ranked in positions::rank_session(&data.laps) {
        for standing in &ranked.standings {
            let name = display_name(key.season, &standing.driver_code);
            let driver_id = upsert_driver(sink, driver_ids, &standing.driver_code, &name).await?;

            sink.upsert_lap_position(
                session_id,
                driver_id,
                &LapPosition {
                    lap_number: ranked.lap_number,
                    position: standing.position,
                    gap_to_leader_ms: standing.gap_to_leader_ms,
                    interval_ms: standing.interval_ms,
                },
            )
            .await?;
            stats.lap_positions += 1;
        }
    }

    Ok(())
}

/// Upsert a driver once per session, caching the id for reuse.
async fn upsert_driver(
    sink: &mut dyn PersistenceSink,
    driver_ids: &mut HashMap<String, DriverId>,
    code: &str,
    name: &str,
) -> Result<DriverId> {
    if let Some(id) = driver_ids.get(code) {
        return Ok(*id);
    }
    let id = sink
        .upsert_driver(&DriverRecord { code: code.to_string(), name: name.to_string() })
        .await?;
    driver_ids.insert(code.to_string(), id);
    Ok(id)
}

/// Fallback display name: the roster when it knows the code, else the code.
fn display_name(season: i32, code: &str) -> String {
    roster::driver_info(season, code)
        .map(|entry| entry.name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Best-lap-time fallback chain: qualifying-segment time, else overall time.
///
/// The priority order matches the source's documented behavior. For sessions
/// with multiple qualifying segments it may pick an unintended field; kept in
/// one place so a segment-aware fix is a one-site change.
fn best_lap_ms(qualifying_time_ms: Option<i64>, overall_time_ms: Option<i64>) -> Option<i64> {
    qualifying_time_ms.or(overall_time_ms)
}

/// Pick the key lap: flagged personal best if any, else fastest by lap time.
/// Returns `None` when no lap has both a lap number and a lap time.
fn key_lap(laps: &[&LapRow]) -> Option<i32> {
    let timed: Vec<&&LapRow> = laps
        .iter()
        .filter(|l| l.lap_number.is_some() && l.lap_time_ms.is_some())
        .collect();

    timed
        .iter()
        .filter(|l| l.is_personal_best == Some(true))
        .min_by_key(|l| l.lap_time_ms)
        .or_else(|| timed.iter().min_by_key(|l| l.lap_time_ms))
        .and_then(|l| l.lap_number)
}

fn telemetry_record(lap_number: i32, trace: ResampledTrace) -> KeyLapTelemetry {
    KeyLapTelemetry {
        lap_number,
        point_count: trace.point_count() as i32,
        distance: trace.distance,
        speed: trace.speed,
        throttle: trace.throttle,
        brake: trace.brake,
        gear: trace.gear,
        drs: trace.drs,
        pos_x: trace.pos_x,
        pos_y: trace.pos_y,
    }
}

/// Report a milestone, logging and swallowing failures: progress is advisory
/// and never gates ingestion.
async fn report(
    progress: Option<&dyn ProgressSink>,
    job_id: Option<i64>,
    session_code: &str,
    percent: u8,
) {
    let (Some(sink), Some(job_id)) = (progress, job_id) else {
        return;
    };
    if let Err(err) = sink.report_progress(job_id, session_code, percent).await {
        warn!("Progress update for job {job_id} failed: {err}");
    }
}
