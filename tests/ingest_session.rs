//! End-to-end orchestrator tests over a canned provider and the in-memory
//! sink, including the double-run idempotence guarantee.

use paddock::{
    ingest_session, run_job, IngestOptions, JobRequest, JobStatus, LapRow, MemorySink,
    RawTrace, ResultRow, SessionData, SessionKey, SessionProvider, TelemetrySample,
    WeekendRecord,
};
use paddock::sinks::MemoryProgress;
use std::collections::HashMap;

/// Provider returning the same canned session for every key.
struct StubProvider {
    data: SessionData,
}

#[async_trait::async_trait]
impl SessionProvider for StubProvider {
    async fn load_session(&self, _key: &SessionKey) -> paddock::Result<SessionData> {
        Ok(self.data.clone())
    }
}

/// Provider that always fails, for error-propagation tests.
struct FailingProvider;

#[async_trait::async_trait]
impl SessionProvider for FailingProvider {
    async fn load_session(&self, _key: &SessionKey) -> paddock::Result<SessionData> {
        Err(paddock::IngestError::provider_failed("timing service down"))
    }
}

fn lap(
    code: &str,
    number: i32,
    time: i64,
    compound: &str,
    personal_best: bool,
    cumulative: i64,
) -> LapRow {
    LapRow {
        driver_code: code.to_string(),
        lap_number: Some(number),
        lap_time_ms: Some(time),
        compound: Some(compound.to_string()),
        stint: Some(1),
        is_personal_best: Some(personal_best),
        cumulative_time_ms: Some(cumulative),
    }
}

fn trace(samples: usize) -> RawTrace {
    RawTrace {
        samples: (0..samples)
            .map(|i| TelemetrySample {
                distance: Some(i as f64 * 100.0),
                speed: Some(180.0 + i as f64),
                throttle: Some(90.0),
                brake: Some(0.0),
                gear: Some(6.0),
                drs: Some(0.0),
                pos_x: None,
                pos_y: None,
            })
            .collect(),
    }
}

/// A small race: two drivers, three laps each, VER pitting soft → medium.
fn race_session() -> SessionData {
    let mut telemetry = HashMap::new();
    telemetry.insert(("VER".to_string(), 2), trace(20));
    telemetry.insert(("NOR".to_string(), 3), trace(15));

    SessionData {
        weekend: WeekendRecord {
            season: 2024,
            round: 1,
            name: Some("Bahrain Grand Prix".to_string()),
            circuit: Some("Sakhir".to_string()),
            date: None,
        },
        start_time: None,
        results: Some(vec![
            ResultRow {
                driver_code: "VER".to_string(),
                driver_name: Some("Max Verstappen".to_string()),
                position: Some(1),
                qualifying_time_ms: None,
                overall_time_ms: Some(5_400_000),
                status: Some("Finished".to_string()),
                points: Some(25.0),
                grid: Some(1),
            },
            ResultRow {
                driver_code: "NOR".to_string(),
                driver_name: None, // exercises the roster fallback
                position: Some(2),
                qualifying_time_ms: None,
                overall_time_ms: Some(5_407_500),
                status: Some("Finished".to_string()),
                points: Some(18.0),
                grid: Some(3),
            },
        ]),
        laps: vec![
            lap("VER", 1, 95_000, "SOFT", false, 95_000),
            lap("VER", 2, 93_000, "SOFT", true, 188_000),
            lap("VER", 3, 96_000, "MEDIUM", false, 284_000),
            lap("NOR", 1, 96_000, "SOFT", false, 96_000),
            lap("NOR", 2, 95_500, "SOFT", false, 191_500),
            lap("NOR", 3, 94_000, "SOFT", true, 285_500),
        ],
        telemetry,
    }
}

fn options(points: usize) -> IngestOptions {
    IngestOptions { telemetry_points: points, job_id: None }
}

#[tokio::test]
async fn race_session_persists_all_entity_types() {
    let _ = tracing_subscriber::fmt::try_init();
    let provider = StubProvider { data: race_session() };
    let mut sink = MemorySink::new();
    let key = SessionKey::new(2024, 1, "R");

    let stats = ingest_session(&provider, &mut sink, None, &key, &options(50))
        .await
        .expect("ingestion should succeed");

    assert_eq!(sink.weekends.len(), 1);
    assert_eq!(sink.sessions.len(), 1);
    assert_eq!(sink.drivers.len(), 2);
    assert_eq!(sink.results.len(), 2);
    assert_eq!(sink.laps.len(), 6);
    assert_eq!(sink.key_lap_telemetry.len(), 2);
    assert_eq!(sink.commits, 1);

    // VER ran SOFT/SOFT/MEDIUM → 2 stints; NOR all SOFT → 1
    assert_eq!(sink.stints.len(), 3);
    // Both drivers timed on all three laps
    assert_eq!(sink.lap_positions.len(), 6);

    assert_eq!(stats.drivers, 2);
    assert_eq!(stats.laps, 6);
    assert_eq!(stats.key_laps, 2);
    assert_eq!(stats.stints, 3);
    assert_eq!(stats.lap_positions, 6);
}

#[tokio::test]
async fn key_lap_telemetry_is_resampled_to_the_requested_grid() {
    let provider = StubProvider { data: race_session() };
    let mut sink = MemorySink::new();
    let key = SessionKey::new(2024, 1, "R");

    ingest_session(&provider, &mut sink, None, &key, &options(64)).await.unwrap();

    let ver_id = sink.drivers["VER"].0;
    let session_id = sink.sessions.values().next().unwrap().0;
    let telemetry = &sink.key_lap_telemetry[&(session_id, ver_id, 2)];

    // VER's flagged personal best is lap 2
    assert_eq!(telemetry.lap_number, 2);
    assert_eq!(telemetry.point_count, 64);
    assert_eq!(telemetry.distance.len(), 64);
    assert!(telemetry.speed.is_some());
    // The source carried no X/Y channels, so they are absent
    assert!(telemetry.pos_x.is_none());
    assert!(telemetry.pos_y.is_none());
}

#[tokio::test]
async fn sparse_telemetry_is_treated_as_telemetry_less() {
    let mut data = race_session();
    data.telemetry.insert(("VER".to_string(), 2), trace(9)); // below the threshold

    let provider = StubProvider { data };
    let mut sink = MemorySink::new();
    let key = SessionKey::new(2024, 1, "R");

    let stats = ingest_session(&provider, &mut sink, None, &key, &options(50))
        .await
        .expect("sparse telemetry is not an error");

    // Only NOR's key lap is stored; everything else is unaffected
    assert_eq!(stats.key_laps, 1);
    assert_eq!(sink.laps.len(), 6);
}

#[tokio::test]
async fn non_race_sessions_skip_stints_and_positions() {
    let provider = StubProvider { data: race_session() };
    let mut sink = MemorySink::new();
    let key = SessionKey::new(2024, 1, "Q");

    ingest_session(&provider, &mut sink, None, &key, &options(50)).await.unwrap();

    assert!(sink.stints.is_empty());
    assert!(sink.lap_positions.is_empty());
    assert_eq!(sink.laps.len(), 6);
}

#[tokio::test]
async fn lap_positions_are_derived_from_cumulative_time() {
    let provider = StubProvider { data: race_session() };
    let mut sink = MemorySink::new();
    let key = SessionKey::new(2024, 1, "R");

    ingest_session(&provider, &mut sink, None, &key, &options(50)).await.unwrap();

    let session_id = sink.sessions.values().next().unwrap().0;
    let ver_id = sink.drivers["VER"].0;
    let nor_id = sink.drivers["NOR"].0;

    // Lap 3: VER 284000 leads NOR 285500
    let ver_lap3 = &sink.lap_positions[&(session_id, 3, ver_id)];
    assert_eq!(ver_lap3.position, 1);
    assert_eq!(ver_lap3.gap_to_leader_ms, None);
    assert_eq!(ver_lap3.interval_ms, None);

    let nor_lap3 = &sink.lap_positions[&(session_id, 3, nor_id)];
    assert_eq!(nor_lap3.position, 2);
    assert_eq!(nor_lap3.gap_to_leader_ms, Some(1_500));
    assert_eq!(nor_lap3.interval_ms, Some(1_500));
}

#[tokio::test]
async fn laps_without_numbers_are_never_stored() {
    let mut data = race_session();
    data.laps.push(LapRow {
        driver_code: "VER".to_string(),
        lap_number: None,
        lap_time_ms: Some(99_000),
        ..Default::default()
    });

    let provider = StubProvider { data };
    let mut sink = MemorySink::new();
    let key = SessionKey::new(2024, 1, "R");

    ingest_session(&provider, &mut sink, None, &key, &options(50)).await.unwrap();

    assert_eq!(sink.laps.len(), 6);
    assert!(sink.laps.keys().all(|&(_, _, lap_number)| (1..=3).contains(&lap_number)));
}

#[tokio::test]
async fn roster_enriches_drivers_the_source_names_by_code_only() {
    let mut data = race_session();
    data.results = None; // no results table: names must come from the roster

    let provider = StubProvider { data };
    let mut sink = MemorySink::new();
    let key = SessionKey::new(2024, 1, "R");

    ingest_session(&provider, &mut sink, None, &key, &options(50)).await.unwrap();

    assert_eq!(sink.drivers["VER"].1.name, "Max Verstappen");
    assert_eq!(sink.drivers["NOR"].1.name, "Lando Norris");
}

#[tokio::test]
async fn double_ingestion_is_idempotent_for_every_entity_type() {
    let key = SessionKey::new(2024, 1, "R");

    let provider = StubProvider { data: race_session() };
    let mut once = MemorySink::new();
    ingest_session(&provider, &mut once, None, &key, &options(50)).await.unwrap();

    let mut twice = MemorySink::new();
    ingest_session(&provider, &mut twice, None, &key, &options(50)).await.unwrap();
    ingest_session(&provider, &mut twice, None, &key, &options(50)).await.unwrap();

    assert_eq!(once.row_count(), twice.row_count());
    assert_eq!(once.weekends, twice.weekends);
    assert_eq!(once.sessions, twice.sessions);
    assert_eq!(once.drivers, twice.drivers);
    assert_eq!(once.results, twice.results);
    assert_eq!(once.laps, twice.laps);
    assert_eq!(once.key_lap_telemetry, twice.key_lap_telemetry);
    assert_eq!(once.stints, twice.stints);
    assert_eq!(once.lap_positions, twice.lap_positions);
}

#[tokio::test]
async fn successful_job_reports_milestones_and_terminal_status() {
    let _ = tracing_subscriber::fmt::try_init();
    let provider = StubProvider { data: race_session() };
    let mut sink = MemorySink::new();
    let progress = MemoryProgress::new();

    let request = JobRequest {
        job_id: Some(7),
        season: 2024,
        round: 1,
        session_codes: vec!["Q".to_string(), "R".to_string()],
    };

    run_job(&provider, &mut sink, Some(&progress), &request)
        .await
        .expect("job should succeed");

    assert_eq!(progress.last_status(7), Some(JobStatus::Succeeded));

    let updates = progress.updates.lock().unwrap();
    for code in ["Q", "R"] {
        let percents: Vec<u8> = updates
            .iter()
            .filter(|(_, c, _)| c == code)
            .map(|&(_, _, p)| p)
            .collect();
        assert_eq!(percents, vec![10, 20, 40, 60, 95, 100], "milestones for {code}");
    }
}

#[tokio::test]
async fn failed_job_records_error_detail_and_surfaces_the_error() {
    let mut sink = MemorySink::new();
    let progress = MemoryProgress::new();

    let request = JobRequest {
        job_id: Some(9),
        season: 2024,
        round: 1,
        session_codes: vec!["R".to_string()],
    };

    let err = run_job(&FailingProvider, &mut sink, Some(&progress), &request)
        .await
        .expect_err("provider failure must surface");
    assert!(err.to_string().contains("timing service down"));

    match progress.last_status(9) {
        Some(JobStatus::Failed { error }) => {
            assert!(error.contains("timing service down"));
        }
        other => panic!("expected FAILED status, got {other:?}"),
    }

    // Nothing was persisted and nothing committed
    assert_eq!(sink.row_count(), 0);
    assert_eq!(sink.commits, 0);
}

#[tokio::test]
async fn session_without_laps_still_persists_results() {
    let mut data = race_session();
    data.laps.clear();
    data.telemetry.clear();

    let provider = StubProvider { data };
    let mut sink = MemorySink::new();
    let key = SessionKey::new(2024, 1, "R");

    let stats = ingest_session(&provider, &mut sink, None, &key, &options(50)).await.unwrap();

    assert_eq!(sink.results.len(), 2);
    assert!(sink.laps.is_empty());
    assert!(sink.stints.is_empty());
    assert_eq!(sink.commits, 1);
    assert_eq!(stats.laps, 0);
}
