//! Multi-session ingestion jobs.
//!
//! A job ingests a list of session codes for one weekend, sequentially, with
//! terminal status reporting: RUNNING when it starts, SUCCEEDED when every
//! session landed, FAILED with full error detail otherwise. There is no
//! internal retry; a failed job is re-run from scratch and converges thanks
//! to the idempotent upserts.

use crate::ingest::{ingest_session, IngestOptions};
use crate::provider::{SessionKey, SessionProvider};
use crate::sink::{milestones, JobStatus, PersistenceSink, ProgressSink};
use crate::Result;
use tracing::{info, warn};

/// One ingestion job: a weekend plus the session codes to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// External job identifier; `None` disables progress/status reporting
    pub job_id: Option<i64>,
    pub season: i32,
    pub round: i32,
    /// Session codes in ingestion order ("Q", "R", ...)
    pub session_codes: Vec<String>,
}

/// Telemetry grid size by session code. Qualifying and sprint shootout get a
/// denser grid because their flying laps are short; everything else,
/// including sprint qualifying, is stored at the coarse default.
pub fn telemetry_points_for(session_code: &str) -> usize {
    match session_code {
        "Q" | "SS" => 150,
        _ => 100,
    }
}

/// Run a job session-by-session.
///
/// The first failed session stops the job: its status is recorded as FAILED
/// with the full error chain, and the error is surfaced to the caller.
/// Sessions already ingested stay persisted (no rollback).
pub async fn run_job(
    provider: &dyn SessionProvider,
    sink: &mut dyn PersistenceSink,
    progress: Option<&dyn ProgressSink>,
    request: &JobRequest,
) -> Result<()> {
    set_status(progress, request.job_id, JobStatus::Running).await;

    for code in &request.session_codes {
        let key = SessionKey::new(request.season, request.round, code.trim());
        info!("Job {:?}: ingesting {key}", request.job_id);

        report(progress, request.job_id, &key.session_code, milestones::QUEUED).await;

        let options = IngestOptions {
            telemetry_points: telemetry_points_for(&key.session_code),
            job_id: request.job_id,
        };

        match ingest_session(provider, sink, progress, &key, &options).await {
            Ok(_) => {
                report(progress, request.job_id, &key.session_code, milestones::DONE).await;
            }
            Err(err) => {
                set_status(
                    progress,
                    request.job_id,
                    JobStatus::Failed { error: error_detail(&err) },
                )
                .await;
                return Err(err);
            }
        }
    }

    set_status(progress, request.job_id, JobStatus::Succeeded).await;
    Ok(())
}

/// Full error detail for the status record: the message plus every source in
/// the chain.
fn error_detail(err: &crate::IngestError) -> String {
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        detail.push_str("\ncaused by: ");
        detail.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    detail
}

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

async fn set_status(progress: Option<&dyn ProgressSink>, job_id: Option<i64>, status: JobStatus) {
    let (Some(sink), Some(job_id)) = (progress, job_id) else {
        return;
    };
    if let Err(err) = sink.set_status(job_id, status).await {
        warn!("Status update for job {job_id} failed: {err}");
    }
}
