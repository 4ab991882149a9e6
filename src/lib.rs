//! Motorsport session ingestion and race-derivation pipeline.
//!
//! Paddock pulls one session's raw timing data (results, laps, car
//! telemetry) from a [`SessionProvider`], derives the interesting bits, and
//! persists a normalized, query-ready representation through a
//! [`PersistenceSink`] using idempotent upserts.
//!
//! # Derivation components
//!
//! - **Resampler** ([`resample`]): irregular telemetry traces onto a
//!   fixed-size, distance-uniform grid for trivial cross-driver overlays
//! - **Stint segmenter** ([`stints`]): lap/compound sequences into
//!   contiguous tire stints
//! - **Position calculator** ([`positions`]): per-lap race positions, gaps
//!   to leader and intervals derived from cumulative elapsed time
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use paddock::{ingest_session, IngestOptions, SessionKey, MemorySink};
//! # struct MyProvider;
//! # #[async_trait::async_trait]
//! # impl paddock::SessionProvider for MyProvider {
//! #     async fn load_session(&self, _: &SessionKey) -> paddock::Result<paddock::SessionData> {
//! #         Ok(Default::default())
//! #     }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> paddock::Result<()> {
//!     let provider = MyProvider; // any SessionProvider implementation
//!     let mut sink = MemorySink::new();
//!
//!     let key = SessionKey::new(2024, 1, "Q");
//!     let stats = ingest_session(
//!         &provider,
//!         &mut sink,
//!         None,
//!         &key,
//!         &IngestOptions::default(),
//!     )
//!     .await?;
//!
//!     println!("{} laps ingested", stats.laps);
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod types;

// Derivation components
pub mod positions;
pub mod resample;
pub mod stints;

// Orchestration and collaborator seams
pub mod ingest;
pub mod job;
pub mod provider;
pub mod roster;
pub mod sink;
pub mod sinks;

// Core exports
pub use error::{IngestError, Result};
pub use types::*;

// Derivation exports
pub use positions::{rank_lap, rank_session, LapStanding, RankedLap};
pub use resample::{resample, ResampledTrace};
pub use stints::segment;

// Orchestration exports
pub use ingest::{ingest_session, IngestOptions, IngestStats, MIN_TELEMETRY_SAMPLES};
pub use job::{run_job, telemetry_points_for, JobRequest};
pub use provider::{SessionData, SessionKey, SessionKind, SessionProvider};
pub use sink::{milestones, JobStatus, PersistenceSink, ProgressSink};
pub use sinks::MemorySink;

#[cfg(feature = "postgres")]
pub use sinks::{PgProgress, PgSink};
