//! Core types for session data representation.
//!
//! This module provides the data structures flowing through the ingestion
//! pipeline, split along the provider/sink boundary:
//!
//! - [`source`]: rows as delivered by the external session data provider
//!   (results table, lap table, raw telemetry samples). Nearly every field is
//!   optional: the timing source routinely omits compounds, times, and whole
//!   telemetry channels, and the derivation components define skip policies
//!   rather than inventing values.
//! - [`records`]: the normalized rows written through the persistence sink,
//!   keyed exactly as the data model specifies.

mod records;
mod source;

// Re-export all public types
pub use records::{
    DriverId, DriverRecord, KeyLapTelemetry, LapPosition, LapRecord, SessionId,
    SessionRecord, SessionResultRecord, Stint, WeekendId, WeekendRecord,
};
pub use source::{LapRow, RawTrace, ResultRow, TelemetrySample};
