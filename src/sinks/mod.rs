//! Persistence sink implementations.
//!
//! [`memory`] is always available and backs the crate's own tests; the
//! Postgres sink in [`postgres`] requires the `postgres` feature.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{MemoryProgress, MemorySink};

#[cfg(feature = "postgres")]
pub use postgres::{PgProgress, PgSink};
