//! Stint segmentation by tire compound run-length.
//!
//! A stint is a contiguous run of laps on one compound. Segmentation walks a
//! driver's laps in lap-number order and closes the current stint whenever
//! the compound changes. Laps missing a compound or a lap number are skipped
//! entirely: continuation is decided by comparing against the *last stint's
//! compound*, not lap-index adjacency, so a skipped lap flanked by the same
//! compound does not split the run.

use crate::types::{LapRow, Stint};

/// Segment one driver's laps (ordered by lap number) into stints.
///
/// Stints are numbered 1..N chronologically. Starting tire age is not
/// derivable from the inputs and is recorded as the placeholder 0.
pub fn segment(laps: &[LapRow]) -> Vec<Stint> {
    let mut stints: Vec<Stint> = Vec::new();
    let mut current: Option<Stint> = None;

    for lap in laps {
        let (Some(compound), Some(lap_number)) = (&lap.compound, lap.lap_number) else {
            // Neither starts, extends, nor closes a stint
            continue;
        };

        match &mut current {
            Some(stint) if stint.compound == *compound => {
                stint.end_lap = lap_number;
            }
            _ => {
                if let Some(finished) = current.take() {
                    stints.push(finished);
                }
                current = Some(Stint {
                    number: 0, // assigned once the full sequence is known
                    compound: compound.clone(),
                    start_lap: lap_number,
                    end_lap: lap_number,
                    tire_age_at_start: 0,
                });
            }
        }
    }

    if let Some(open) = current {
        stints.push(open);
    }

    for (i, stint) in stints.iter_mut().enumerate() {
        stint.number = i as i32 + 1;
    }

    stints
}
