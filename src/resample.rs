//! Telemetry resampling onto a fixed-size distance grid.
//!
//! Raw telemetry sample rate and count vary by lap length and by data source.
//! Storing a fixed-size, distance-uniform trace makes cross-lap and
//! cross-driver comparison (overlaying two drivers' speed traces) trivial for
//! consumers, at the cost of sub-grid-resolution detail. The target point
//! count (100–1200 depending on session type) vastly exceeds meaningful
//! visual resolution, so nothing of analytical value is lost.
//!
//! Channels are handled independently: a channel that is entirely undefined
//! in the input is omitted from the output, and gaps within a channel are
//! filled by linear interpolation with the nearest defined value held at the
//! edges, so output channels never contain undefined values.

use crate::types::{RawTrace, TelemetrySample};
use serde::{Deserialize, Serialize};

/// Decimal precision of output channel values. Bounds stored payload size and
/// numeric noise.
const CHANNEL_DECIMALS: f64 = 1e6;

/// A distance-uniform telemetry trace produced by [`resample`].
///
/// `distance` always has one entry per point; each present channel is a
/// parallel array of the same length with no undefined values.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampledTrace {
    pub distance: Vec<f64>,
    pub speed: Option<Vec<f64>>,
    pub throttle: Option<Vec<f64>>,
    pub brake: Option<Vec<f64>>,
    pub gear: Option<Vec<f64>>,
    pub drs: Option<Vec<f64>>,
    pub pos_x: Option<Vec<f64>>,
    pub pos_y: Option<Vec<f64>>,
}

impl ResampledTrace {
    /// Number of points in the trace.
    pub fn point_count(&self) -> usize {
        self.distance.len()
    }
}

/// Resample a raw trace onto `target_points` evenly spaced distance values.
///
/// Samples without a distance coordinate are discarded first. Two degenerate
/// inputs are defined edge cases, not errors, and return the filtered input
/// on its own distances instead of building a grid:
///
/// - fewer than 2 valid samples remain
/// - the distance range collapses to zero width (max == min)
///
/// Otherwise the output spans exactly `[min, max]` of the filtered distances,
/// strictly increasing, with every present channel linearly interpolated onto
/// the grid and rounded to 6 fractional digits.
pub fn resample(trace: &RawTrace, target_points: usize) -> ResampledTrace {
    let filtered: Vec<&TelemetrySample> =
        trace.samples.iter().filter(|s| s.distance.is_some()).collect();

    let distances: Vec<f64> = filtered.iter().map(|s| s.distance.unwrap_or(0.0)).collect();

    if filtered.len() < 2 {
        return passthrough(&filtered, distances);
    }

    let dmin = distances.iter().copied().fold(f64::INFINITY, f64::min);
    let dmax = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if dmax <= dmin {
        return passthrough(&filtered, distances);
    }

    // Grid must have at least the two span endpoints to be meaningful
    let n = target_points.max(2);
    let mut grid = Vec::with_capacity(n);
    let step = (dmax - dmin) / (n - 1) as f64;
    for i in 0..n {
        grid.push(dmin + step * i as f64);
    }
    // Pin the last point so the span is exactly [min, max] despite rounding
    grid[n - 1] = dmax;

    let onto_grid = |values: Vec<Option<f64>>| -> Option<Vec<f64>> {
        let filled = fill_gaps(&values)?;
        Some(
            grid.iter()
                .map(|&g| round_channel(interp(g, &distances, &filled)))
                .collect(),
        )
    };

    ResampledTrace {
        speed: onto_grid(filtered.iter().map(|s| s.speed).collect()),
        throttle: onto_grid(filtered.iter().map(|s| s.throttle).collect()),
        brake: onto_grid(filtered.iter().map(|s| s.brake).collect()),
        gear: onto_grid(filtered.iter().map(|s| s.gear).collect()),
        drs: onto_grid(filtered.iter().map(|s| s.drs).collect()),
        pos_x: onto_grid(filtered.iter().map(|s| s.pos_x).collect()),
        pos_y: onto_grid(filtered.iter().map(|s| s.pos_y).collect()),
        distance: grid,
    }
}

/// Degenerate-input path: return the filtered samples on their own distances.
/// Channel gap fill still applies, so present channels stay fully defined.
fn passthrough(filtered: &[&TelemetrySample], distances: Vec<f64>) -> ResampledTrace {
    let channel = |values: Vec<Option<f64>>| -> Option<Vec<f64>> {
        Some(fill_gaps(&values)?.into_iter().map(round_channel).collect())
    };

    ResampledTrace {
        speed: channel(filtered.iter().map(|s| s.speed).collect()),
        throttle: channel(filtered.iter().map(|s| s.throttle).collect()),
        brake: channel(filtered.iter().map(|s| s.brake).collect()),
        gear: channel(filtered.iter().map(|s| s.gear).collect()),
        drs: channel(filtered.iter().map(|s| s.drs).collect()),
        pos_x: channel(filtered.iter().map(|s| s.pos_x).collect()),
        pos_y: channel(filtered.iter().map(|s| s.pos_y).collect()),
        distance: distances,
    }
}

/// Fill undefined entries by linear interpolation over sample index, holding
/// the nearest defined value at both edges. Returns `None` when the channel
/// is entirely undefined (the channel is then omitted from the output).
fn fill_gaps(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let first_defined = values.iter().position(|v| v.is_some())?;
    let last_defined = values.iter().rposition(|v| v.is_some())?;

    let mut filled = Vec::with_capacity(values.len());

    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => filled.push(*v),
            None if i < first_defined => {
                filled.push(values[first_defined].unwrap_or(0.0));
            }
            None if i > last_defined => {
                filled.push(values[last_defined].unwrap_or(0.0));
            }
            None => {
                // Interior gap: interpolate between the surrounding defined
                // values, linear over sample index
                let prev = values[..i].iter().rposition(|v| v.is_some()).unwrap_or(0);
                let next = i + values[i..]
                    .iter()
                    .position(|v| v.is_some())
                    .unwrap_or(0);
                let y0 = values[prev].unwrap_or(0.0);
                let y1 = values[next].unwrap_or(0.0);
                let t = (i - prev) as f64 / (next - prev) as f64;
                filled.push(y0 + (y1 - y0) * t);
            }
        }
    }

    Some(filled)
}

/// Linear interpolation of `(xs, ys)` at `x`, clamping outside the span.
///
/// `xs` is the filtered distance sequence, which is monotonic-ish; equal
/// neighboring distances fall back to the later sample's value.
fn interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }

    let k = xs.partition_point(|&d| d < x);
    let (x0, x1) = (xs[k - 1], xs[k]);
    if x1 <= x0 {
        return ys[k];
    }
    let t = (x - x0) / (x1 - x0);
    ys[k - 1] + (ys[k] - ys[k - 1]) * t
}

fn round_channel(v: f64) -> f64 {
    (v * CHANNEL_DECIMALS).round() / CHANNEL_DECIMALS
}
