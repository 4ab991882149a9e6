//! Race position, gap and interval derivation from cumulative elapsed time.
//!
//! Positions are derived by sorting drivers on cumulative race time rather
//! than trusting the source's reported position field, which can be stale,
//! missing, or skewed around pit stops. Deriving from raw time keeps the
//! ranking self-consistent and avoids propagating upstream labeling errors.

use crate::types::LapRow;
use serde::{Deserialize, Serialize};

/// One driver's derived standing on a single lap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapStanding {
    pub driver_code: String,
    /// 1 = leader
    pub position: i32,
    /// `None` for the leader by definition
    pub gap_to_leader_ms: Option<i64>,
    /// `None` for the leader by definition
    pub interval_ms: Option<i64>,
}

/// All standings derived for one lap number of a race session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLap {
    pub lap_number: i32,
    pub standings: Vec<LapStanding>,
}

/// Rank all drivers' rows for a single lap number.
///
/// Rows without a cumulative time are excluded: they neither receive a
/// position nor count toward anyone else's gap. The remainder is sorted
/// ascending by cumulative time; sort position (1-based) is the race
/// position. Gap and interval are non-negative by construction.
pub fn rank_lap(rows: &[&LapRow]) -> Vec<LapStanding> {
    let mut timed: Vec<(&str, i64)> = rows
        .iter()
        .filter_map(|row| {
            row.cumulative_time_ms
                .map(|t| (row.driver_code.as_str(), t))
        })
        .collect();
    timed.sort_by_key(|&(_, t)| t);

    let leader_time = match timed.first() {
        Some(&(_, t)) => t,
        None => return Vec::new(),
    };

    let mut previous_time = leader_time;
    timed
        .iter()
        .enumerate()
        .map(|(i, &(code, time))| {
            let leading = i == 0;
            let standing = LapStanding {
                driver_code: code.to_string(),
                position: i as i32 + 1,
                gap_to_leader_ms: (!leading).then(|| time - leader_time),
                interval_ms: (!leading).then(|| time - previous_time),
            };
            previous_time = time;
            standing
        })
        .collect()
}

/// Rank every lap number of a race session independently.
///
/// Lap numbers run 1..=max observed; a lap number where no driver has a
/// defined cumulative time produces no entry (not an error).
pub fn rank_session(laps: &[LapRow]) -> Vec<RankedLap> {
    let max_lap = laps.iter().filter_map(|l| l.lap_number).max().unwrap_or(0);

    (1..=max_lap)
        .filter_map(|lap_number| {
            let rows: Vec<&LapRow> = laps
                .iter()
                .filter(|l| l.lap_number == Some(lap_number))
                .collect();
            let standings = rank_lap(&rows);
            if standings.is_empty() {
                None
            } else {
                Some(RankedLap { lap_number, standings })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(code: &str, lap: i32, cumulative_ms: Option<i64>) -> LapRow {
        LapRow {
            driver_code: code.to_string(),
            lap_number: Some(lap),
            cumulative_time_ms: cumulative_ms,
            ..Default::default()
        }
    }

    #[test]
    fn ranks_by_cumulative_time_with_gaps_and_intervals() {
        let a = row("A", 5, Some(61_000));
        let b = row("B", 5, Some(60_000));
        let c = row("C", 5, Some(62_500));

        let standings = rank_lap(&[&a, &b, &c]);

        assert_eq!(standings.len(), 3);

        assert_eq!(standings[0].driver_code, "B");
        assert_eq!(standings[0].position, 1);
        assert_eq!(standings[0].gap_to_leader_ms, None);
        assert_eq!(standings[0].interval_ms, None);

        assert_eq!(standings[1].driver_code, "A");
        assert_eq!(standings[1].position, 2);
        assert_eq!(standings[1].gap_to_leader_ms, Some(1_000));
        assert_eq!(standings[1].interval_ms, Some(1_000));

        assert_eq!(standings[2].driver_code, "C");
        assert_eq!(standings[2].position, 3);
        assert_eq!(standings[2].gap_to_leader_ms, Some(2_500));
        assert_eq!(standings[2].interval_ms, Some(1_500));
    }

    #[test]
    fn undefined_cumulative_time_is_excluded_without_affecting_others() {
        let a = row("A", 5, Some(61_000));
        let b = row("B", 5, Some(60_000));
        let missing = row("X", 5, None);
        let c = row("C", 5, Some(62_500));

        let standings = rank_lap(&[&a, &b, &missing, &c]);

        assert_eq!(standings.len(), 3);
        assert!(standings.iter().all(|s| s.driver_code != "X"));
        // C's interval is still measured against A, not the excluded row
        assert_eq!(standings[2].interval_ms, Some(1_500));
    }

    #[test]
    fn lap_with_no_timed_drivers_yields_no_standings() {
        let a = row("A", 3, None);
        let b = row("B", 3, None);
        assert!(rank_lap(&[&a, &b]).is_empty());
    }

    #[test]
    fn rank_session_covers_observed_lap_numbers_only() {
        let laps = vec![
            row("A", 1, Some(90_000)),
            row("B", 1, Some(91_000)),
            // Nobody has a time on lap 2
            row("A", 2, None),
            row("A", 3, Some(272_000)),
        ];

        let ranked = rank_session(&laps);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].lap_number, 1);
        assert_eq!(ranked[1].lap_number, 3);
        assert_eq!(ranked[1].standings.len(), 1);
        assert_eq!(ranked[1].standings[0].position, 1);
    }

    #[test]
    fn empty_session_yields_no_ranked_laps() {
        assert!(rank_session(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_gaps_and_intervals_are_non_negative_and_consistent(
            times in prop::collection::vec(0i64..10_000_000, 1..30),
        ) {
            let rows: Vec<LapRow> = times
                .iter()
                .enumerate()
                .map(|(i, &t)| row(&format!("D{i}"), 1, Some(t)))
                .collect();
            let refs: Vec<&LapRow> = rows.iter().collect();

            let standings = rank_lap(&refs);
            prop_assert_eq!(standings.len(), rows.len());

            // Positions are 1..=n in order
            for (i, s) in standings.iter().enumerate() {
                prop_assert_eq!(s.position, i as i32 + 1);
            }

            // Leader carries no gap or interval; everyone else non-negative,
            // and gaps are the running sum of intervals
            prop_assert_eq!(standings[0].gap_to_leader_ms, None);
            prop_assert_eq!(standings[0].interval_ms, None);

            let mut running = 0i64;
            for s in &standings[1..] {
                let gap = s.gap_to_leader_ms.expect("non-leader has a gap");
                let interval = s.interval_ms.expect("non-leader has an interval");
                prop_assert!(gap >= 0);
                prop_assert!(interval >= 0);
                running += interval;
                prop_assert_eq!(gap, running);
            }
        }
    }
}
