// 📈 Growth / Loss Ranker
// k-pass selection of the years with the largest revenue gains and losses.

use crate::error::{AnalysisError, Result};
use crate::revenue::YearDelta;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankDirection {
    Growth,
    Loss,
}

impl RankDirection {
    /// Does `candidate` beat the current best in this direction?
    fn beats(&self, candidate: i64, best: i64) -> bool {
        match self {
            RankDirection::Growth => candidate > best,
            RankDirection::Loss => candidate < best,
        }
    }
}

/// Years with the highest positive deltas, best first
pub fn top_growth(deltas: &[YearDelta], k: usize) -> Result<Vec<i32>> {
    select(deltas, k, RankDirection::Growth)
}

/// Years with the lowest negative deltas, worst first
pub fn top_loss(deltas: &[YearDelta], k: usize) -> Result<Vec<i32>> {
    select(deltas, k, RankDirection::Loss)
}

/// Each round scans every year in order and keeps the strictly best delta
/// not picked yet, so ties go to the earliest year. Only strictly positive
/// (growth) or strictly negative (loss) deltas qualify; when a round finds
/// nothing the selection stops early.
pub fn select(deltas: &[YearDelta], k: usize, direction: RankDirection) -> Result<Vec<i32>> {
    if k > deltas.len() {
        return Err(AnalysisError::InvalidArgument(format!(
            "cannot rank {} years out of {}",
            k,
            deltas.len()
        )));
    }

    let mut picked: Vec<i32> = Vec::with_capacity(k);

    while picked.len() < k {
        let mut best: Option<&YearDelta> = None;

        for candidate in deltas {
            if picked.contains(&candidate.year) {
                continue;
            }
            let threshold = best.map_or(0, |b| b.delta);
            if direction.beats(candidate.delta, threshold) {
                best = Some(candidate);
            }
        }

        match best {
            Some(winner) => picked.push(winner.year),
            None => break,
        }
    }

    Ok(picked)
}

/// Look up the delta of a picked year
pub fn delta_of(deltas: &[YearDelta], year: i32) -> Option<i64> {
    deltas.iter().find(|d| d.year == year).map(|d| d.delta)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(values: &[i64]) -> Vec<YearDelta> {
        values
            .iter()
            .enumerate()
            .map(|(i, delta)| YearDelta {
                year: 2000 + i as i32,
                delta: *delta,
            })
            .collect()
    }

    #[test]
    fn test_unique_maximum_wins() {
        let d = deltas(&[5, -3, 40, 12, -20]);
        assert_eq!(top_growth(&d, 1).unwrap(), vec![2002]);
        assert_eq!(top_loss(&d, 1).unwrap(), vec![2004]);
    }

    #[test]
    fn test_repeated_calls_are_independent() {
        let d = deltas(&[5, -3, 40, 12, -20]);
        assert_eq!(top_growth(&d, 1).unwrap(), top_growth(&d, 1).unwrap());
    }

    #[test]
    fn test_ordering_and_exclusion() {
        let d = deltas(&[5, -3, 40, 12, -20]);
        assert_eq!(top_growth(&d, 3).unwrap(), vec![2002, 2003, 2000]);
        assert_eq!(top_loss(&d, 2).unwrap(), vec![2004, 2001]);
    }

    #[test]
    fn test_ties_go_to_earliest_year() {
        let d = deltas(&[7, 7, -1, -1]);
        assert_eq!(top_growth(&d, 2).unwrap(), vec![2000, 2001]);
        assert_eq!(top_loss(&d, 2).unwrap(), vec![2002, 2003]);
    }

    #[test]
    fn test_clamps_when_not_enough_qualifying_years() {
        let d = deltas(&[0, 3, 0, -2]);
        assert_eq!(top_growth(&d, 4).unwrap(), vec![2001]);
        assert_eq!(top_loss(&d, 4).unwrap(), vec![2003]);

        let flat = deltas(&[0, 0, 0]);
        assert!(top_growth(&flat, 3).unwrap().is_empty());
    }

    #[test]
    fn test_k_larger_than_range_is_invalid() {
        let d = deltas(&[1, 2]);
        assert!(matches!(top_growth(&d, 3), Err(AnalysisError::InvalidArgument(_))));
    }

    #[test]
    fn test_delta_lookup() {
        let d = deltas(&[1, -9]);
        assert_eq!(delta_of(&d, 2001), Some(-9));
        assert_eq!(delta_of(&d, 1990), None);
    }
}
