// 💰 Revenue Aggregator
// Yearly revenue buckets over a configured window, and year-over-year deltas.

use crate::config::YearRange;
use crate::error::{ErrorScope, ItemError};
use crate::ledger::Transaction;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTotal {
    pub year: i32,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearDelta {
    pub year: i32,
    pub delta: i64,
}

/// One integer bucket per year in the range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyRevenue {
    pub range: YearRange,
    totals: Vec<i64>,
}

impl YearlyRevenue {
    pub fn empty(range: YearRange) -> Self {
        YearlyRevenue {
            range,
            totals: vec![0; range.len()],
        }
    }

    /// Sum transaction amounts per calendar year.
    ///
    /// The running bucket is truncated toward zero after every addition, so
    /// fractional cents are lost per transaction. Transactions outside the
    /// range are skipped and returned as item errors.
    pub fn aggregate(transactions: &[Transaction], range: YearRange) -> (Self, Vec<ItemError>) {
        let mut revenue = YearlyRevenue::empty(range);
        let mut errors = Vec::new();

        for tx in transactions {
            match range.index_of(tx.year()) {
                Ok(index) => {
                    let bucket = &mut revenue.totals[index];
                    *bucket = (*bucket as f64 + tx.amount) as i64;
                }
                Err(e) => {
                    warn!(transaction = tx.id, year = tx.year(), "transaction outside year range");
                    errors.push(ItemError::new(ErrorScope::Transaction, tx.id, &e));
                }
            }
        }

        debug!(
            years = range.len(),
            skipped = errors.len(),
            "revenue aggregated"
        );

        (revenue, errors)
    }

    pub fn total(&self, year: i32) -> Option<i64> {
        self.range.index_of(year).ok().map(|i| self.totals[i])
    }

    pub fn totals(&self) -> Vec<YearTotal> {
        self.range
            .years()
            .zip(self.totals.iter())
            .map(|(year, total)| YearTotal { year, total: *total })
            .collect()
    }

    /// delta[start] = bucket[start]; delta[y] = bucket[y] - bucket[y-1]
    pub fn deltas(&self) -> Vec<YearDelta> {
        let mut previous = 0;
        self.range
            .years()
            .zip(self.totals.iter())
            .map(|(year, total)| {
                let delta = YearDelta {
                    year,
                    delta: total - previous,
                };
                previous = *total;
                delta
            })
            .collect()
    }

    pub fn grand_total(&self) -> i64 {
        self.totals.iter().sum()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(id: u64, year: i32, amount: f64) -> Transaction {
        Transaction {
            id,
            subscription_id: 1,
            amount,
            date: NaiveDate::from_ymd_opt(year, 6, 1).unwrap(),
            line_number: id as usize,
        }
    }

    fn range(start: i32, end: i32) -> YearRange {
        YearRange::new(start, end).unwrap()
    }

    #[test]
    fn test_buckets_and_deltas() {
        let (revenue, errors) = YearlyRevenue::aggregate(
            &[tx(1, 2000, 10.0), tx(2, 2000, 20.0), tx(3, 2001, 5.0)],
            range(2000, 2001),
        );

        assert!(errors.is_empty());
        assert_eq!(revenue.total(2000), Some(30));
        assert_eq!(revenue.total(2001), Some(5));

        let deltas = revenue.deltas();
        assert_eq!(deltas[0], YearDelta { year: 2000, delta: 30 });
        assert_eq!(deltas[1], YearDelta { year: 2001, delta: -25 });
    }

    #[test]
    fn test_truncation_happens_per_addition() {
        // 0 + 10.5 -> 10, 10 + 10.5 -> 20, 20 + 10.5 -> 30
        let (revenue, _) = YearlyRevenue::aggregate(
            &[tx(1, 2000, 10.5), tx(2, 2000, 10.5), tx(3, 2000, 10.5)],
            range(2000, 2000),
        );
        assert_eq!(revenue.total(2000), Some(30));
    }

    #[test]
    fn test_out_of_range_rejected_without_touching_neighbours() {
        let (revenue, errors) = YearlyRevenue::aggregate(
            &[tx(1, 1999, 100.0), tx(2, 2000, 1.0), tx(3, 2002, 100.0)],
            range(2000, 2001),
        );

        assert_eq!(revenue.total(2000), Some(1));
        assert_eq!(revenue.total(2001), Some(0));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].id, "1");
        assert_eq!(errors[0].code, "out_of_range");
        assert_eq!(errors[1].id, "3");
    }

    #[test]
    fn test_empty_years_are_zero() {
        let (revenue, _) = YearlyRevenue::aggregate(&[tx(1, 2002, 7.0)], range(2000, 2003));

        let totals = revenue.totals();
        assert_eq!(totals.len(), 4);
        assert_eq!(totals[0], YearTotal { year: 2000, total: 0 });
        assert_eq!(totals[2], YearTotal { year: 2002, total: 7 });
        assert_eq!(revenue.deltas()[3].delta, -7);
        assert_eq!(revenue.grand_total(), 7);
        assert_eq!(revenue.total(1999), None);
    }
}
