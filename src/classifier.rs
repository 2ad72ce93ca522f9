// 🏷️ Cadence Classifier
// Infers how a subscription bills (one-off, daily, monthly, yearly) from the
// spacing of its first two transactions, and describes how long it ran.

use crate::error::{AnalysisError, ErrorScope, ItemError, Result};
use crate::store::{RecordStore, SubscriptionId};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

// ============================================================================
// CADENCE TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CadenceType {
    OneOff,
    Daily,
    Monthly,
    Yearly,
}

impl CadenceType {
    /// Cadences that recur, in forecasting order
    pub const RECURRING: [CadenceType; 3] =
        [CadenceType::Daily, CadenceType::Monthly, CadenceType::Yearly];

    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            CadenceType::OneOff => "One-off",
            CadenceType::Daily => "Daily",
            CadenceType::Monthly => "Monthly",
            CadenceType::Yearly => "Yearly",
        }
    }

    /// Short code, as printed in the subscription listing
    pub fn code(&self) -> &str {
        match self {
            CadenceType::OneOff => "ONEOFF",
            CadenceType::Daily => "DAILY",
            CadenceType::Monthly => "MONTHLY",
            CadenceType::Yearly => "YEARLY",
        }
    }

    /// Billing events in a full year; None for one-off purchases
    pub fn transactions_per_year(&self) -> Option<u32> {
        match self {
            CadenceType::OneOff => None,
            CadenceType::Daily => Some(365),
            CadenceType::Monthly => Some(12),
            CadenceType::Yearly => Some(1),
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, CadenceType::OneOff)
    }
}

impl std::fmt::Display for CadenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub cadence: CadenceType,
    pub duration: String,
}

/// Classify a date sequence. Pure: same dates, same answer.
pub fn classify(dates: &[NaiveDate]) -> Result<Classification> {
    let count = dates.len();

    let (first, second) = match dates {
        [] => {
            return Err(AnalysisError::InvalidArgument(
                "cannot classify a subscription without transactions".to_string(),
            ))
        }
        [_] => {
            return Ok(Classification {
                cadence: CadenceType::OneOff,
                duration: "1 day".to_string(),
            })
        }
        [first, second, ..] => (*first, *second),
    };

    let (cadence, duration) = if second.day() != first.day() {
        (CadenceType::Daily, format!("{} days", count))
    } else if second.month() != first.month() {
        (CadenceType::Monthly, monthly_duration(count))
    } else if second.year() != first.year() {
        (CadenceType::Yearly, format!("{} years", count))
    } else {
        return Err(AnalysisError::UndefinedCadence { first, second });
    };

    Ok(Classification { cadence, duration })
}

/// "1 year and 2 months, or 14 months", "2 years, or 24 months", "5 months"
fn monthly_duration(months: usize) -> String {
    let years = months / 12;
    let remainder = months % 12;
    let mut duration = String::new();

    if years > 0 {
        duration.push_str(&format!("{} {}", years, plural(years, "year")));
    }
    if remainder != 0 {
        if years > 0 {
            duration.push_str(" and ");
        }
        duration.push_str(&format!("{} {}", remainder, plural(remainder, "month")));
    }
    if years > 0 {
        duration.push_str(&format!(", or {} months", months));
    }

    duration
}

fn plural(n: usize, unit: &str) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{}s", unit)
    }
}

// ============================================================================
// GROUPING
// ============================================================================

/// Every subscription's classification, grouped by recurring cadence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub results: BTreeMap<SubscriptionId, Classification>,

    /// Recurring cadences only; ids ascending
    pub groups: BTreeMap<CadenceType, Vec<SubscriptionId>>,

    pub errors: Vec<ItemError>,
}

impl ClassificationReport {
    pub fn ids_of(&self, cadence: CadenceType) -> &[SubscriptionId] {
        self.groups.get(&cadence).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count_of(&self, cadence: CadenceType) -> usize {
        self.results.values().filter(|c| c.cadence == cadence).count()
    }
}

/// Classify every subscription and fold the results into cadence groups
pub fn classify_all(store: &RecordStore) -> ClassificationReport {
    let mut report = ClassificationReport::default();

    for sub in store.iter() {
        match classify(&sub.dates) {
            Ok(classification) => {
                debug!(
                    subscription = sub.id,
                    cadence = %classification.cadence,
                    duration = %classification.duration,
                    "classified"
                );
                if classification.cadence.is_recurring() {
                    report
                        .groups
                        .entry(classification.cadence)
                        .or_default()
                        .push(sub.id);
                }
                report.results.insert(sub.id, classification);
            }
            Err(e) => {
                warn!(subscription = sub.id, error = %e, "could not classify subscription");
                report
                    .errors
                    .push(ItemError::new(ErrorScope::Subscription, sub.id, &e));
            }
        }
    }

    report
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Transaction;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(start_year: i32, count: usize) -> Vec<NaiveDate> {
        (0..count)
            .map(|i| date(start_year + (i / 12) as i32, (i % 12) as u32 + 1, 15))
            .collect()
    }

    #[test]
    fn test_single_transaction_is_one_off() {
        let c = classify(&[date(2000, 5, 5)]).unwrap();
        assert_eq!(c.cadence, CadenceType::OneOff);
        assert_eq!(c.duration, "1 day");
    }

    #[test]
    fn test_consecutive_days_are_daily() {
        let c = classify(&[date(2000, 5, 1), date(2000, 5, 2), date(2000, 5, 3)]).unwrap();
        assert_eq!(c.cadence, CadenceType::Daily);
        assert_eq!(c.duration, "3 days");
    }

    #[test]
    fn test_fourteen_months() {
        let c = classify(&monthly(2000, 14)).unwrap();
        assert_eq!(c.cadence, CadenceType::Monthly);
        assert_eq!(c.duration, "1 year and 2 months, or 14 months");
    }

    #[test]
    fn test_twenty_four_months() {
        let c = classify(&monthly(2000, 24)).unwrap();
        assert_eq!(c.duration, "2 years, or 24 months");
    }

    #[test]
    fn test_short_and_singular_month_durations() {
        assert_eq!(classify(&monthly(2000, 5)).unwrap().duration, "5 months");
        assert_eq!(classify(&monthly(2000, 12)).unwrap().duration, "1 year, or 12 months");
        assert_eq!(
            classify(&monthly(2000, 13)).unwrap().duration,
            "1 year and 1 month, or 13 months"
        );
    }

    #[test]
    fn test_same_day_and_month_next_year_is_yearly() {
        let c = classify(&[date(2000, 3, 9), date(2001, 3, 9), date(2002, 3, 9)]).unwrap();
        assert_eq!(c.cadence, CadenceType::Yearly);
        assert_eq!(c.duration, "3 years");
    }

    #[test]
    fn test_identical_first_dates_are_undefined() {
        let err = classify(&[date(2000, 3, 9), date(2000, 3, 9)]).unwrap_err();
        assert!(matches!(err, AnalysisError::UndefinedCadence { .. }));
    }

    #[test]
    fn test_empty_dates_rejected() {
        assert!(matches!(classify(&[]), Err(AnalysisError::InvalidArgument(_))));
    }

    #[test]
    fn test_classification_is_pure() {
        let dates = monthly(1999, 30);
        assert_eq!(classify(&dates).unwrap(), classify(&dates).unwrap());
    }

    #[test]
    fn test_only_first_two_dates_matter() {
        // Later spacing is ignored
        let c = classify(&[date(2000, 1, 1), date(2000, 1, 2), date(2005, 7, 2)]).unwrap();
        assert_eq!(c.cadence, CadenceType::Daily);
    }

    #[test]
    fn test_classify_all_groups_and_isolates_errors() {
        let rows = [
            (1, 5, date(2000, 1, 1)),
            (2, 5, date(2000, 1, 2)),
            (3, 2, date(2000, 1, 1)),
            (4, 8, date(2000, 1, 1)),
            (5, 8, date(2000, 1, 1)),
            (6, 1, date(2000, 1, 10)),
            (7, 1, date(2000, 2, 10)),
            (8, 3, date(2000, 1, 3)),
            (9, 3, date(2000, 1, 4)),
        ];
        let txs: Vec<Transaction> = rows
            .iter()
            .map(|(id, sub, d)| Transaction {
                id: *id,
                subscription_id: *sub,
                amount: 1.0,
                date: *d,
                line_number: *id as usize,
            })
            .collect();
        let store = RecordStore::ingest(&txs);

        let report = classify_all(&store);

        assert_eq!(report.results.len(), 4);
        assert_eq!(report.results[&2].cadence, CadenceType::OneOff);
        assert_eq!(report.ids_of(CadenceType::Daily), &[3, 5]);
        assert_eq!(report.ids_of(CadenceType::Monthly), &[1]);
        assert!(report.ids_of(CadenceType::Yearly).is_empty());
        assert!(!report.groups.contains_key(&CadenceType::OneOff));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].id, "8");
        assert_eq!(report.count_of(CadenceType::Daily), 2);
    }

    #[test]
    fn test_transactions_per_year() {
        assert_eq!(CadenceType::Daily.transactions_per_year(), Some(365));
        assert_eq!(CadenceType::Monthly.transactions_per_year(), Some(12));
        assert_eq!(CadenceType::Yearly.transactions_per_year(), Some(1));
        assert_eq!(CadenceType::OneOff.transactions_per_year(), None);
    }
}
