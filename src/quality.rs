// ✅ Ledger Quality Checks
// The analysis trusts two properties of the input that nobody enforces:
// one price per subscription, and dates in ascending order per subscription.
// These checks surface violations without changing any result.

use crate::store::{RecordStore, Subscription, SubscriptionId};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Amounts closer than this count as the same price
const PRICE_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning, // Result may be skewed (price or order assumption broken)
    Info,    // Unusual but harmless
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub subscription_id: SubscriptionId,
    pub rule_name: String,
    pub severity: Severity,
    pub message: String,
}

impl QualityIssue {
    fn new(sub: &Subscription, rule_name: &str, severity: Severity, message: String) -> Self {
        QualityIssue {
            subscription_id: sub.id,
            rule_name: rule_name.to_string(),
            severity,
            message,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub checked: usize,
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    pub fn summary(&self) -> String {
        format!(
            "{} subscriptions checked, {} issues ({} warnings)",
            self.checked,
            self.issues.len(),
            self.warning_count()
        )
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Run every rule over every subscription
pub fn check_store(store: &RecordStore) -> QualityReport {
    let mut report = QualityReport::default();

    for sub in store.iter() {
        report.checked += 1;
        report.issues.extend(check_price_consistency(sub));
        report.issues.extend(check_date_order(sub));
        report.issues.extend(check_duplicate_dates(sub));
    }

    for issue in &report.issues {
        warn!(
            subscription = issue.subscription_id,
            rule = %issue.rule_name,
            "{}",
            issue.message
        );
    }

    report
}

// ============================================================================
// RULES
// ============================================================================

fn check_price_consistency(sub: &Subscription) -> Option<QualityIssue> {
    let differing = sub
        .amounts()
        .iter()
        .filter(|a| (**a - sub.unit_price).abs() > PRICE_TOLERANCE)
        .count();

    (differing > 0).then(|| {
        QualityIssue::new(
            sub,
            "price_consistent",
            Severity::Warning,
            format!(
                "{} of {} transactions differ from unit price {:.2}",
                differing,
                sub.amounts().len(),
                sub.unit_price
            ),
        )
    })
}

fn check_date_order(sub: &Subscription) -> Option<QualityIssue> {
    let position = sub.dates.windows(2).position(|w| w[1] < w[0])?;

    Some(QualityIssue::new(
        sub,
        "dates_ascending",
        Severity::Warning,
        format!(
            "transaction {} ({}) is earlier than the one before it ({})",
            position + 2,
            sub.dates[position + 1],
            sub.dates[position]
        ),
    ))
}

fn check_duplicate_dates(sub: &Subscription) -> Option<QualityIssue> {
    let duplicates = sub.dates.windows(2).filter(|w| w[0] == w[1]).count();

    (duplicates > 0).then(|| {
        QualityIssue::new(
            sub,
            "dates_distinct",
            Severity::Info,
            format!("{} repeated transaction dates", duplicates),
        )
    })
}

// ============================================================================
// TESTS
// ============================================================================
