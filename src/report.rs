// 📋 Analysis Report
// Runs the whole pipeline over one ledger snapshot and exposes the results
// through read-only accessors. Every call is an independent computation.

use crate::classifier::{classify_all, CadenceType, Classification, ClassificationReport};
use crate::config::AnalysisConfig;
use crate::error::{ItemError, Result};
use crate::forecast::{forecast_all, Forecast};
use crate::ledger::Ledger;
use crate::quality::{check_store, QualityReport};
use crate::ranking::{top_growth, top_loss};
use crate::revenue::{YearDelta, YearTotal, YearlyRevenue};
use crate::store::{RecordStore, SubscriptionId};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    pub id: SubscriptionId,
    pub cadence: CadenceType,
    pub duration: String,
    pub unit_price: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    pub fingerprint: String,
    pub transaction_count: usize,
    pub classification: ClassificationReport,
    pub subscriptions: Vec<SubscriptionSummary>,
    pub revenue: YearlyRevenue,
    pub deltas: Vec<YearDelta>,
    pub growth_years: Vec<i32>,
    pub loss_years: Vec<i32>,
    pub forecast: Forecast,
    pub quality: QualityReport,

    /// Records, transactions, subscriptions and cadences that were skipped
    pub errors: Vec<ItemError>,
}

/// Run classification, aggregation, ranking and forecasting over a ledger
pub fn analyze(ledger: &Ledger, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;
    let range = config.year_range()?;

    let store = RecordStore::ingest(&ledger.transactions);
    info!(
        transactions = ledger.len(),
        subscriptions = store.len(),
        "record store built"
    );

    let classification = classify_all(&store);
    let subscriptions = summarize(&store, &classification);

    let (revenue, revenue_errors) = YearlyRevenue::aggregate(&ledger.transactions, range);
    let deltas = revenue.deltas();
    let growth_years = top_growth(&deltas, config.top_k)?;
    let loss_years = top_loss(&deltas, config.top_k)?;

    let forecast = forecast_all(&classification, &store, config.end_year)?;
    let quality = check_store(&store);

    let errors: Vec<ItemError> = ledger
        .rejected
        .iter()
        .chain(revenue_errors.iter())
        .chain(classification.errors.iter())
        .chain(forecast.errors.iter())
        .cloned()
        .collect();

    info!(
        subscriptions = subscriptions.len(),
        errors = errors.len(),
        forecast = forecast.total(),
        "analysis complete"
    );

    Ok(AnalysisReport {
        config: config.clone(),
        fingerprint: ledger.fingerprint(),
        transaction_count: ledger.len(),
        classification,
        subscriptions,
        revenue,
        deltas,
        growth_years,
        loss_years,
        forecast,
        quality,
        errors,
    })
}

fn summarize(store: &RecordStore, classification: &ClassificationReport) -> Vec<SubscriptionSummary> {
    store
        .iter()
        .filter_map(|sub| {
            classification.results.get(&sub.id).map(|c| SubscriptionSummary {
                id: sub.id,
                cadence: c.cadence,
                duration: c.duration.clone(),
                unit_price: sub.unit_price,
                transaction_count: sub.transaction_count(),
            })
        })
        .collect()
}

impl AnalysisReport {
    pub fn classification_of(&self, id: SubscriptionId) -> Option<&Classification> {
        self.classification.results.get(&id)
    }

    pub fn subscription(&self, id: SubscriptionId) -> Option<&SubscriptionSummary> {
        self.subscriptions.iter().find(|s| s.id == id)
    }

    pub fn yearly_totals(&self) -> Vec<YearTotal> {
        self.revenue.totals()
    }

    pub fn delta_of(&self, year: i32) -> Option<i64> {
        crate::ranking::delta_of(&self.deltas, year)
    }

    /// Re-rank with a different k without recomputing anything else
    pub fn rankings(&self, k: usize) -> Result<(Vec<i32>, Vec<i32>)> {
        Ok((top_growth(&self.deltas, k)?, top_loss(&self.deltas, k)?))
    }

    pub fn forecast_total(&self) -> f64 {
        self.forecast.total()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} transactions, {} subscriptions, {} years, forecast {} = {:.2}, {} errors",
            self.transaction_count,
            self.subscriptions.len(),
            self.deltas.len(),
            self.forecast.year,
            self.forecast_total(),
            self.errors.len()
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::ledger::read_ledger;

    const LEDGER: &str = "Id,Subscription Id,Amount,Transaction Date
1,1,10,1/1/2011
2,1,10,1/2/2011
3,2,20,3/5/2012
4,2,20,4/5/2012
5,1,10,1/3/2011
6,3,50,7/7/2013
7,2,20,5/5/2014
8,4,5,8/8/1999
";

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            start_year: 2010,
            end_year: 2014,
            top_k: 2,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_analyze_end_to_end() {
        let ledger = read_ledger(LEDGER.as_bytes(), true).unwrap();
        let report = analyze(&ledger, &config()).unwrap();

        assert_eq!(report.transaction_count, 8);
        assert_eq!(report.subscriptions.len(), 4);
        assert_eq!(report.classification_of(1).unwrap().cadence, CadenceType::Daily);
        assert_eq!(report.classification_of(2).unwrap().duration, "3 months");
        assert_eq!(report.classification_of(3).unwrap().cadence, CadenceType::OneOff);

        assert_eq!(report.revenue.total(2011), Some(30));
        assert_eq!(report.revenue.total(2012), Some(40));
        assert_eq!(report.delta_of(2013), Some(10));
        // 2012 and 2013 both grew by 10; the earlier year wins
        assert_eq!(report.growth_years, vec![2011, 2012]);
        assert_eq!(report.loss_years, vec![2014]);

        // 1999 falls outside the window; YEARLY has no subscriptions
        assert!(report.errors.iter().any(|e| e.code == "out_of_range" && e.id == "8"));
        assert!(report.errors.iter().any(|e| e.id == "YEARLY"));

        // Monthly sub 2 is active in 2014 with flat churn -> 20 * 12
        assert_eq!(report.forecast.for_cadence(CadenceType::Monthly).unwrap().returning_revenue, 240.0);
        assert!(report.summary().contains("forecast 2015"));
    }

    #[test]
    fn test_analysis_is_repeatable() {
        let ledger = read_ledger(LEDGER.as_bytes(), true).unwrap();
        let first = analyze(&ledger, &config()).unwrap();
        let second = analyze(&ledger, &config()).unwrap();

        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.growth_years, second.growth_years);
        assert_eq!(first.forecast, second.forecast);
    }

    #[test]
    fn test_rankings_with_other_k() {
        let ledger = read_ledger(LEDGER.as_bytes(), true).unwrap();
        let report = analyze(&ledger, &config()).unwrap();

        let (growth, loss) = report.rankings(1).unwrap();
        assert_eq!(growth, vec![2011]);
        assert_eq!(loss, vec![2014]);
        assert!(report.rankings(6).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let ledger = read_ledger(LEDGER.as_bytes(), true).unwrap();
        let bad = AnalysisConfig {
            top_k: 0,
            ..config()
        };
        assert!(matches!(
            analyze(&ledger, &bad),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }
}
