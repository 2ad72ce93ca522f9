// 🔮 Revenue Forecaster
// Projects next year's revenue per cadence type from two trends:
//
//   returning subscribers: how churn moved between the last two years
//   new subscribers:       how sign-ups moved between the last two years
//
// Both are simple one-step continuations of the latest change.

use crate::classifier::{CadenceType, ClassificationReport};
use crate::error::{AnalysisError, ErrorScope, ItemError, Result};
use crate::store::{RecordStore, SubscriptionId};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ============================================================================
// FORECAST STATE
// ============================================================================

/// Counts gathered for one cadence type before projecting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastState {
    /// Last transaction in end_year - 2
    pub churned_two_years_ago: i64,
    /// Last transaction in end_year - 1
    pub churned_last_year: i64,
    /// First transaction in end_year - 1
    pub new_last_year: i64,
    /// First transaction in end_year
    pub new_this_year: i64,
    /// Still billing in end_year, ascending id order
    pub active: Vec<SubscriptionId>,
    pub total_unit_price: f64,
    pub subscription_count: usize,
}

impl ForecastState {
    /// Scan the subscriptions of one cadence type
    pub fn gather(ids: &[SubscriptionId], store: &RecordStore, end_year: i32) -> Result<Self> {
        let mut state = ForecastState::default();

        for &id in ids {
            let sub = store.get(id).ok_or_else(|| {
                AnalysisError::InvalidArgument(format!("subscription {} is not in the store", id))
            })?;
            let (first, last) = match (sub.first_date(), sub.last_date()) {
                (Some(first), Some(last)) => (first, last),
                _ => {
                    return Err(AnalysisError::InvalidArgument(format!(
                        "subscription {} has no transactions",
                        id
                    )))
                }
            };

            if first.year() + 1 == end_year {
                state.new_last_year += 1;
            } else if first.year() == end_year {
                state.new_this_year += 1;
            }

            if last.year() + 2 == end_year {
                state.churned_two_years_ago += 1;
            } else if last.year() + 1 == end_year {
                state.churned_last_year += 1;
            } else if last.year() == end_year {
                state.active.push(id);
            }

            state.total_unit_price += sub.unit_price;
            state.subscription_count += 1;
        }

        Ok(state)
    }

    /// Active subscribers expected to keep paying next year.
    ///
    /// Only a falling churn count is carried forward (active + delta);
    /// a flat or rising one leaves the active count as is.
    pub fn predicted_returning(&self) -> i64 {
        let active = self.active.len() as i64;
        let delta = self.churned_last_year - self.churned_two_years_ago;
        let predicted = if delta < 0 { active + delta } else { active };
        predicted.max(0)
    }

    /// max(0, b + (b - a)) with a = new last year, b = new this year
    pub fn predicted_new(&self) -> i64 {
        let delta = self.new_this_year - self.new_last_year;
        (self.new_this_year + delta).max(0)
    }

    pub fn average_unit_price(&self) -> Result<f64> {
        if self.subscription_count == 0 {
            return Err(AnalysisError::InvalidArgument(
                "cannot average unit price over zero subscriptions".to_string(),
            ));
        }
        Ok(self.total_unit_price / self.subscription_count as f64)
    }
}

// ============================================================================
// FORECAST RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceForecast {
    pub cadence: CadenceType,
    pub transactions_per_year: u32,
    pub state: ForecastState,
    pub predicted_returning: i64,
    /// Active list after dropping the expected churners from the front
    pub retained: Vec<SubscriptionId>,
    pub predicted_new: i64,
    pub average_unit_price: f64,
    pub returning_revenue: f64,
    pub new_revenue: f64,
}

impl CadenceForecast {
    pub fn total(&self) -> f64 {
        self.returning_revenue + self.new_revenue
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Year being forecast
    pub year: i32,
    /// DAILY, MONTHLY, YEARLY order; failed types are absent
    pub by_cadence: Vec<CadenceForecast>,
    pub returning_revenue: f64,
    pub new_revenue: f64,
    pub errors: Vec<ItemError>,
}

impl Forecast {
    pub fn total(&self) -> f64 {
        self.returning_revenue + self.new_revenue
    }

    pub fn for_cadence(&self, cadence: CadenceType) -> Option<&CadenceForecast> {
        self.by_cadence.iter().find(|f| f.cadence == cadence)
    }
}

// ============================================================================
// FORECASTING
// ============================================================================

/// Forecast one cadence type for end_year + 1
pub fn forecast_cadence(
    cadence: CadenceType,
    ids: &[SubscriptionId],
    store: &RecordStore,
    end_year: i32,
) -> Result<CadenceForecast> {
    let transactions_per_year = cadence.transactions_per_year().ok_or_else(|| {
        AnalysisError::InvalidArgument(format!("{} subscriptions are not forecast", cadence))
    })?;

    let state = ForecastState::gather(ids, store, end_year)?;
    let average_unit_price = state.average_unit_price()?;

    let predicted_returning = state.predicted_returning();
    let dropped = state.active.len() - predicted_returning as usize;
    let retained: Vec<SubscriptionId> = state.active[dropped..].to_vec();

    let per_year = f64::from(transactions_per_year);
    let returning_revenue: f64 = retained
        .iter()
        .filter_map(|id| store.get(*id))
        .map(|sub| sub.unit_price * per_year)
        .sum();

    let predicted_new = state.predicted_new();
    let new_revenue = average_unit_price * per_year * predicted_new as f64;

    debug!(
        cadence = %cadence,
        active = state.active.len(),
        predicted_returning,
        predicted_new,
        returning_revenue,
        new_revenue,
        "cadence forecast"
    );

    Ok(CadenceForecast {
        cadence,
        transactions_per_year,
        state,
        predicted_returning,
        retained,
        predicted_new,
        average_unit_price,
        returning_revenue,
        new_revenue,
    })
}

/// Forecast every recurring cadence in a fixed order and sum the results.
/// A failing cadence is reported and contributes nothing.
pub fn forecast_all(
    classification: &ClassificationReport,
    store: &RecordStore,
    end_year: i32,
) -> Result<Forecast> {
    let year = end_year.checked_add(1).ok_or_else(|| {
        AnalysisError::InvalidArgument(format!("end_year {} has no following year", end_year))
    })?;
    let mut forecast = Forecast {
        year,
        ..Forecast::default()
    };

    for cadence in CadenceType::RECURRING {
        match forecast_cadence(cadence, classification.ids_of(cadence), store, end_year) {
            Ok(result) => {
                forecast.returning_revenue += result.returning_revenue;
                forecast.new_revenue += result.new_revenue;
                forecast.by_cadence.push(result);
            }
            Err(e) => {
                warn!(cadence = %cadence, error = %e, "cadence skipped in forecast");
                forecast
                    .errors
                    .push(ItemError::new(ErrorScope::Cadence, cadence.code(), &e));
            }
        }
    }

    info!(
        year = forecast.year,
        returning = forecast.returning_revenue,
        new = forecast.new_revenue,
        total = forecast.total(),
        "forecast complete"
    );

    Ok(forecast)
}

// ============================================================================
// TESTS
// ============================================================================
