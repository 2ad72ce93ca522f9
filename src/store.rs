// 🗂️ Record Store
// Every subscription with its transaction dates (file order) and unit price.
// Built once from the ledger, read-only afterwards.

use crate::ledger::Transaction;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type SubscriptionId = u32;

/// Subscription - derived from all transactions sharing a subscription id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,

    /// Transaction dates in file order (trusted to be ascending)
    pub dates: Vec<NaiveDate>,

    /// Price of the first observed transaction
    pub unit_price: f64,

    /// Every amount seen, in file order (for quality checks)
    #[serde(skip)]
    pub(crate) amounts: Vec<f64>,
}

impl Subscription {
    fn start(id: SubscriptionId, date: NaiveDate, amount: f64) -> Self {
        Subscription {
            id,
            dates: vec![date],
            unit_price: amount,
            amounts: vec![amount],
        }
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn transaction_count(&self) -> usize {
        self.dates.len()
    }

    pub fn amounts(&self) -> &[f64] {
        &self.amounts
    }
}

/// RecordStore - subscriptions keyed by id.
///
/// BTreeMap keeps iteration in ascending id order, which the forecaster
/// relies on when it trims the active list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordStore {
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
}

impl RecordStore {
    /// Assemble subscriptions by scanning transactions in file order
    pub fn ingest(transactions: &[Transaction]) -> Self {
        let mut subscriptions: BTreeMap<SubscriptionId, Subscription> = BTreeMap::new();

        for tx in transactions {
            subscriptions
                .entry(tx.subscription_id)
                .and_modify(|sub| {
                    sub.dates.push(tx.date);
                    sub.amounts.push(tx.amount);
                })
                .or_insert_with(|| Subscription::start(tx.subscription_id, tx.date, tx.amount));
        }

        RecordStore { subscriptions }
    }

    pub fn get(&self, id: SubscriptionId) -> Option<&Subscription> {
        self.subscriptions.get(&id)
    }

    /// Subscriptions in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = SubscriptionId> + '_ {
        self.subscriptions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: u64, subscription_id: u32, amount: f64, y: i32, m: u32, d: u32) -> Transaction {
        Transaction {
            id,
            subscription_id,
            amount,
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            line_number: id as usize,
        }
    }

    #[test]
    fn test_ingest_groups_by_subscription_in_file_order() {
        let store = RecordStore::ingest(&[
            tx(1, 9, 5.0, 2000, 1, 1),
            tx(2, 3, 7.0, 2000, 1, 1),
            tx(3, 9, 5.0, 2000, 2, 1),
            tx(4, 9, 5.0, 2000, 3, 1),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![3, 9]);

        let sub = store.get(9).unwrap();
        assert_eq!(sub.transaction_count(), 3);
        assert_eq!(sub.first_date(), NaiveDate::from_ymd_opt(2000, 1, 1));
        assert_eq!(sub.last_date(), NaiveDate::from_ymd_opt(2000, 3, 1));
    }

    #[test]
    fn test_unit_price_is_first_observed_amount() {
        let store = RecordStore::ingest(&[tx(1, 1, 5.0, 2000, 1, 1), tx(2, 1, 8.0, 2000, 2, 1)]);

        let sub = store.get(1).unwrap();
        assert_eq!(sub.unit_price, 5.0);
        assert_eq!(sub.amounts(), &[5.0, 8.0]);
    }

    #[test]
    fn test_duplicate_dates_are_kept() {
        let store = RecordStore::ingest(&[tx(1, 1, 5.0, 2000, 1, 1), tx(2, 1, 5.0, 2000, 1, 1)]);
        assert_eq!(store.get(1).unwrap().transaction_count(), 2);
    }

    #[test]
    fn test_empty_store() {
        let store = RecordStore::ingest(&[]);
        assert!(store.is_empty());
        assert!(store.get(1).is_none());
    }
}
