use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Every price transition that has already produced an alert, keyed by
/// `<id>:<old>-><new>` with two-decimal prices. Entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertLedger(BTreeMap<String, i64>);

impl AlertLedger {
    pub fn transition_key(product_id: &str, old_price: f64, new_price: f64) -> String {
        format!("{product_id}:{old_price:.2}->{new_price:.2}")
    }

    /// Records the transition and returns `true` the first time it is seen.
    /// Later calls for the same transition return `false`, even across runs.
    pub fn accept(&mut self, product_id: &str, old_price: f64, new_price: f64, now: i64) -> bool {
        let key = Self::transition_key(product_id, old_price, new_price);
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, now);
        true
    }

    /// Whether this exact transition has already produced an alert.
    pub fn contains(&self, product_id: &str, old_price: f64, new_price: f64) -> bool {
        self.0
            .contains_key(&Self::transition_key(product_id, old_price, new_price))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
