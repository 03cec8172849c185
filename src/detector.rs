/// What one re-observation of a product means for alerting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceChange {
    /// No prior price on record.
    FirstSeen,
    /// Same or higher price, or an unusable prior price.
    NoDrop,
    BelowThreshold { drop_pct: f64 },
    Drop { old_price: f64, drop_pct: f64 },
}

/// Compares a fresh price with the last recorded one. Only a drop within a
/// single run is considered, never a cumulative decline.
#[derive(Debug, Clone, Copy)]
pub struct DropDetector {
    threshold_pct: f64,
}

impl DropDetector {
    pub fn new(threshold_pct: f64) -> Self {
        Self { threshold_pct }
    }

    pub fn evaluate(&self, previous: Option<f64>, new_price: f64) -> PriceChange {
        let Some(old_price) = previous else {
            return PriceChange::FirstSeen;
        };
        if old_price <= 0.0 || new_price >= old_price {
            return PriceChange::NoDrop;
        }

        let drop_pct = (old_price - new_price) / old_price * 100.0;
        if drop_pct < self.threshold_pct {
            PriceChange::BelowThreshold { drop_pct }
        } else {
            PriceChange::Drop { old_price, drop_pct }
        }
    }
}
