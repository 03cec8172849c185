use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::AlertLedger;

/// One product read off a listing page in the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub site: String,
    pub product_id: String,
    pub title: String,
    pub price_pen: f64,
    pub url: String,
}

/// Last known snapshot of a product, overwritten every time it is seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedProduct {
    pub title: String,
    pub site: String,
    pub url: String,
    pub last_price: f64,
    pub updated_at: i64,
}

impl TrackedProduct {
    pub fn observed(product: &Product, now: i64) -> Self {
        Self {
            title: product.title.clone(),
            site: product.site.clone(),
            url: product.url.clone(),
            last_price: product.price_pen,
            updated_at: now,
        }
    }
}

/// Everything that survives between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceState {
    #[serde(default)]
    pub products: BTreeMap<String, TrackedProduct>,
    #[serde(default)]
    pub alerts_sent: AlertLedger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub product_id: String,
    pub site: String,
    pub title: String,
    pub url: String,
    pub old_price: f64,
    pub new_price: f64,
    pub drop_pct: f64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "🔥 DESCUENTO FUERTE ({:.1}%)\nTienda: {}\nProducto: {}\nAntes: S/ {:.2}\nAhora: S/ {:.2}\nLink: {}",
            self.drop_pct, self.site, self.title, self.old_price, self.new_price, self.url
        )
    }
}
