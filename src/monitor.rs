use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::archiver::StateStore;
use crate::config::{Config, Site};
use crate::detector::{DropDetector, PriceChange};
use crate::fetcher::Fetcher;
use crate::models::{Alert, PriceState, Product, TrackedProduct};
use crate::notifier::Notifier;
use crate::parser::ProductExtractor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub sites_processed: usize,
    pub sites_failed: usize,
    pub products_seen: usize,
    pub alerts_detected: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
}

/// Drives one monitoring pass over every configured site.
pub struct Monitor<'a, F, N> {
    config: &'a Config,
    fetcher: F,
    notifier: N,
    detector: DropDetector,
}

impl<'a, F: Fetcher, N: Notifier> Monitor<'a, F, N> {
    pub fn new(config: &'a Config, fetcher: F, notifier: N) -> Self {
        Self {
            config,
            fetcher,
            notifier,
            detector: DropDetector::new(config.drop_threshold),
        }
    }

    /// Loads the state, scans every site, sends at most
    /// `max_alerts_per_run` alerts and stores the new state.
    ///
    /// Fetch and send failures are logged and skipped. Load and save
    /// failures abort the run.
    pub fn run(&self, store: &impl StateStore) -> Result<RunReport> {
        let mut state = store.load()?;
        let mut report = RunReport::default();

        let alerts = self.collect_alerts(&mut state, &mut report);
        report.alerts_detected = alerts.len();

        for alert in alerts.iter().take(self.config.max_alerts_per_run) {
            match self.notifier.send(&alert.to_string()) {
                Ok(()) => {
                    report.alerts_sent += 1;
                    info!("alert sent: {} ({:.1}%)", alert.title, alert.drop_pct);
                }
                Err(e) => {
                    report.alerts_failed += 1;
                    warn!("alert for {} not delivered: {e:#}", alert.product_id);
                }
            }
        }

        state.last_run = Some(Utc::now().timestamp());
        store.save(&state)?;

        info!(
            "run finished: {} alerts detected, {} sent, {} failed, {}/{} sites skipped",
            report.alerts_detected,
            report.alerts_sent,
            report.alerts_failed,
            report.sites_failed,
            self.config.sites.len(),
        );
        Ok(report)
    }

    fn collect_alerts(&self, state: &mut PriceState, report: &mut RunReport) -> Vec<Alert> {
        let mut alerts = Vec::new();
        for site in &self.config.sites {
            info!("analysing {}", site.url);
            let products = match self.scan_site(site) {
                Ok(products) => products,
                Err(e) => {
                    report.sites_failed += 1;
                    warn!("could not fetch {}: {e:#}", site.name);
                    continue;
                }
            };
            info!("{}: {} products detected", site.name, products.len());
            report.sites_processed += 1;
            report.products_seen += products.len();

            let now = Utc::now().timestamp();
            for product in &products {
                if let Some(alert) = self.observe(state, product, now) {
                    alerts.push(alert);
                }
            }
        }
        alerts
    }

    fn scan_site(&self, site: &Site) -> Result<Vec<Product>> {
        let html = self.fetcher.fetch_html(&site.url)?;
        debug!("{}: cascade {:?}", site.name, site.cascade.patterns());
        let extractor =
            ProductExtractor::new(&site.name, &site.cascade, self.config.max_items_per_site);
        Ok(extractor.extract(&html, &site.url))
    }

    /// Records the product in `state` and returns an alert only for a drop
    /// over the threshold that was never alerted before.
    pub fn observe(&self, state: &mut PriceState, product: &Product, now: i64) -> Option<Alert> {
        let previous = state
            .products
            .insert(
                product.product_id.clone(),
                TrackedProduct::observed(product, now),
            )
            .map(|p| p.last_price);

        let PriceChange::Drop {
            old_price,
            drop_pct,
        } = self.detector.evaluate(previous, product.price_pen)
        else {
            return None;
        };

        if !state
            .alerts_sent
            .accept(&product.product_id, old_price, product.price_pen, now)
        {
            return None;
        }

        Some(Alert {
            product_id: product.product_id.clone(),
            site: product.site.clone(),
            title: product.title.clone(),
            url: product.url.clone(),
            old_price,
            new_price: product.price_pen,
            drop_pct,
        })
    }
}
