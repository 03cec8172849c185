//! Scrapes e-commerce listing pages, tracks the last price of every product
//! seen and raises a one-time alert when a price falls past a threshold.

pub mod archiver;
pub mod config;
pub mod detector;
pub mod error;
pub mod fetcher;
pub mod identity;
pub mod ledger;
pub mod models;
pub mod monitor;
pub mod notifier;
pub mod parser;
pub mod price;
