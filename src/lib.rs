//! cartscrape - product and order page scraping with local archiving.
//!
//! Scrapes retailer product pages (Amazon, Costco, Yami) and eBay seller
//! order pages with selector catalogs, keeps the records in a local
//! key-value store and exports them as JSON or CSV.

pub mod cli;
pub mod config;
pub mod export;
pub mod messaging;
pub mod models;
pub mod pipeline;
pub mod rate_limit;
pub mod scrapers;
pub mod storage;
pub mod utils;
pub mod validation;
