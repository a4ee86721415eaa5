//! CLI command implementations.

pub mod bulk;
pub mod export;
pub mod message;
pub mod records;
pub mod scrape;
