//! Conversion rates and USD reward conversion.
//!
//! This crate provides:
//! - A TTL-cached, database-backed conversion rate store with a hard-coded
//!   fallback table
//! - A best-effort price oracle client for live quotes
//! - Pure conversion functions from crypto amounts to USD
//! - The tier upgrade price calculator

pub mod converter;
pub mod oracle;
pub mod pricing;
pub mod store;

pub use converter::{convert_mapping, to_usd, Conversion, ConvertedReward};
pub use oracle::PriceOracle;
pub use pricing::{effective_price, price_for_tier};
pub use store::{Clock, ConversionRateStore, SystemClock};
