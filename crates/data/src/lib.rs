//! `PostgreSQL` persistence for the tier rewards platform.
//!
//! This crate provides:
//! - A database client that owns the pool and runs migrations
//! - Repositories implementing the persistence seams from
//!   `tier-rewards-core` (rates, network rewards, user ledger, level graphs)
//!
//! All monetary columns are NUMERIC and mapped to `rust_decimal::Decimal`.

pub mod database;
pub mod repositories;

pub use database::DatabaseClient;
pub use repositories::{
    ConversionRateRepository, LevelGraphRepository, NetworkRewardRepository, UserRepository,
};
