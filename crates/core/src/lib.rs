//! Core types, traits, and configuration for the tier rewards platform.
//!
//! This crate defines the closed network enum, reward ledger records, static
//! tier table, and the async persistence seams implemented by the data crate.

pub mod config;
pub mod config_loader;
pub mod network;
pub mod reward;
pub mod tier;
pub mod traits;

pub use config::{
    AppConfig, DatabaseConfig, DistributionConfig, MissingRateSetting, OracleConfig,
    RateCacheConfig, ServerConfig,
};
pub use config_loader::ConfigLoader;
pub use network::{default_rate_table, Network, RateTable, UnknownNetwork};
pub use reward::{
    ConversionRate, CreditOutcome, NetworkRewardRecord, RewardMapping, UserProfile,
};
pub use tier::{definition, definitions, is_valid_level, TierDefinition, MAX_TIER, MIN_TIER};
pub use traits::{GraphSource, NetworkRewardStore, RateRepository, UserLedger};
