//! Reward distribution across level visualization graphs.
//!
//! Each level has a shared graph template whose "fingerprint" nodes carry
//! simulated transactions. This crate partitions a user's USD-equivalent
//! rewards pseudo-randomly across the successful transaction nodes of each
//! currency, preserving totals up to cent rounding.

pub mod engine;
pub mod graph;
pub mod weights;

pub use engine::{MissingRatePolicy, RewardDistributor};
pub use graph::{GraphNode, LevelGraph, NodeTransaction, TxStatus, FINGERPRINT_KIND};
pub use weights::generate_weights;
