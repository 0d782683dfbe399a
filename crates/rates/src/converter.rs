//! Pure crypto-to-USD conversion.
//!
//! These functions are total: a non-positive amount or a network missing
//! from the rate table resolves to zero with a warning. Callers never see a
//! conversion error; degraded inputs degrade to "no reward".

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tier_rewards_core::{Network, RateTable, RewardMapping};

/// One converted entry of a reward mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedReward {
    /// Original amount in native crypto units.
    pub original: Decimal,
    /// USD equivalent at the supplied rate.
    pub usd: Decimal,
}

/// Result of converting a full reward mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub total_usd: Decimal,
    pub breakdown: BTreeMap<Network, ConvertedReward>,
}

/// Converts a single crypto amount to USD.
///
/// Returns zero for non-positive amounts and for networks absent from the
/// rate table.
#[must_use]
pub fn to_usd(amount: Decimal, network: Network, rates: &RateTable) -> Decimal {
    if amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    match rates.get(&network) {
        Some(rate) => amount * rate,
        None => {
            tracing::warn!(%network, "No conversion rate, valuing reward at 0");
            Decimal::ZERO
        }
    }
}

/// Converts every entry of a reward mapping, returning the USD total and a
/// per-network breakdown.
///
/// Deterministic for fixed rates; iteration order cannot affect the total
/// because `Decimal` addition is exact.
#[must_use]
pub fn convert_mapping(rewards: &RewardMapping, rates: &RateTable) -> Conversion {
    let mut breakdown = BTreeMap::new();
    let mut total_usd = Decimal::ZERO;

    for (network, original) in rewards.iter() {
        let usd = to_usd(original, network, rates);
        total_usd += usd;
        breakdown.insert(network, ConvertedReward { original, usd });
    }

    Conversion {
        total_usd,
        breakdown,
    }
}
