//! Reward ledger records and the per-level reward mapping.
//!
//! All amounts use `rust_decimal::Decimal` for financial precision. Reward
//! mappings hold native crypto units; conversion to USD happens at read time.

use crate::network::Network;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A persisted conversion rate for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRate {
    pub network: Network,
    /// USD value of 1 unit of `network`. Always positive.
    pub rate_to_usd: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// An admin-managed reward record attached to a level.
///
/// Active records aggregate into the dynamic tier upgrade price and drive
/// what the dashboard shows as "available rewards" per level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRewardRecord {
    pub id: i64,
    pub network: Network,
    pub level: i16,
    /// Amount in native units of `network`.
    pub reward_amount: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A user's per-level crypto reward mapping, keyed by network.
///
/// Construction from raw symbol/amount pairs is the only place unknown
/// symbols are tolerated; they are dropped with a warning rather than kept
/// as dynamic keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardMapping(BTreeMap<Network, Decimal>);

impl RewardMapping {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builds a mapping from raw `(symbol, amount)` pairs.
    ///
    /// Unknown symbols and non-positive amounts are discarded. Duplicate
    /// symbols (e.g. `TRX` and `TRON`) accumulate into one entry.
    pub fn from_raw<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let mut map = BTreeMap::new();
        for (symbol, amount) in entries {
            let Some(network) = Network::parse(symbol.as_ref()) else {
                tracing::warn!(symbol = symbol.as_ref(), "dropping unknown reward symbol");
                continue;
            };
            if amount <= Decimal::ZERO {
                continue;
            }
            *map.entry(network).or_insert(Decimal::ZERO) += amount;
        }
        Self(map)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Amount for a network, zero when absent.
    #[must_use]
    pub fn amount(&self, network: Network) -> Decimal {
        self.0.get(&network).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn set(&mut self, network: Network, amount: Decimal) {
        if amount > Decimal::ZERO {
            self.0.insert(network, amount);
        } else {
            self.0.remove(&network);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Network, Decimal)> + '_ {
        self.0.iter().map(|(n, a)| (*n, *a))
    }
}

impl FromIterator<(Network, Decimal)> for RewardMapping {
    fn from_iter<I: IntoIterator<Item = (Network, Decimal)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (network, amount) in iter {
            mapping.set(network, amount);
        }
        mapping
    }
}

/// A platform user as seen by the reward engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    /// Current tier, 1..=5. Gates level animation unlocks.
    pub tier: i16,
    /// USD ledger balance. Administratively reconciled, never real custody.
    pub balance: Decimal,
    /// Admin-set per-tier price overrides. Always win over computed prices.
    pub custom_tier_prices: BTreeMap<i16, Decimal>,
}

/// Outcome of the atomic per-(user, level) reward credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditOutcome {
    /// True when this call performed the credit; false when the level was
    /// already watched and the balance was left untouched.
    pub credited: bool,
    /// USD amount credited by this call, or previously credited on replay.
    pub amount_usd: Decimal,
    /// Balance after the operation.
    pub balance: Decimal,
}
