//! Static tier configuration.
//!
//! The platform has five tiers. Tier 1 is the free base tier; tiers 2..=5
//! carry a default upgrade price that may be overridden per user or computed
//! dynamically from active network rewards (see the rates crate).

use rust_decimal::Decimal;
use serde::Serialize;

pub const MIN_TIER: i16 = 1;
pub const MAX_TIER: i16 = 5;

/// Static configuration for a single tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierDefinition {
    pub number: i16,
    pub name: &'static str,
    /// Maximum ledger balance a user on this tier may hold, in USD.
    pub max_balance: Decimal,
    /// Daily API request allowance.
    pub api_limit: u32,
    /// Default USD price to upgrade into this tier.
    pub upgrade_price: Decimal,
}

/// Returns the five tier definitions in ascending order.
#[must_use]
pub fn definitions() -> [TierDefinition; 5] {
    [
        TierDefinition {
            number: 1,
            name: "Starter",
            max_balance: Decimal::from(500),
            api_limit: 10,
            upgrade_price: Decimal::ZERO,
        },
        TierDefinition {
            number: 2,
            name: "Bronze",
            max_balance: Decimal::from(2_000),
            api_limit: 25,
            upgrade_price: Decimal::from(100),
        },
        TierDefinition {
            number: 3,
            name: "Silver",
            max_balance: Decimal::from(10_000),
            api_limit: 50,
            upgrade_price: Decimal::from(250),
        },
        TierDefinition {
            number: 4,
            name: "Gold",
            max_balance: Decimal::from(50_000),
            api_limit: 100,
            upgrade_price: Decimal::from(500),
        },
        TierDefinition {
            number: 5,
            name: "Platinum",
            max_balance: Decimal::from(250_000),
            api_limit: 250,
            upgrade_price: Decimal::from(1_000),
        },
    ]
}

/// Looks up the definition for a tier number, `None` outside 1..=5.
#[must_use]
pub fn definition(number: i16) -> Option<TierDefinition> {
    if (MIN_TIER..=MAX_TIER).contains(&number) {
        definitions().into_iter().find(|t| t.number == number)
    } else {
        None
    }
}

/// Returns true when `level` is a valid animation level (1..=5).
#[must_use]
pub fn is_valid_level(level: i16) -> bool {
    (MIN_TIER..=MAX_TIER).contains(&level)
}
