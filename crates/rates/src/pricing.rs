//! Tier upgrade pricing.
//!
//! Dynamic prices aggregate the active network reward records configured for
//! a tier's level, valued at current rates. Admin-set per-user overrides
//! always win over both the computed price and the static default.

use crate::converter::to_usd;
use rust_decimal::{Decimal, RoundingStrategy};
use tier_rewards_core::{tier, NetworkRewardRecord, RateTable, UserProfile};

/// Computes the dynamic USD price for upgrading into `tier_number`.
///
/// Sums the USD value of active reward records at that level and rounds
/// half-up to cents. Tier 1 is the free base tier; out-of-range tiers
/// price at zero.
#[must_use]
pub fn price_for_tier(
    tier_number: i16,
    records: &[NetworkRewardRecord],
    rates: &RateTable,
) -> Decimal {
    if tier_number <= tier::MIN_TIER || tier_number > tier::MAX_TIER {
        return Decimal::ZERO;
    }

    let total: Decimal = records
        .iter()
        .filter(|r| r.level == tier_number && r.is_active)
        .map(|r| to_usd(r.reward_amount, r.network, rates))
        .sum();

    total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the price this user actually pays for `tier_number`.
///
/// A custom per-user override wins unconditionally; otherwise the static
/// default from the tier table applies. Out-of-range tiers are free.
#[must_use]
pub fn effective_price(user: &UserProfile, tier_number: i16) -> Decimal {
    if let Some(custom) = user.custom_tier_prices.get(&tier_number) {
        return *custom;
    }
    tier::definition(tier_number).map_or(Decimal::ZERO, |t| t.upgrade_price)
}
