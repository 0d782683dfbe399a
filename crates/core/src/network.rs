//! Supported reward networks.
//!
//! Reward mappings and conversion rates are keyed by a closed set of
//! cryptocurrency networks. Upstream systems are inconsistent about symbols
//! (the visualization graphs say `TRX` where the reward ledger says `TRON`),
//! so parsing normalizes known aliases and rejects everything else.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A cryptocurrency network supported as a reward denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Network {
    #[serde(rename = "BTC")]
    Btc,
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "TRON")]
    Tron,
    #[serde(rename = "USDT")]
    Usdt,
    #[serde(rename = "BNB")]
    Bnb,
    #[serde(rename = "SOL")]
    Sol,
}

impl Network {
    /// All supported networks, in canonical display order.
    pub const ALL: [Self; 6] = [
        Self::Btc,
        Self::Eth,
        Self::Tron,
        Self::Usdt,
        Self::Bnb,
        Self::Sol,
    ];

    /// Canonical uppercase symbol used in persistence and JSON.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Eth => "ETH",
            Self::Tron => "TRON",
            Self::Usdt => "USDT",
            Self::Bnb => "BNB",
            Self::Sol => "SOL",
        }
    }

    /// External id used by the price oracle batch quote endpoint.
    #[must_use]
    pub const fn oracle_id(self) -> &'static str {
        match self {
            Self::Btc => "bitcoin",
            Self::Eth => "ethereum",
            Self::Tron => "tron",
            Self::Usdt => "tether",
            Self::Bnb => "binancecoin",
            Self::Sol => "solana",
        }
    }

    /// Hard-coded fallback USD rate used when persistence yields nothing.
    ///
    /// These are deliberately coarse; they exist so the platform degrades to
    /// plausible numbers instead of failing when no admin has seeded rates.
    #[must_use]
    pub fn default_usd_rate(self) -> Decimal {
        match self {
            Self::Btc => Decimal::from(45_000),
            Self::Eth => Decimal::from(3_000),
            Self::Tron => Decimal::new(1, 1), // 0.1
            Self::Usdt => Decimal::ONE,
            Self::Bnb => Decimal::from(300),
            Self::Sol => Decimal::from(100),
        }
    }

    /// Parses a symbol, accepting any casing and known aliases.
    ///
    /// `TRX` is normalized to `TRON`; `WBNB`-style wrapped symbols are not
    /// recognized. Returns `None` for anything outside the supported set.
    #[must_use]
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol.trim().to_ascii_uppercase().as_str() {
            "BTC" => Some(Self::Btc),
            "ETH" => Some(Self::Eth),
            "TRON" | "TRX" => Some(Self::Tron),
            "USDT" => Some(Self::Usdt),
            "BNB" => Some(Self::Bnb),
            "SOL" => Some(Self::Sol),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownNetwork(s.to_string()))
    }
}

/// Effective USD rates for a set of networks.
pub type RateTable = std::collections::HashMap<Network, Decimal>;

/// Builds the hard-coded fallback rate table covering every network.
#[must_use]
pub fn default_rate_table() -> RateTable {
    Network::ALL
        .iter()
        .map(|n| (*n, n.default_usd_rate()))
        .collect()
}

/// Error returned when a symbol does not name a supported network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network symbol: {0}")]
pub struct UnknownNetwork(pub String);
