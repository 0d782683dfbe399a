//! Best-effort live price oracle client.
//!
//! Fetches a batch USD quote for every supported network from a
//! CoinGecko-compatible `simple/price` endpoint. Failures never propagate:
//! the oracle is an optional enrichment, and the authoritative rate table
//! lives in the database. Accepted quotes are persisted through an explicit
//! separate write path (`persist_live_rates`), not by the fetch itself.

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tier_rewards_core::{Network, RateRepository, RateTable};

/// Client for batch USD price quotes.
#[derive(Debug, Clone)]
pub struct PriceOracle {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Quote {
    usd: Option<f64>,
}

impl PriceOracle {
    /// Creates an oracle client with the given base URL and request timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build oracle HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Fetches live USD rates for all supported networks.
    ///
    /// Returns `None` on any transport, status, or parse failure. Networks
    /// missing from the response are simply absent from the table.
    pub async fn fetch_live_rates(&self) -> Option<RateTable> {
        match self.try_fetch().await {
            Ok(rates) if rates.is_empty() => {
                tracing::warn!("Price oracle returned no usable quotes");
                None
            }
            Ok(rates) => Some(rates),
            Err(e) => {
                tracing::warn!("Price oracle fetch failed: {e:#}");
                None
            }
        }
    }

    async fn try_fetch(&self) -> Result<RateTable> {
        let ids: Vec<&str> = Network::ALL.iter().map(|n| n.oracle_id()).collect();
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url.trim_end_matches('/'),
            ids.join(",")
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("oracle returned status {}", response.status()));
        }

        let quotes: HashMap<String, Quote> = response.json().await?;

        let mut rates = RateTable::new();
        for network in Network::ALL {
            let Some(quote) = quotes.get(network.oracle_id()) else {
                continue;
            };
            let Some(usd) = quote.usd else { continue };
            match Decimal::from_f64_retain(usd) {
                Some(rate) if rate > Decimal::ZERO => {
                    rates.insert(network, rate);
                }
                _ => {
                    tracing::warn!(%network, usd, "Ignoring unusable oracle quote");
                }
            }
        }

        Ok(rates)
    }

    /// Persists accepted live rates through the rate repository.
    ///
    /// Returns the number of networks written; 0 when the oracle was
    /// unreachable. Callers should invalidate the rate store afterwards.
    ///
    /// # Errors
    /// Returns an error only when a persistence write fails.
    pub async fn persist_live_rates(&self, repo: &dyn RateRepository) -> Result<usize> {
        let Some(rates) = self.fetch_live_rates().await else {
            return Ok(0);
        };

        let mut written = 0;
        for (network, rate) in &rates {
            repo.upsert(*network, *rate)
                .await
                .with_context(|| format!("Failed to persist live rate for {network}"))?;
            written += 1;
        }

        tracing::info!(written, "Persisted live conversion rates");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_url_covers_all_networks() {
        let ids: Vec<&str> = Network::ALL.iter().map(|n| n.oracle_id()).collect();
        let joined = ids.join(",");

        assert!(joined.contains("bitcoin"));
        assert!(joined.contains("tether"));
        assert!(joined.contains("solana"));
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn quote_parses_missing_usd_field() {
        let quote: Quote = serde_json::from_str("{}").unwrap();
        assert!(quote.usd.is_none());
    }

    #[test]
    fn quote_parses_usd_value() {
        let quote: Quote = serde_json::from_str("{\"usd\": 64123.5}").unwrap();
        assert_eq!(quote.usd, Some(64123.5));
    }

    #[test]
    fn non_positive_quotes_are_rejected() {
        assert!(Decimal::from_f64_retain(0.0)
            .map(|d| d > Decimal::ZERO)
            .map_or(true, |positive| !positive));
    }
}
