//! Conversion rate repository.
//!
//! Rows with symbols outside the supported network set (left over from a
//! removed network, or hand-edited) are skipped with a warning rather than
//! failing the whole fetch.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tier_rewards_core::{ConversionRate, Network, RateRepository};

/// Repository for admin-managed conversion rates.
#[derive(Debug, Clone)]
pub struct ConversionRateRepository {
    pool: PgPool,
}

impl ConversionRateRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateRepository for ConversionRateRepository {
    async fn fetch_all(&self) -> Result<Vec<ConversionRate>> {
        let rows: Vec<(String, Decimal, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT network, rate_to_usd, updated_at
            FROM conversion_rates
            ORDER BY network
            ",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch conversion rates")?;

        let mut rates = Vec::with_capacity(rows.len());
        for (symbol, rate_to_usd, updated_at) in rows {
            let Some(network) = Network::parse(&symbol) else {
                tracing::warn!(symbol, "Skipping conversion rate for unknown network");
                continue;
            };
            rates.push(ConversionRate {
                network,
                rate_to_usd,
                updated_at,
            });
        }

        Ok(rates)
    }

    async fn upsert(&self, network: Network, rate_to_usd: Decimal) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO conversion_rates (network, rate_to_usd, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (network) DO UPDATE
            SET rate_to_usd = EXCLUDED.rate_to_usd,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(network.symbol())
        .bind(rate_to_usd)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert conversion rate for {network}"))?;

        Ok(())
    }
}
