//! Network reward record repository.
//!
//! Admin CRUD over the records that feed dynamic tier prices and the
//! per-level reward displays.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tier_rewards_core::{Network, NetworkRewardRecord, NetworkRewardStore};

type RewardRow = (i64, String, i16, Decimal, bool, DateTime<Utc>);

/// Repository for admin-managed network reward records.
#[derive(Debug, Clone)]
pub struct NetworkRewardRepository {
    pool: PgPool,
}

impl NetworkRewardRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: RewardRow) -> Option<NetworkRewardRecord> {
        let (id, symbol, level, reward_amount, is_active, created_at) = row;
        let Some(network) = Network::parse(&symbol) else {
            tracing::warn!(id, symbol, "Skipping reward record for unknown network");
            return None;
        };
        Some(NetworkRewardRecord {
            id,
            network,
            level,
            reward_amount,
            is_active,
            created_at,
        })
    }
}

#[async_trait]
impl NetworkRewardStore for NetworkRewardRepository {
    async fn list(&self) -> Result<Vec<NetworkRewardRecord>> {
        let rows: Vec<RewardRow> = sqlx::query_as(
            r"
            SELECT id, network, level, reward_amount, is_active, created_at
            FROM network_rewards
            ORDER BY level, network, id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list network rewards")?;

        Ok(rows.into_iter().filter_map(Self::from_row).collect())
    }

    async fn list_active(&self) -> Result<Vec<NetworkRewardRecord>> {
        let rows: Vec<RewardRow> = sqlx::query_as(
            r"
            SELECT id, network, level, reward_amount, is_active, created_at
            FROM network_rewards
            WHERE is_active
            ORDER BY level, network, id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list active network rewards")?;

        Ok(rows.into_iter().filter_map(Self::from_row).collect())
    }

    async fn insert(
        &self,
        network: Network,
        level: i16,
        amount: Decimal,
    ) -> Result<NetworkRewardRecord> {
        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO network_rewards (network, level, reward_amount)
            VALUES ($1, $2, $3)
            RETURNING id, created_at
            ",
        )
        .bind(network.symbol())
        .bind(level)
        .bind(amount)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert network reward")?;

        Ok(NetworkRewardRecord {
            id,
            network,
            level,
            reward_amount: amount,
            is_active: true,
            created_at,
        })
    }

    async fn update(
        &self,
        id: i64,
        amount: Decimal,
        is_active: bool,
    ) -> Result<Option<NetworkRewardRecord>> {
        let row: Option<RewardRow> = sqlx::query_as(
            r"
            UPDATE network_rewards
            SET reward_amount = $2, is_active = $3
            WHERE id = $1
            RETURNING id, network, level, reward_amount, is_active, created_at
            ",
        )
        .bind(id)
        .bind(amount)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update network reward")?;

        Ok(row.and_then(Self::from_row))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM network_rewards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete network reward")?;

        Ok(result.rows_affected() > 0)
    }
}
