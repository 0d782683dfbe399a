//! User ledger repository.
//!
//! Besides profile and per-level reward reads, this repository owns the one
//! write that must be race-safe: crediting a level's reward. The credit is
//! keyed by the `level_credits` primary key, so two concurrent "mark
//! watched" calls for the same (user, level) serialize on the insert — the
//! loser of the race sees the conflict, skips the balance update, and
//! returns the amount the winner credited.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::BTreeMap;
use tier_rewards_core::{CreditOutcome, RewardMapping, UserLedger, UserProfile};
use uuid::Uuid;

/// Repository for user profiles, reward mappings, and balance credits.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserLedger for UserRepository {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let row: Option<(Uuid, i16, Decimal, serde_json::Value)> = sqlx::query_as(
            r"
            SELECT id, tier, balance, custom_tier_prices
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        let Some((id, tier, balance, custom_prices)) = row else {
            return Ok(None);
        };

        let custom_tier_prices: BTreeMap<i16, Decimal> = serde_json::from_value(custom_prices)
            .unwrap_or_else(|e| {
                tracing::warn!(%id, "Malformed custom tier prices, ignoring: {e}");
                BTreeMap::new()
            });

        Ok(Some(UserProfile {
            id,
            tier,
            balance,
            custom_tier_prices,
        }))
    }

    async fn level_rewards(&self, user_id: Uuid, level: i16) -> Result<RewardMapping> {
        let rows: Vec<(String, Decimal)> = sqlx::query_as(
            r"
            SELECT network, amount
            FROM user_network_rewards
            WHERE user_id = $1 AND level = $2
            ",
        )
        .bind(user_id)
        .bind(level)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch level rewards")?;

        Ok(RewardMapping::from_raw(rows))
    }

    async fn credit_level_reward(
        &self,
        user_id: Uuid,
        level: i16,
        amount_usd: Decimal,
    ) -> Result<CreditOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin credit transaction")?;

        let inserted = sqlx::query(
            r"
            INSERT INTO level_credits (user_id, level, amount_usd)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, level) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(level)
        .bind(amount_usd)
        .execute(&mut *tx)
        .await
        .context("Failed to record level credit")?
        .rows_affected();

        if inserted == 0 {
            // Already credited; report the original amount, leave the
            // balance alone.
            let (prior,): (Decimal,) = sqlx::query_as(
                r"
                SELECT amount_usd FROM level_credits
                WHERE user_id = $1 AND level = $2
                ",
            )
            .bind(user_id)
            .bind(level)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to read prior level credit")?;

            let (balance,): (Decimal,) =
                sqlx::query_as("SELECT balance FROM users WHERE id = $1")
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await
                    .context("Failed to read user balance")?;

            tx.commit().await.context("Failed to commit credit")?;

            return Ok(CreditOutcome {
                credited: false,
                amount_usd: prior,
                balance,
            });
        }

        let (balance,): (Decimal,) = sqlx::query_as(
            r"
            UPDATE users
            SET balance = balance + $2
            WHERE id = $1
            RETURNING balance
            ",
        )
        .bind(user_id)
        .bind(amount_usd)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to credit user balance")?;

        tx.commit().await.context("Failed to commit credit")?;

        tracing::info!(%user_id, level, %amount_usd, "Credited level reward");

        Ok(CreditOutcome {
            credited: true,
            amount_usd,
            balance,
        })
    }
}
