use crate::network::Network;
use crate::reward::{ConversionRate, CreditOutcome, NetworkRewardRecord, RewardMapping, UserProfile};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Persistence seam for conversion rates.
#[async_trait]
pub trait RateRepository: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<ConversionRate>>;
    async fn upsert(&self, network: Network, rate_to_usd: Decimal) -> Result<()>;
}

/// Persistence seam for admin-managed network reward records.
#[async_trait]
pub trait NetworkRewardStore: Send + Sync {
    async fn list(&self) -> Result<Vec<NetworkRewardRecord>>;
    async fn list_active(&self) -> Result<Vec<NetworkRewardRecord>>;
    async fn insert(&self, network: Network, level: i16, amount: Decimal) -> Result<NetworkRewardRecord>;
    async fn update(&self, id: i64, amount: Decimal, is_active: bool) -> Result<Option<NetworkRewardRecord>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Persistence seam for user profiles, per-level reward mappings, and the
/// atomic animation credit.
#[async_trait]
pub trait UserLedger: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>>;
    async fn level_rewards(&self, user_id: Uuid, level: i16) -> Result<RewardMapping>;

    /// Credits `amount_usd` to the user's balance and marks `level` watched,
    /// in one conditional write. Must be a no-op for the balance when the
    /// level was already credited, returning the original amount.
    async fn credit_level_reward(
        &self,
        user_id: Uuid,
        level: i16,
        amount_usd: Decimal,
    ) -> Result<CreditOutcome>;
}

/// Read-only source of level visualization graph templates.
///
/// The graph payload stays opaque JSON at this seam; the distribution crate
/// owns the typed representation.
#[async_trait]
pub trait GraphSource: Send + Sync {
    async fn level_graph(&self, level: i16) -> Result<Option<serde_json::Value>>;
}
