//! Animation completion orchestration.
//!
//! Marking a level's animation watched is the one transition that credits
//! reward value to a user's balance. The sequence is: validate the level,
//! gate on the user's tier, convert the level's reward mapping to USD at
//! current rates, then hand the amount to the ledger's atomic conditional
//! credit. Re-invoking after a successful credit is a no-op for the balance
//! and returns the originally credited amount.

use std::sync::Arc;
use tier_rewards_core::{is_valid_level, CreditOutcome, UserLedger};
use tier_rewards_rates::{convert_mapping, ConversionRateStore};
use uuid::Uuid;

/// Why an animation completion was rejected.
///
/// Only `InsufficientTier` reflects a real business rule; conversion itself
/// never fails (missing rates degrade to a zero credit).
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("level {0} is out of range")]
    InvalidLevel(i16),
    #[error("user not found")]
    UnknownUser,
    #[error("tier {tier} does not unlock level {level}")]
    InsufficientTier { tier: i16, level: i16 },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Orchestrates the watched-flag transition and reward credit.
pub struct AnimationCompletionHandler {
    ledger: Arc<dyn UserLedger>,
    rates: Arc<ConversionRateStore>,
}

impl AnimationCompletionHandler {
    #[must_use]
    pub fn new(ledger: Arc<dyn UserLedger>, rates: Arc<ConversionRateStore>) -> Self {
        Self { ledger, rates }
    }

    /// Marks `level` watched for `user_id`, crediting its reward once.
    ///
    /// # Errors
    /// - `InvalidLevel` when `level` is outside 1..=5
    /// - `UnknownUser` when the user does not exist
    /// - `InsufficientTier` when the user's tier is below `level`
    /// - `Storage` when a persistence operation fails
    pub async fn complete(&self, user_id: Uuid, level: i16) -> Result<CreditOutcome, CompletionError> {
        if !is_valid_level(level) {
            return Err(CompletionError::InvalidLevel(level));
        }

        let user = self
            .ledger
            .get_user(user_id)
            .await?
            .ok_or(CompletionError::UnknownUser)?;

        if user.tier < level {
            return Err(CompletionError::InsufficientTier {
                tier: user.tier,
                level,
            });
        }

        let rewards = self.ledger.level_rewards(user_id, level).await?;
        let rates = self.rates.get_rates().await;
        let conversion = convert_mapping(&rewards, &rates);

        let outcome = self
            .ledger
            .credit_level_reward(user_id, level, conversion.total_usd)
            .await?;

        if outcome.credited {
            tracing::info!(
                %user_id,
                level,
                amount_usd = %outcome.amount_usd,
                "Animation completion credited"
            );
        } else {
            tracing::debug!(%user_id, level, "Animation already completed, no re-credit");
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;
    use tier_rewards_core::{
        ConversionRate, Network, RateRepository, RewardMapping, UserProfile,
    };

    struct StaticRates;

    #[async_trait]
    impl RateRepository for StaticRates {
        async fn fetch_all(&self) -> Result<Vec<ConversionRate>> {
            Ok(vec![ConversionRate {
                network: Network::Btc,
                rate_to_usd: dec!(50000),
                updated_at: chrono_now(),
            }])
        }

        async fn upsert(&self, _network: Network, _rate: Decimal) -> Result<()> {
            Ok(())
        }
    }

    fn chrono_now() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }

    struct InMemoryLedger {
        user: Mutex<Option<UserProfile>>,
        rewards: Mutex<HashMap<i16, RewardMapping>>,
        credits: Mutex<HashMap<i16, Decimal>>,
    }

    impl InMemoryLedger {
        fn with_user(tier: i16) -> (Arc<Self>, Uuid) {
            let id = Uuid::new_v4();
            let ledger = Arc::new(Self {
                user: Mutex::new(Some(UserProfile {
                    id,
                    tier,
                    balance: dec!(0),
                    custom_tier_prices: BTreeMap::new(),
                })),
                rewards: Mutex::new(HashMap::new()),
                credits: Mutex::new(HashMap::new()),
            });
            (ledger, id)
        }

        fn empty() -> Arc<Self> {
            Arc::new(Self {
                user: Mutex::new(None),
                rewards: Mutex::new(HashMap::new()),
                credits: Mutex::new(HashMap::new()),
            })
        }

        fn set_rewards(&self, level: i16, mapping: RewardMapping) {
            self.rewards.lock().unwrap().insert(level, mapping);
        }

        fn balance(&self) -> Decimal {
            self.user.lock().unwrap().as_ref().unwrap().balance
        }
    }

    #[async_trait]
    impl UserLedger for InMemoryLedger {
        async fn get_user(&self, _user_id: Uuid) -> Result<Option<UserProfile>> {
            Ok(self.user.lock().unwrap().clone())
        }

        async fn level_rewards(&self, _user_id: Uuid, level: i16) -> Result<RewardMapping> {
            Ok(self
                .rewards
                .lock()
                .unwrap()
                .get(&level)
                .cloned()
                .unwrap_or_default())
        }

        async fn credit_level_reward(
            &self,
            _user_id: Uuid,
            level: i16,
            amount_usd: Decimal,
        ) -> Result<CreditOutcome> {
            let mut credits = self.credits.lock().unwrap();
            if let Some(prior) = credits.get(&level) {
                return Ok(CreditOutcome {
                    credited: false,
                    amount_usd: *prior,
                    balance: self.balance(),
                });
            }
            credits.insert(level, amount_usd);
            drop(credits);

            let mut user = self.user.lock().unwrap();
            let profile = user.as_mut().unwrap();
            profile.balance += amount_usd;
            Ok(CreditOutcome {
                credited: true,
                amount_usd,
                balance: profile.balance,
            })
        }
    }

    fn handler(ledger: Arc<InMemoryLedger>) -> AnimationCompletionHandler {
        let store = Arc::new(ConversionRateStore::new(Arc::new(StaticRates)));
        AnimationCompletionHandler::new(ledger, store)
    }

    #[tokio::test]
    async fn credits_reward_once() {
        let (ledger, user_id) = InMemoryLedger::with_user(3);
        ledger.set_rewards(2, RewardMapping::from_raw([("BTC", dec!(0.001))]));
        let handler = handler(ledger.clone());

        let outcome = handler.complete(user_id, 2).await.unwrap();

        assert!(outcome.credited);
        assert_eq!(outcome.amount_usd, dec!(50));
        assert_eq!(ledger.balance(), dec!(50));
    }

    #[tokio::test]
    async fn repeat_completion_is_idempotent() {
        let (ledger, user_id) = InMemoryLedger::with_user(3);
        ledger.set_rewards(2, RewardMapping::from_raw([("BTC", dec!(0.001))]));
        let handler = handler(ledger.clone());

        let first = handler.complete(user_id, 2).await.unwrap();
        let second = handler.complete(user_id, 2).await.unwrap();

        assert!(first.credited);
        assert!(!second.credited);
        assert_eq!(second.amount_usd, first.amount_usd);
        assert_eq!(ledger.balance(), dec!(50));
    }

    #[tokio::test]
    async fn tier_below_level_is_rejected() {
        let (ledger, user_id) = InMemoryLedger::with_user(2);
        let handler = handler(ledger.clone());

        let err = handler.complete(user_id, 4).await.unwrap_err();

        assert!(matches!(
            err,
            CompletionError::InsufficientTier { tier: 2, level: 4 }
        ));
        assert_eq!(ledger.balance(), dec!(0));
    }

    #[tokio::test]
    async fn tier_equal_to_level_is_allowed() {
        let (ledger, user_id) = InMemoryLedger::with_user(3);
        let handler = handler(ledger);

        let outcome = handler.complete(user_id, 3).await.unwrap();
        assert!(outcome.credited);
        assert_eq!(outcome.amount_usd, dec!(0));
    }

    #[tokio::test]
    async fn empty_reward_mapping_credits_zero() {
        let (ledger, user_id) = InMemoryLedger::with_user(5);
        let handler = handler(ledger.clone());

        let outcome = handler.complete(user_id, 5).await.unwrap();

        assert!(outcome.credited);
        assert_eq!(outcome.amount_usd, dec!(0));
        assert_eq!(ledger.balance(), dec!(0));
    }

    #[tokio::test]
    async fn invalid_level_is_rejected() {
        let (ledger, user_id) = InMemoryLedger::with_user(5);
        let handler = handler(ledger);

        assert!(matches!(
            handler.complete(user_id, 0).await.unwrap_err(),
            CompletionError::InvalidLevel(0)
        ));
        assert!(matches!(
            handler.complete(user_id, 6).await.unwrap_err(),
            CompletionError::InvalidLevel(6)
        ));
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let ledger = InMemoryLedger::empty();
        let handler = handler(ledger);

        assert!(matches!(
            handler.complete(Uuid::new_v4(), 1).await.unwrap_err(),
            CompletionError::UnknownUser
        ));
    }
}
