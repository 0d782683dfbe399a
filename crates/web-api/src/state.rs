use crate::animation::AnimationCompletionHandler;
use std::sync::Arc;
use tier_rewards_core::{GraphSource, NetworkRewardStore, RateRepository, UserLedger};
use tier_rewards_distribution::RewardDistributor;
use tier_rewards_rates::{ConversionRateStore, PriceOracle};

/// Shared state handed to every request handler.
///
/// Persistence is held behind the core trait objects so handlers are
/// testable against in-memory implementations.
pub struct AppState {
    pub rates: Arc<ConversionRateStore>,
    pub rate_repo: Arc<dyn RateRepository>,
    pub rewards: Arc<dyn NetworkRewardStore>,
    pub ledger: Arc<dyn UserLedger>,
    pub graphs: Arc<dyn GraphSource>,
    pub oracle: Arc<PriceOracle>,
    pub distributor: RewardDistributor,
}

impl AppState {
    /// The animation completion orchestrator over this state's ledger and
    /// rate store.
    #[must_use]
    pub fn animation_handler(&self) -> AnimationCompletionHandler {
        AnimationCompletionHandler::new(self.ledger.clone(), self.rates.clone())
    }
}
