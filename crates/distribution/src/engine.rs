//! The reward distribution engine.
//!
//! Splits a user's per-network USD-equivalent reward across the successful
//! fingerprint nodes of a level graph using stick-breaking weights. The
//! engine is a single-pass pure transform: it clones the shared template,
//! writes share amounts on the clone, and never errors — degraded inputs
//! (no nodes, no reward, no rate) degrade to zeroed amounts.

use crate::graph::LevelGraph;
use crate::weights::generate_weights;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use tier_rewards_core::{MissingRateSetting, Network, RateTable, RewardMapping};

/// Minimum visible share. Nodes whose rounded share collapses to zero while
/// the group carried reward are bumped here so the animation never shows an
/// empty successful transaction. This trades a few cents of exact-sum for
/// display coherence.
const MIN_VISIBLE_SHARE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// What to do when a graph currency has no entry in the rate table.
///
/// Silently assuming USD parity would misprice non-stablecoin assets, so
/// the choice is an explicit, configurable policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingRatePolicy {
    /// Zero the group's nodes. Default.
    Skip,
    /// Treat 1 native unit as 1 USD.
    AssumeParity,
    /// Use a fixed rate for every unpriced currency.
    Fixed(Decimal),
}

impl Default for MissingRatePolicy {
    fn default() -> Self {
        Self::Skip
    }
}

impl From<MissingRateSetting> for MissingRatePolicy {
    fn from(setting: MissingRateSetting) -> Self {
        match setting {
            MissingRateSetting::Skip => Self::Skip,
            MissingRateSetting::Parity => Self::AssumeParity,
            MissingRateSetting::Fixed(rate) => Self::Fixed(rate),
        }
    }
}

/// Distributes per-network rewards across level graph nodes.
#[derive(Debug, Clone, Default)]
pub struct RewardDistributor {
    policy: MissingRatePolicy,
    seed: Option<u64>,
}

impl RewardDistributor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the missing-rate policy.
    #[must_use]
    pub fn with_policy(mut self, policy: MissingRatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets a seed for reproducible distributions. Without a seed each call
    /// draws fresh entropy.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns a clone of `template` with reward shares written onto its
    /// successful fingerprint nodes.
    ///
    /// Success nodes of currencies with no reward (or no usable rate under
    /// the policy) are zeroed; non-success and non-fingerprint nodes are
    /// never written. The template itself is untouched.
    #[must_use]
    pub fn distribute(
        &self,
        template: &LevelGraph,
        rewards: &RewardMapping,
        rates: &RateTable,
    ) -> LevelGraph {
        let mut graph = template.clone();
        let mut rng = self
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);

        // Group success-node indices by normalized network. BTreeMap keeps
        // group order stable so seeded runs are reproducible.
        let mut groups: BTreeMap<Network, Vec<usize>> = BTreeMap::new();
        let mut unpriceable: Vec<usize> = Vec::new();

        for (i, node) in graph.nodes.iter().enumerate() {
            if !node.is_success_fingerprint() {
                continue;
            }
            let Some(tx) = node.transaction.as_ref() else {
                continue;
            };
            match tx.network() {
                Some(network) => groups.entry(network).or_default().push(i),
                None => {
                    tracing::warn!(currency = %tx.currency, "Unknown graph currency, zeroing");
                    unpriceable.push(i);
                }
            }
        }

        // Unknown currencies can never match a reward mapping key.
        for i in unpriceable {
            set_amount(&mut graph, i, Decimal::ZERO);
        }

        for (network, indices) in groups {
            let amount = rewards.amount(network);
            let total_usd = if amount <= Decimal::ZERO {
                Decimal::ZERO
            } else {
                self.to_usd(amount, network, rates)
            };

            if total_usd <= Decimal::ZERO {
                for i in indices {
                    set_amount(&mut graph, i, Decimal::ZERO);
                }
                continue;
            }

            let weights = generate_weights(&mut rng, indices.len());
            for (i, weight) in indices.into_iter().zip(weights) {
                let factor = Decimal::from_f64_retain(weight).unwrap_or_default();
                let share = (total_usd * factor)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                let share = if share.is_zero() {
                    MIN_VISIBLE_SHARE
                } else {
                    share
                };
                set_amount(&mut graph, i, share);
            }
        }

        graph
    }

    fn to_usd(&self, amount: Decimal, network: Network, rates: &RateTable) -> Decimal {
        match rates.get(&network) {
            Some(rate) => amount * rate,
            None => match self.policy {
                MissingRatePolicy::Skip => {
                    tracing::warn!(%network, "No rate for graph currency, skipping group");
                    Decimal::ZERO
                }
                MissingRatePolicy::AssumeParity => amount,
                MissingRatePolicy::Fixed(rate) => amount * rate,
            },
        }
    }
}

fn set_amount(graph: &mut LevelGraph, index: usize, amount: Decimal) {
    if let Some(tx) = graph
        .nodes
        .get_mut(index)
        .and_then(|n| n.transaction.as_mut())
    {
        tx.amount = amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphNode, NodeTransaction, TxStatus, FINGERPRINT_KIND};
    use rust_decimal_macros::dec;

    fn fingerprint(id: &str, currency: &str, status: TxStatus, amount: Decimal) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind: FINGERPRINT_KIND.to_string(),
            transaction: Some(NodeTransaction {
                status,
                currency: currency.to_string(),
                amount,
            }),
        }
    }

    fn success(id: &str, currency: &str) -> GraphNode {
        fingerprint(id, currency, TxStatus::Success, dec!(0))
    }

    fn graph(nodes: Vec<GraphNode>) -> LevelGraph {
        LevelGraph {
            nodes,
            edges: serde_json::json!([]),
        }
    }

    fn rates(pairs: &[(Network, Decimal)]) -> RateTable {
        pairs.iter().copied().collect()
    }

    fn node_amount(g: &LevelGraph, id: &str) -> Decimal {
        g.nodes
            .iter()
            .find(|n| n.id == id)
            .and_then(|n| n.transaction.as_ref())
            .map(|tx| tx.amount)
            .unwrap()
    }

    #[test]
    fn preserves_group_total_within_rounding_slack() {
        let template = graph(vec![
            success("a", "BTC"),
            success("b", "BTC"),
            success("c", "BTC"),
            success("d", "BTC"),
            success("e", "BTC"),
        ]);
        let rewards = RewardMapping::from_raw([("BTC", dec!(2))]);
        let table = rates(&[(Network::Btc, dec!(50))]);

        let distributor = RewardDistributor::new().with_seed(42);
        let out = distributor.distribute(&template, &rewards, &table);

        let total: Decimal = out
            .nodes
            .iter()
            .filter_map(|n| n.transaction.as_ref())
            .map(|tx| tx.amount)
            .sum();

        // 5 nodes: each rounds within half a cent, a floor bump adds at
        // most another cent per node.
        let slack = dec!(0.01) * Decimal::from(5u32);
        assert!((total - dec!(100)).abs() <= slack, "total={total}");

        for node in &out.nodes {
            let amount = node.transaction.as_ref().unwrap().amount;
            assert!(amount >= dec!(0.01), "share below floor: {amount}");
            assert_eq!(amount, amount.round_dp(2), "share not cent-rounded");
        }
    }

    #[test]
    fn single_node_receives_full_amount() {
        let template = graph(vec![success("a", "ETH")]);
        let rewards = RewardMapping::from_raw([("ETH", dec!(2))]);
        let table = rates(&[(Network::Eth, dec!(3000))]);

        let out = RewardDistributor::new()
            .with_seed(1)
            .distribute(&template, &rewards, &table);

        assert_eq!(node_amount(&out, "a"), dec!(6000));
    }

    #[test]
    fn zero_reward_zeroes_success_nodes() {
        let template = graph(vec![
            fingerprint("a", "BTC", TxStatus::Success, dec!(7)),
            fingerprint("b", "BTC", TxStatus::Success, dec!(9)),
        ]);
        let rewards = RewardMapping::new();
        let table = rates(&[(Network::Btc, dec!(45000))]);

        let out = RewardDistributor::new().distribute(&template, &rewards, &table);

        assert_eq!(node_amount(&out, "a"), dec!(0));
        assert_eq!(node_amount(&out, "b"), dec!(0));
    }

    #[test]
    fn non_success_nodes_are_never_written() {
        let template = graph(vec![
            fingerprint("pending", "BTC", TxStatus::Pending, dec!(99)),
            fingerprint("failed", "BTC", TxStatus::Failed, dec!(99)),
            success("ok", "BTC"),
        ]);
        let rewards = RewardMapping::from_raw([("BTC", dec!(1))]);
        let table = rates(&[(Network::Btc, dec!(100))]);

        let out = RewardDistributor::new()
            .with_seed(3)
            .distribute(&template, &rewards, &table);

        assert_eq!(node_amount(&out, "pending"), dec!(99));
        assert_eq!(node_amount(&out, "failed"), dec!(99));
        assert_eq!(node_amount(&out, "ok"), dec!(100));
    }

    #[test]
    fn graph_currency_aliases_match_reward_keys() {
        // Template says TRX, reward ledger says TRON.
        let template = graph(vec![success("t", "TRX")]);
        let rewards = RewardMapping::from_raw([("TRON", dec!(100))]);
        let table = rates(&[(Network::Tron, dec!(0.1))]);

        let out = RewardDistributor::new()
            .with_seed(4)
            .distribute(&template, &rewards, &table);

        assert_eq!(node_amount(&out, "t"), dec!(10.00));
    }

    #[test]
    fn unknown_graph_currency_is_zeroed() {
        let template = graph(vec![fingerprint("x", "DOGE", TxStatus::Success, dec!(5))]);
        let rewards = RewardMapping::from_raw([("BTC", dec!(1))]);
        let table = rates(&[(Network::Btc, dec!(45000))]);

        let out = RewardDistributor::new().distribute(&template, &rewards, &table);

        assert_eq!(node_amount(&out, "x"), dec!(0));
    }

    #[test]
    fn reward_currency_absent_from_graph_is_ignored() {
        let template = graph(vec![success("a", "BTC")]);
        let rewards = RewardMapping::from_raw([("SOL", dec!(10))]);
        let table = rates(&[(Network::Btc, dec!(1)), (Network::Sol, dec!(100))]);

        let out = RewardDistributor::new().distribute(&template, &rewards, &table);

        // The SOL reward has no nodes; the BTC group has no reward.
        assert_eq!(node_amount(&out, "a"), dec!(0));
    }

    #[test]
    fn empty_graph_returns_clone() {
        let template = graph(vec![]);
        let rewards = RewardMapping::from_raw([("BTC", dec!(1))]);

        let out = RewardDistributor::new().distribute(&template, &rewards, &RateTable::new());

        assert_eq!(out, template);
    }

    #[test]
    fn missing_rate_skip_policy_zeroes_group() {
        let template = graph(vec![success("a", "SOL"), success("b", "SOL")]);
        let rewards = RewardMapping::from_raw([("SOL", dec!(10))]);
        let table = RateTable::new();

        let out = RewardDistributor::new()
            .with_policy(MissingRatePolicy::Skip)
            .distribute(&template, &rewards, &table);

        assert_eq!(node_amount(&out, "a"), dec!(0));
        assert_eq!(node_amount(&out, "b"), dec!(0));
    }

    #[test]
    fn missing_rate_parity_policy_values_at_face() {
        let template = graph(vec![success("a", "SOL")]);
        let rewards = RewardMapping::from_raw([("SOL", dec!(10))]);

        let out = RewardDistributor::new()
            .with_policy(MissingRatePolicy::AssumeParity)
            .distribute(&template, &rewards, &RateTable::new());

        assert_eq!(node_amount(&out, "a"), dec!(10));
    }

    #[test]
    fn missing_rate_fixed_policy_applies_rate() {
        let template = graph(vec![success("a", "SOL")]);
        let rewards = RewardMapping::from_raw([("SOL", dec!(10))]);

        let out = RewardDistributor::new()
            .with_policy(MissingRatePolicy::Fixed(dec!(2.5)))
            .distribute(&template, &rewards, &RateTable::new());

        assert_eq!(node_amount(&out, "a"), dec!(25));
    }

    #[test]
    fn template_is_never_mutated() {
        let template = graph(vec![success("a", "BTC"), success("b", "ETH")]);
        let original = template.clone();
        let table = rates(&[(Network::Btc, dec!(45000)), (Network::Eth, dec!(3000))]);

        let distributor = RewardDistributor::new().with_seed(9);
        let first = distributor.distribute(
            &template,
            &RewardMapping::from_raw([("BTC", dec!(1))]),
            &table,
        );
        let second = distributor.distribute(
            &template,
            &RewardMapping::from_raw([("ETH", dec!(1))]),
            &table,
        );

        assert_eq!(template, original);
        // The second call starts from the untouched template: its BTC node
        // is zeroed, not carrying the first call's share.
        assert_eq!(node_amount(&second, "a"), dec!(0));
        assert_eq!(node_amount(&first, "a"), dec!(45000));
        assert_eq!(node_amount(&second, "b"), dec!(3000));
    }

    #[test]
    fn low_weight_shares_are_floor_bumped() {
        // Many nodes with a tiny total force rounded-zero shares.
        let nodes: Vec<GraphNode> = (0..20)
            .map(|i| success(&format!("n{i}"), "USDT"))
            .collect();
        let template = graph(nodes);
        let rewards = RewardMapping::from_raw([("USDT", dec!(0.05))]);
        let table = rates(&[(Network::Usdt, dec!(1))]);

        let out = RewardDistributor::new()
            .with_seed(11)
            .distribute(&template, &rewards, &table);

        for node in &out.nodes {
            let amount = node.transaction.as_ref().unwrap().amount;
            assert!(amount >= dec!(0.01), "group total was > 0, share was {amount}");
        }
    }
}
