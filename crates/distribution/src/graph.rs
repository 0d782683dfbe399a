//! Level visualization graph types.
//!
//! Templates are shared config read by every user of a level, so they are
//! treated as immutable values: the distribution engine works on an owned
//! structural clone and never touches the original. Edges are opaque to the
//! engine and pass through unchanged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tier_rewards_core::Network;

/// Node type tag carried by reward-bearing fingerprint nodes. All other
/// tags (labels, decorations) are preserved verbatim and ignored.
pub const FINGERPRINT_KIND: &str = "fingerprintNode";

/// Simulated transaction status. Only `Success` nodes are eligible to
/// receive distributed reward amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Success,
    Pending,
    Failed,
    #[serde(other)]
    Other,
}

/// The simulated transaction attached to a fingerprint node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTransaction {
    pub status: TxStatus,
    /// Raw currency symbol as authored in the template (may use aliases
    /// like `TRX`); normalized through `Network::parse` at grouping time.
    pub currency: String,
    pub amount: Decimal,
}

impl NodeTransaction {
    /// Normalized network for this transaction's currency, if supported.
    #[must_use]
    pub fn network(&self) -> Option<Network> {
        Network::parse(&self.currency)
    }
}

/// A single node of a level graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    /// Node type tag; compared against [`FINGERPRINT_KIND`], other tags
    /// pass through untouched.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<NodeTransaction>,
}

impl GraphNode {
    /// True when this node carries reward semantics.
    #[must_use]
    pub fn is_fingerprint(&self) -> bool {
        self.kind == FINGERPRINT_KIND
    }

    /// True when this node can receive a distributed reward share.
    #[must_use]
    pub fn is_success_fingerprint(&self) -> bool {
        self.is_fingerprint()
            && self
                .transaction
                .as_ref()
                .is_some_and(|tx| tx.status == TxStatus::Success)
    }
}

/// A level's visualization graph: ordered nodes plus opaque edge data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelGraph {
    pub nodes: Vec<GraphNode>,
    /// Connectivity payload, passed through unchanged.
    #[serde(default)]
    pub edges: serde_json::Value,
}
