//! Arc — a cached scalar distance between two nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Normalized unordered pair of node identifiers.
///
/// The two endpoints are stored in sorted order so that `(a, b)` and
/// `(b, a)` key the same arc. A self-pair is not representable:
/// [`PairKey::new`] returns `None` when both ids are equal.
///
/// Serializes as the two-element array `[lo, hi]`, which is how arc
/// documents carry their endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "(NodeId, NodeId)", try_from = "(NodeId, NodeId)")]
pub struct PairKey {
    lo: NodeId,
    hi: NodeId,
}

impl PairKey {
    /// Build the canonical key for two distinct node ids.
    pub fn new(a: NodeId, b: NodeId) -> Option<Self> {
        if a == b {
            return None;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        Some(Self { lo, hi })
    }

    pub fn lo(&self) -> NodeId { self.lo }
    pub fn hi(&self) -> NodeId { self.hi }

    /// Does this pair include the given node?
    pub fn contains(&self, id: NodeId) -> bool {
        self.lo == id || self.hi == id
    }

    /// The other endpoint, if `id` is one of the two.
    pub fn other(&self, id: NodeId) -> Option<NodeId> {
        if id == self.lo { Some(self.hi) }
        else if id == self.hi { Some(self.lo) }
        else { None }
    }
}

impl From<PairKey> for (NodeId, NodeId) {
    fn from(pair: PairKey) -> Self {
        (pair.lo, pair.hi)
    }
}

impl TryFrom<(NodeId, NodeId)> for PairKey {
    type Error = String;

    fn try_from((a, b): (NodeId, NodeId)) -> Result<Self, Self::Error> {
        PairKey::new(a, b).ok_or_else(|| format!("self arc on node {a}"))
    }
}

/// Canonical `"{lo}:{hi}"` form, used as the document key by
/// collection-backed arc caches.
impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.lo, self.hi)
    }
}

/// A cached pairwise distance. At most one arc exists per unordered pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub pair: PairKey,
    /// Non-negative aggregate distance between the two endpoints.
    pub distance: f64,
}

impl Arc {
    pub fn new(pair: PairKey, distance: f64) -> Self {
        Self { pair, distance }
    }
}
