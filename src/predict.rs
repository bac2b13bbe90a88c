//! Majority vote and the prediction result type.

use serde::{Deserialize, Serialize};

use crate::model::{FeatureMap, FeatureValue, NodeId};
use crate::neighbors::Neighbor;

/// Outcome of one `guess` call.
///
/// `node_id` is the id the query node was stored under; `input` echoes the
/// features it was stored with (before any write-back). `value` is `None`
/// when no neighbor carried the target property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub property: String,
    pub value: Option<FeatureValue>,
    pub elapsed_ms: u64,
    pub node_id: NodeId,
    pub input: FeatureMap,
}

/// Majority vote over the neighbors' values for `property`.
///
/// Two passes: first tally each distinct value (distinct values keep
/// first-encounter order), then scan the tally replacing the leader whenever
/// a count is greater than *or equal to* the running max. The `>=` means a
/// tie goes to the latest-encountered value among the tied ones.
pub fn vote(neighbors: &[Neighbor], property: &str) -> Option<FeatureValue> {
    let mut tally: Vec<(&FeatureValue, usize)> = Vec::new();
    for neighbor in neighbors {
        let Some(value) = neighbor.node.get(property) else { continue };
        match tally.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => tally.push((value, 1)),
        }
    }

    let mut max = 0;
    let mut winner = None;
    for (value, count) in &tally {
        if *count >= max {
            max = *count;
            winner = Some(*value);
        }
    }
    winner.cloned()
}
