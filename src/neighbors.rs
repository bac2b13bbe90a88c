//! k-nearest retrieval from the arc cache.

use crate::model::{Node, NodeId};
use crate::store::{ArcCache, NodeStore};
use crate::Result;

/// A resolved neighbor: the node at the far end of an arc, with the cached
/// distance to the query node.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub node: Node,
    pub distance: f64,
}

/// Fetch the `k` nearest neighbors of `id`.
///
/// Arcs touching `id` are sorted ascending by distance (stable, so equal
/// distances keep cache insertion order), truncated to `k`, and the far
/// endpoints resolved against the node store. Fewer than `k` arcs returns
/// all available; an arc whose far endpoint is missing from the store is
/// dropped from the result rather than reported as an error.
pub async fn nearest<N, A>(nodes: &N, arcs: &A, id: NodeId, k: usize) -> Result<Vec<Neighbor>>
where
    N: NodeStore,
    A: ArcCache,
{
    let mut candidates = arcs.arcs_for(id).await?;
    candidates.sort_by(|x, y| x.distance.total_cmp(&y.distance));
    candidates.truncate(k);

    let mut neighbors = Vec::with_capacity(candidates.len());
    for arc in candidates {
        let Some(other) = arc.pair.other(id) else { continue };
        if let Some(node) = nodes.get(other).await? {
            neighbors.push(Neighbor { node, distance: arc.distance });
        }
    }
    Ok(neighbors)
}
