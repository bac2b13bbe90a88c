//! In-memory stores.
//!
//! Reference implementations of `NodeStore` and `ArcCache`: a Vec of rows in
//! insertion order plus a position index, behind a `parking_lot::RwLock`.
//! Handles are cheap to clone and share the same rows, so a test can keep
//! one and inspect state after handing the other to a machine.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ArcCache, ArcUpsert, NodeStore};
use crate::model::{Arc, FeatureValue, Node, NodeId, PairKey};
use crate::{Error, Result};

// ============================================================================
// MemoryNodeStore
// ============================================================================

#[derive(Default)]
struct NodeRows {
    rows: Vec<Node>,
    /// id → position in `rows`
    index: HashMap<NodeId, usize>,
}

/// In-memory node storage.
#[derive(Clone, Default)]
pub struct MemoryNodeStore {
    inner: std::sync::Arc<RwLock<NodeRows>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    async fn list(&self) -> Result<Vec<Node>> {
        Ok(self.inner.read().rows.clone())
    }

    async fn get(&self, id: NodeId) -> Result<Option<Node>> {
        let inner = self.inner.read();
        Ok(inner.index.get(&id).map(|&pos| inner.rows[pos].clone()))
    }

    async fn insert(&self, node: Node) -> Result<Node> {
        let mut inner = self.inner.write();
        if inner.index.contains_key(&node.id) {
            return Err(Error::StoreError(format!("Node {} already exists", node.id)));
        }
        let pos = inner.rows.len();
        inner.index.insert(node.id, pos);
        inner.rows.push(node.clone());
        Ok(node)
    }

    async fn update(&self, id: NodeId, property: &str, value: FeatureValue) -> Result<()> {
        let mut inner = self.inner.write();
        let pos = *inner
            .index
            .get(&id)
            .ok_or_else(|| Error::StoreError(format!("Node {id} not found")))?;
        inner.rows[pos].set(property, value);
        Ok(())
    }
}

// ============================================================================
// MemoryArcCache
// ============================================================================

#[derive(Default)]
struct ArcRows {
    rows: Vec<Arc>,
    /// pair → position in `rows`
    index: HashMap<PairKey, usize>,
}

/// In-memory pairwise-distance cache.
#[derive(Clone, Default)]
pub struct MemoryArcCache {
    inner: std::sync::Arc<RwLock<ArcRows>>,
}

impl MemoryArcCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArcCache for MemoryArcCache {
    async fn upsert(&self, arc: Arc) -> Result<ArcUpsert> {
        let mut inner = self.inner.write();
        match inner.index.get(&arc.pair).copied() {
            Some(pos) => {
                if inner.rows[pos].distance != arc.distance {
                    inner.rows[pos] = arc;
                }
                Ok(ArcUpsert { created: false, arc })
            }
            None => {
                let pos = inner.rows.len();
                inner.index.insert(arc.pair, pos);
                inner.rows.push(arc);
                Ok(ArcUpsert { created: true, arc })
            }
        }
    }

    async fn lookup(&self, pair: PairKey) -> Result<Option<Arc>> {
        let inner = self.inner.read();
        Ok(inner.index.get(&pair).map(|&pos| inner.rows[pos]))
    }

    async fn arcs_for(&self, id: NodeId) -> Result<Vec<Arc>> {
        let inner = self.inner.read();
        Ok(inner.rows.iter().filter(|a| a.pair.contains(id)).copied().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().rows.len())
    }
}
