//! Collection-backed stores.
//!
//! `CollectionNodeStore` and `CollectionArcCache` speak to any
//! [`DocumentCollection`], translating between domain types and keyed JSON
//! documents. `MemoryCollection` is the in-memory reference collection, so
//! this whole code path is testable without a real database.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value as Document;

use super::{ArcCache, ArcUpsert, DocumentCollection, NodeStore, WriteAck};
use crate::model::{Arc, FeatureValue, Node, NodeId, PairKey};
use crate::{Error, Result};

fn encode<T: Serialize>(value: &T) -> Result<Document> {
    serde_json::to_value(value).map_err(|e| Error::StoreError(e.to_string()))
}

fn decode_node(doc: Document) -> Result<Node> {
    serde_json::from_value(doc)
        .map_err(|e| Error::StoreError(format!("Malformed node document: {e}")))
}

fn decode_arc(doc: Document) -> Result<Arc> {
    serde_json::from_value(doc)
        .map_err(|e| Error::StoreError(format!("Malformed arc document: {e}")))
}

fn require_ack(ack: WriteAck, key: &str) -> Result<()> {
    if ack.acknowledged {
        Ok(())
    } else {
        Err(Error::StoreError(format!("Write for {key} was not acknowledged")))
    }
}

// ============================================================================
// CollectionNodeStore
// ============================================================================

/// Node storage over a keyed-document collection.
///
/// Documents are keyed by the node id's simple form.
pub struct CollectionNodeStore {
    collection: Box<dyn DocumentCollection>,
}

impl CollectionNodeStore {
    pub fn new(collection: impl DocumentCollection) -> Self {
        Self { collection: Box::new(collection) }
    }
}

#[async_trait]
impl NodeStore for CollectionNodeStore {
    async fn list(&self) -> Result<Vec<Node>> {
        self.collection.find_all().await?.into_iter().map(decode_node).collect()
    }

    async fn get(&self, id: NodeId) -> Result<Option<Node>> {
        self.collection.find_by_id(&id.to_string()).await?.map(decode_node).transpose()
    }

    async fn insert(&self, node: Node) -> Result<Node> {
        let key = node.id.to_string();
        if self.collection.find_by_id(&key).await?.is_some() {
            return Err(Error::StoreError(format!("Node {key} already exists")));
        }
        let ack = self.collection.insert(&key, encode(&node)?).await?;
        require_ack(ack, &key)?;
        Ok(node)
    }

    async fn update(&self, id: NodeId, property: &str, value: FeatureValue) -> Result<()> {
        let key = id.to_string();
        let doc = self
            .collection
            .find_by_id(&key)
            .await?
            .ok_or_else(|| Error::StoreError(format!("Node {key} not found")))?;
        let mut node = decode_node(doc)?;
        node.set(property, value);
        let ack = self.collection.update_by_id(&key, encode(&node)?).await?;
        require_ack(ack, &key)
    }
}

// ============================================================================
// CollectionArcCache
// ============================================================================

/// Pairwise-distance cache over a keyed-document collection.
///
/// Documents are keyed by the canonical `"{lo}:{hi}"` pair key, which is
/// what makes the upsert order-independent without any pattern lookup.
pub struct CollectionArcCache {
    collection: Box<dyn DocumentCollection>,
}

impl CollectionArcCache {
    pub fn new(collection: impl DocumentCollection) -> Self {
        Self { collection: Box::new(collection) }
    }
}

#[async_trait]
impl ArcCache for CollectionArcCache {
    async fn upsert(&self, arc: Arc) -> Result<ArcUpsert> {
        let key = arc.pair.to_string();
        match self.collection.find_by_id(&key).await? {
            Some(doc) => {
                if decode_arc(doc)?.distance != arc.distance {
                    let ack = self.collection.update_by_id(&key, encode(&arc)?).await?;
                    require_ack(ack, &key)?;
                }
                Ok(ArcUpsert { created: false, arc })
            }
            None => {
                let ack = self.collection.insert(&key, encode(&arc)?).await?;
                require_ack(ack, &key)?;
                Ok(ArcUpsert { created: true, arc })
            }
        }
    }

    async fn lookup(&self, pair: PairKey) -> Result<Option<Arc>> {
        self.collection.find_by_id(&pair.to_string()).await?.map(decode_arc).transpose()
    }

    async fn arcs_for(&self, id: NodeId) -> Result<Vec<Arc>> {
        let mut arcs = Vec::new();
        for doc in self.collection.find_all().await? {
            let arc = decode_arc(doc)?;
            if arc.pair.contains(id) {
                arcs.push(arc);
            }
        }
        Ok(arcs)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.collection.find_all().await?.len())
    }
}

// ============================================================================
// MemoryCollection
// ============================================================================

#[derive(Debug)]
struct Rows {
    docs: Vec<(String, Document)>,
    /// key → position in `docs`
    index: HashMap<String, usize>,
    ack_writes: bool,
}

impl Default for Rows {
    fn default() -> Self {
        Self { docs: Vec::new(), index: HashMap::new(), ack_writes: true }
    }
}

/// In-memory reference [`DocumentCollection`].
///
/// Cheap-clone shared handle; clones see the same documents. Writes can be
/// switched to unacknowledged (and dropped) to exercise the error path a
/// real driver would hit on a failed write concern.
#[derive(Clone, Default)]
pub struct MemoryCollection {
    inner: std::sync::Arc<RwLock<Rows>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `false`, subsequent writes are dropped and report
    /// `acknowledged = false`.
    pub fn acknowledge_writes(&self, ack: bool) {
        self.inner.write().ack_writes = ack;
    }

    pub fn len(&self) -> usize {
        self.inner.read().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().docs.is_empty()
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    async fn find_all(&self) -> Result<Vec<Document>> {
        Ok(self.inner.read().docs.iter().map(|(_, doc)| doc.clone()).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>> {
        let inner = self.inner.read();
        Ok(inner.index.get(id).map(|&pos| inner.docs[pos].1.clone()))
    }

    async fn insert(&self, id: &str, doc: Document) -> Result<WriteAck> {
        let mut inner = self.inner.write();
        if !inner.ack_writes {
            return Ok(WriteAck { acknowledged: false });
        }
        if inner.index.contains_key(id) {
            return Err(Error::StoreError(format!("Duplicate key {id}")));
        }
        let pos = inner.docs.len();
        inner.index.insert(id.to_string(), pos);
        inner.docs.push((id.to_string(), doc));
        Ok(WriteAck { acknowledged: true })
    }

    async fn update_by_id(&self, id: &str, doc: Document) -> Result<WriteAck> {
        let mut inner = self.inner.write();
        if !inner.ack_writes {
            return Ok(WriteAck { acknowledged: false });
        }
        let pos = *inner
            .index
            .get(id)
            .ok_or_else(|| Error::StoreError(format!("No document with key {id}")))?;
        inner.docs[pos].1 = doc;
        Ok(WriteAck { acknowledged: true })
    }
}
