//! # Store Traits
//!
//! The contract between the machine and whatever holds its nodes and arcs.
//! Node storage and the pairwise-distance cache are separate capabilities:
//! a deployment may keep nodes in a database and arcs in memory, or both in
//! the same collection pair.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryNodeStore` / `MemoryArcCache` | `memory` | In-process, for testing/embedding |
//! | `CollectionNodeStore` / `CollectionArcCache` | `collection` | Any keyed-document backend |

pub mod collection;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value as Document;

use crate::model::{Arc, FeatureValue, Node, NodeId, PairKey};
use crate::Result;

pub use collection::{CollectionArcCache, CollectionNodeStore, MemoryCollection};
pub use memory::{MemoryArcCache, MemoryNodeStore};

// ============================================================================
// Upsert outcome
// ============================================================================

/// What an [`ArcCache::upsert`] did.
///
/// `created` is true only when the pair was previously absent; refreshing an
/// existing arc (same or different distance) reports false. The machine's
/// "arcs calculated" accounting counts created arcs only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcUpsert {
    pub created: bool,
    pub arc: Arc,
}

// ============================================================================
// NodeStore
// ============================================================================

/// Node persistence capability.
///
/// Methods take `&self`; implementations synchronize internally. Insertion
/// order is part of the contract — `list` replays it, and everything
/// downstream that breaks ties by encounter order depends on it.
#[async_trait]
pub trait NodeStore: Send + Sync + 'static {
    /// All nodes, in insertion order.
    async fn list(&self) -> Result<Vec<Node>>;

    /// Fetch a node by id. Absent is `Ok(None)`, never an error.
    async fn get(&self, id: NodeId) -> Result<Option<Node>>;

    /// Insert a new node and return it. A duplicate id is a `StoreError`.
    async fn insert(&self, node: Node) -> Result<Node>;

    /// Overwrite one feature on an existing node (the post-prediction
    /// write-back). Unknown id is a `StoreError`.
    async fn update(&self, id: NodeId, property: &str, value: FeatureValue) -> Result<()>;
}

// ============================================================================
// ArcCache
// ============================================================================

/// Pairwise-distance cache capability.
#[async_trait]
pub trait ArcCache: Send + Sync + 'static {
    /// Insert or refresh an arc. Absent pair → insert, `created = true`;
    /// known pair → overwrite in place, `created = false` (equal distance is
    /// a no-op). Idempotent, so a retry after a mid-pass failure is safe.
    async fn upsert(&self, arc: Arc) -> Result<ArcUpsert>;

    /// Fetch the cached arc for a pair, if any.
    async fn lookup(&self, pair: PairKey) -> Result<Option<Arc>>;

    /// All arcs touching the given node, in insertion order.
    async fn arcs_for(&self, id: NodeId) -> Result<Vec<Arc>>;

    /// Number of cached arcs.
    async fn count(&self) -> Result<usize>;
}

// ============================================================================
// DocumentCollection
// ============================================================================

/// Acknowledgement of a collection write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteAck {
    pub acknowledged: bool,
}

/// The boundary where a real database driver plugs in.
///
/// A keyed JSON-document collection: node documents are keyed by the node
/// id's simple form, arc documents by the canonical `"{lo}:{hi}"` pair key.
/// The collection stores and returns documents verbatim — all domain
/// (de)serialization happens in the stores layered on top.
///
/// An unacknowledged write is surfaced by those stores as `StoreError`.
#[async_trait]
pub trait DocumentCollection: Send + Sync + 'static {
    /// Every document in the collection, in insertion order.
    async fn find_all(&self) -> Result<Vec<Document>>;

    /// Fetch one document by key.
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>>;

    /// Insert a document under a new key.
    async fn insert(&self, id: &str, doc: Document) -> Result<WriteAck>;

    /// Replace the document under an existing key.
    async fn update_by_id(&self, id: &str, doc: Document) -> Result<WriteAck>;
}
