//! # knearest-rs — Lazy k-Nearest-Neighbour Classification
//!
//! A clean Rust reimplementation of the classic lazy k-NN machine: seed it
//! with feature vectors, ask it to guess a missing property, and the k
//! nearest neighbours vote on the answer. Distances are range-normalized,
//! computed on demand, and cached as arcs so repeat guesses stay cheap.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `NodeStore` and `ArcCache` are the contracts between machine and storage
//! 2. **Clean DTOs**: `Node`, `Arc`, `FeatureValue` cross all boundaries
//! 3. **Lazy evaluation**: nothing is computed until a guess needs it
//! 4. **Storage-agnostic pipeline**: ranges, arcs, and votes never know where rows live
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use knearest_rs::{features, Machine, MachineConfig, PropertyDef};
//!
//! # async fn example() -> knearest_rs::Result<()> {
//! let config = MachineConfig::new(vec![
//!     PropertyDef::number("rooms"),
//!     PropertyDef::number("area"),
//!     PropertyDef::number("type"),
//! ])
//! .with_k(3);
//!
//! let mut machine = Machine::open_memory(config)?;
//! machine.load_nodes(vec![
//!     features([("rooms", 1.0), ("area", 350.0), ("type", 1.0)]),
//!     features([("rooms", 9.0), ("area", 1300.0), ("type", 2.0)]),
//! ]).await?;
//!
//! let result = machine.guess("type", features([("rooms", 12.0), ("area", 1375.0)])).await?;
//! println!("{:?}", result.value);
//! # Ok(())
//! # }
//! ```
//!
//! ## Stores
//!
//! | Store | Constructor | Description |
//! |-------|-------------|-------------|
//! | Memory | `Machine::open_memory` | In-memory rows for testing/embedding |
//! | Collection | `Machine::open_collection` | Any keyed-document backend behind `DocumentCollection` |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod schema;
pub mod config;
pub mod store;
pub mod distance;
pub mod ranges;
pub mod neighbors;
pub mod predict;
pub mod observer;

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info};

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    features, Arc, FeatureKind, FeatureMap, FeatureValue,
    Node, NodeId, PairKey,
};

// ============================================================================
// Re-exports: Schema & Configuration
// ============================================================================

pub use config::{ArcMode, MachineConfig};
pub use schema::{FeatureSchema, PropertyDef, PropertyStats};

// ============================================================================
// Re-exports: Storage
// ============================================================================

pub use store::{
    ArcCache, ArcUpsert, CollectionArcCache, CollectionNodeStore,
    DocumentCollection, MemoryArcCache, MemoryCollection, MemoryNodeStore,
    NodeStore, WriteAck,
};

// ============================================================================
// Re-exports: Distance & Prediction
// ============================================================================

pub use distance::{DistanceEngine, StringAlgorithm};
pub use neighbors::Neighbor;
pub use predict::PredictionResult;

// ============================================================================
// Re-exports: Observability
// ============================================================================

pub use observer::{MachineEvent, MachineObserver};

// ============================================================================
// Deadline
// ============================================================================

/// Cooperative time budget for one guess. Checked between pipeline stages
/// and before each pairwise distance; an expired guess leaves the stored
/// query node and a prefix of idempotent arc upserts behind.
struct Deadline {
    start: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    fn start(limit: Option<Duration>) -> Self {
        Self { start: Instant::now(), limit }
    }

    fn check(&self) -> Result<()> {
        if let Some(limit) = self.limit {
            if self.start.elapsed() >= limit {
                return Err(Error::Timeout { elapsed_ms: self.elapsed_ms() });
            }
        }
        Ok(())
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

// ============================================================================
// Top-level Machine handle
// ============================================================================

/// The primary entry point. A `Machine` owns a schema, a node store, and an
/// arc cache, and turns partially-labeled feature vectors into predictions.
///
/// Guessing takes `&mut self`: one guess at a time per machine, enforced at
/// compile time. The stores themselves are internally synchronized, so
/// read-only inspection from other tasks stays safe while a guess runs.
pub struct Machine<N: NodeStore, A: ArcCache> {
    config: MachineConfig,
    schema: FeatureSchema,
    nodes: N,
    arcs: A,
    observers: Vec<Box<dyn MachineObserver>>,
}

impl<N: NodeStore, A: ArcCache> fmt::Debug for Machine<N, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("config", &self.config)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl<N: NodeStore, A: ArcCache> Machine<N, A> {
    /// Create a machine over caller-supplied stores.
    ///
    /// Fails with [`Error::InvalidSchema`] when the config declares no
    /// properties, duplicates a name, or sets `k = 0`.
    pub fn with_stores(config: MachineConfig, nodes: N, arcs: A) -> Result<Self> {
        config.validate()?;
        let schema = FeatureSchema::declare(config.properties.clone())?;
        Ok(Self { config, schema, nodes, arcs, observers: Vec::new() })
    }

    /// Register an observer. Observers run synchronously, in registration
    /// order, on the task driving the machine.
    pub fn subscribe(&mut self, observer: Box<dyn MachineObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Access the node store (for inspection and tests).
    pub fn nodes(&self) -> &N {
        &self.nodes
    }

    /// Access the arc cache (for inspection and tests).
    pub fn arcs(&self) -> &A {
        &self.arcs
    }

    /// Validate and store one node.
    pub async fn insert_node(&mut self, features: FeatureMap) -> Result<Node> {
        self.store_node(features).await.map_err(|e| self.fail(e))
    }

    /// Sequential, order-preserving bulk insert. Stops at the first failure,
    /// leaving earlier nodes stored.
    pub async fn load_nodes(
        &mut self,
        nodes: impl IntoIterator<Item = FeatureMap>,
    ) -> Result<Vec<Node>> {
        let mut stored = Vec::new();
        for features in nodes {
            let node = self.store_node(features).await.map_err(|e| self.fail(e))?;
            stored.push(node);
        }
        Ok(stored)
    }

    /// Predict the value of `property` for the given features.
    ///
    /// The input becomes a regular node first, then ranges and arcs are
    /// refreshed over the whole population and the `k` nearest neighbours
    /// vote (a tie goes to the latest-encountered value among the tied
    /// ones). When `update_on_predict` is set and the vote produced a value,
    /// it is written back onto the stored query node.
    ///
    /// Fails before any mutation when `property` is undeclared
    /// ([`Error::UnknownProperty`]) or the input violates the schema
    /// ([`Error::SchemaViolation`]). Every failure is also emitted as
    /// [`MachineEvent::Error`].
    pub async fn guess(&mut self, property: &str, input: FeatureMap) -> Result<PredictionResult> {
        let deadline = Deadline::start(self.config.guess_timeout);
        match self.run_guess(property, input, &deadline).await {
            Ok(result) => Ok(result),
            Err(error) => Err(self.fail(error)),
        }
    }

    async fn run_guess(
        &mut self,
        property: &str,
        input: FeatureMap,
        deadline: &Deadline,
    ) -> Result<PredictionResult> {
        if !self.schema.is_declared(property) {
            return Err(Error::UnknownProperty(property.to_string()));
        }
        self.schema.validate(&input)?;
        debug!(%property, k = self.config.k, "guessing");

        let node = self.store_node(input.clone()).await?;
        deadline.check()?;

        let nodes = self.nodes.list().await?;
        self.log_milestone(&format!("calculating ranges on {} nodes", nodes.len()));
        ranges::recompute_ranges(&mut self.schema, &nodes);
        self.emit(MachineEvent::RangesUpdated { stats: self.schema.stats_snapshot() });
        deadline.check()?;

        let created = self.recompute_arcs(&nodes, node.id, deadline).await?;
        self.log_milestone(&format!("calculated {created} arcs"));
        deadline.check()?;

        let neighbors = neighbors::nearest(&self.nodes, &self.arcs, node.id, self.config.k).await?;
        self.log_milestone(&format!("fetched {} neighbours", neighbors.len()));

        let value = predict::vote(&neighbors, property);
        if self.config.update_on_predict {
            if let Some(value) = &value {
                self.nodes.update(node.id, property, value.clone()).await?;
            }
        }

        let result = PredictionResult {
            property: property.to_string(),
            value,
            elapsed_ms: deadline.elapsed_ms(),
            node_id: node.id,
            input,
        };
        self.emit(MachineEvent::PredictionReady(result.clone()));
        Ok(result)
    }

    /// Refresh the arc cache and return how many arcs were newly created.
    ///
    /// `Full` mode recomputes every pair, so cached distances never go stale
    /// under shifting ranges. `Incremental` only touches pairs involving the
    /// query node.
    async fn recompute_arcs(
        &self,
        nodes: &[Node],
        query: NodeId,
        deadline: &Deadline,
    ) -> Result<usize> {
        let engine = DistanceEngine::new(&self.schema, self.config.string_algorithm);
        let mut created = 0usize;
        match self.config.arc_mode {
            ArcMode::Full => {
                for (i, a) in nodes.iter().enumerate() {
                    for b in &nodes[i + 1..] {
                        if self.upsert_pair(&engine, a, b, deadline).await? {
                            created += 1;
                        }
                    }
                }
            }
            ArcMode::Incremental => {
                if let Some(a) = nodes.iter().find(|n| n.id == query) {
                    for b in nodes.iter().filter(|n| n.id != query) {
                        if self.upsert_pair(&engine, a, b, deadline).await? {
                            created += 1;
                        }
                    }
                }
            }
        }
        Ok(created)
    }

    /// Upsert one pair's distance. Returns whether a new arc was created.
    /// Pairs with no comparable features produce no arc at all.
    async fn upsert_pair(
        &self,
        engine: &DistanceEngine<'_>,
        a: &Node,
        b: &Node,
        deadline: &Deadline,
    ) -> Result<bool> {
        deadline.check()?;
        let Some(pair) = PairKey::new(a.id, b.id) else { return Ok(false) };
        let Some(distance) = engine.distance(a, b) else { return Ok(false) };
        let outcome = self.arcs.upsert(Arc::new(pair, distance)).await?;
        if outcome.created {
            self.emit(MachineEvent::ArcComputed { pair, distance });
        }
        Ok(outcome.created)
    }

    /// Validate + insert, emitting `NodeAdded` on success. Callers wrap
    /// errors with `fail` so each failure is emitted exactly once.
    async fn store_node(&self, features: FeatureMap) -> Result<Node> {
        self.schema.validate(&features)?;
        let node = self.nodes.insert(Node::new(features)).await?;
        debug!(node = %node.id, "stored node");
        self.emit(MachineEvent::NodeAdded { id: node.id, features: node.features.clone() });
        Ok(node)
    }

    fn emit(&self, event: MachineEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    fn fail(&self, error: Error) -> Error {
        self.emit(MachineEvent::Error { message: error.to_string() });
        error
    }

    /// Progress lines, promoted to `info!` when the machine is verbose.
    fn log_milestone(&self, message: &str) {
        if self.config.verbose {
            info!(machine = %self.config.name, "{}", message);
        } else {
            debug!(machine = %self.config.name, "{}", message);
        }
    }
}

/// In-memory machine for testing and embedding.
impl Machine<MemoryNodeStore, MemoryArcCache> {
    pub fn open_memory(config: MachineConfig) -> Result<Self> {
        Self::with_stores(config, MemoryNodeStore::new(), MemoryArcCache::new())
    }
}

/// Machine over a keyed-document backend (one collection for nodes, one for
/// arcs).
impl Machine<CollectionNodeStore, CollectionArcCache> {
    pub fn open_collection(
        config: MachineConfig,
        nodes: impl DocumentCollection,
        arcs: impl DocumentCollection,
    ) -> Result<Self> {
        Self::with_stores(
            config,
            CollectionNodeStore::new(nodes),
            CollectionArcCache::new(arcs),
        )
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The machine cannot be built: no properties, duplicate names, `k = 0`,
    /// or an unknown string-algorithm name.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// An input rejected before any mutation: undeclared feature, kind
    /// mismatch, or a non-finite number. Engine state is untouched.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// The guess target is not a declared property.
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// A store operation failed: duplicate id, missing row, malformed
    /// document, or an unacknowledged write. Mid-recomputation failures
    /// leave a valid, partially-updated arc cache; retrying is safe.
    #[error("Store error: {0}")]
    StoreError(String),

    /// The guess deadline expired between stages or pairs.
    #[error("Guess timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
