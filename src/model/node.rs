//! Node — a labeled or partially-labeled feature vector.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::{FeatureMap, FeatureValue};

/// Opaque node identifier (UUID v4).
///
/// Displays and serializes in the dashless simple form, which is also the
/// document key used by collection-backed stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for NodeId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0.simple())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map(NodeId).map_err(serde::de::Error::custom)
    }
}

/// A stored feature vector.
///
/// Identity is immutable; feature values may be overwritten in place once a
/// prediction is confirmed. Nodes are pure data — construction does not
/// check any schema, the engine validates before it inserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub features: FeatureMap,
}

impl Node {
    /// Create a node with a generated identifier.
    pub fn new(features: FeatureMap) -> Self {
        Self { id: NodeId::generate(), features }
    }

    /// Create a node with a caller-supplied identifier.
    pub fn with_id(id: NodeId, features: FeatureMap) -> Self {
        Self { id, features }
    }

    pub fn get(&self, prop: &str) -> Option<&FeatureValue> {
        self.features.get(prop)
    }

    pub fn set(&mut self, prop: impl Into<String>, value: impl Into<FeatureValue>) {
        self.features.insert(prop.into(), value.into());
    }
}
