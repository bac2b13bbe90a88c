//! # Feature-Space Model
//!
//! Clean DTOs for the classifier: nodes, feature values, and arcs.
//! These types cross every boundary: stores ↔ distance engine ↔ predictor ↔ user.
//!
//! Design rule: this module is pure data — no I/O, no state, no async.

pub mod arc;
pub mod feature;
pub mod node;

pub use arc::{Arc, PairKey};
pub use feature::{features, FeatureKind, FeatureMap, FeatureValue};
pub use node::{Node, NodeId};
