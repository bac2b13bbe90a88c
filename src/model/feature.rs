//! Feature values — the two primitive types a node can carry.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The declared type of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Number,
    String,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Number => write!(f, "number"),
            FeatureKind::String => write!(f, "string"),
        }
    }
}

/// A single feature value.
///
/// Serialized untagged, so a stored document reads exactly like the data
/// it came from: `{"rooms": 12.0, "type": "house"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    String(String),
}

/// A map of feature names to values.
pub type FeatureMap = HashMap<String, FeatureValue>;

/// Build a [`FeatureMap`] from (name, value) pairs.
///
/// ```
/// use knearest_rs::features;
/// let map = features([("rooms", 3.0), ("area", 420.0)]);
/// assert_eq!(map.len(), 2);
/// ```
pub fn features<K, V, I>(pairs: I) -> FeatureMap
where
    K: Into<String>,
    V: Into<FeatureValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

// ============================================================================
// Type checking
// ============================================================================

impl FeatureValue {
    /// The kind this value belongs to.
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Number(_) => FeatureKind::Number,
            FeatureValue::String(_) => FeatureKind::String,
        }
    }

    pub fn is_number(&self) -> bool { matches!(self, FeatureValue::Number(_)) }
    pub fn is_string(&self) -> bool { matches!(self, FeatureValue::String(_)) }

    /// Attempt to extract as f64.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempt to extract as &str.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::String(s) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<f64> for FeatureValue { fn from(v: f64) -> Self { FeatureValue::Number(v) } }
impl From<f32> for FeatureValue { fn from(v: f32) -> Self { FeatureValue::Number(v as f64) } }
impl From<i64> for FeatureValue { fn from(v: i64) -> Self { FeatureValue::Number(v as f64) } }
impl From<i32> for FeatureValue { fn from(v: i32) -> Self { FeatureValue::Number(v as f64) } }
impl From<String> for FeatureValue { fn from(v: String) -> Self { FeatureValue::String(v) } }
impl From<&str> for FeatureValue { fn from(v: &str) -> Self { FeatureValue::String(v.to_owned()) } }

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(n) => write!(f, "{n}"),
            FeatureValue::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
        }
    }
}
