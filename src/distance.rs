//! Pairwise distance over schema properties.
//!
//! Each declared property contributes one normalized magnitude when it is
//! present as the same primitive type on both nodes:
//!
//! | Kind   | Contribution                              | Gate            |
//! |--------|-------------------------------------------|-----------------|
//! | number | `abs(b - a) / range`                      | `range != 0`    |
//! | string | configured algorithm on the two values    | none            |
//!
//! The aggregate is the sum of contributions. A property missing on either
//! side, carried with mismatched types, or normalized by a zero range is
//! skipped and contributes no signal. When *nothing* contributes the pair
//! has no defined distance and [`DistanceEngine::distance`] returns `None`;
//! callers skip the pair instead of caching an arc for it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::{FeatureValue, Node};
use crate::schema::FeatureSchema;
use crate::{Error, Result};

// ============================================================================
// String distance strategies
// ============================================================================

/// Algorithm applied to string-typed feature pairs.
///
/// The three strategies are interchangeable but not aligned in direction:
/// Jaro-Winkler and Dice report a similarity (identical strings contribute
/// 1.0), Levenshtein reports an edit distance (identical strings contribute
/// 0.0). Pick one and keep it consistent across a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StringAlgorithm {
    #[default]
    #[serde(rename = "Jaro-Winkler")]
    JaroWinkler,
    Levenshtein,
    Dice,
}

impl StringAlgorithm {
    /// Evaluate the configured algorithm on two strings.
    pub fn evaluate(&self, a: &str, b: &str) -> f64 {
        match self {
            StringAlgorithm::JaroWinkler => strsim::jaro_winkler(a, b),
            StringAlgorithm::Levenshtein => strsim::levenshtein(a, b) as f64,
            StringAlgorithm::Dice => strsim::sorensen_dice(a, b),
        }
    }
}

impl fmt::Display for StringAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringAlgorithm::JaroWinkler => write!(f, "Jaro-Winkler"),
            StringAlgorithm::Levenshtein => write!(f, "Levenshtein"),
            StringAlgorithm::Dice => write!(f, "Dice"),
        }
    }
}

impl FromStr for StringAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Jaro-Winkler" => Ok(StringAlgorithm::JaroWinkler),
            "Levenshtein" => Ok(StringAlgorithm::Levenshtein),
            "Dice" => Ok(StringAlgorithm::Dice),
            other => Err(Error::InvalidSchema(format!(
                "string algorithm '{other}' not supported"
            ))),
        }
    }
}

// ============================================================================
// DistanceEngine
// ============================================================================

/// Computes the aggregate distance between two nodes under one schema.
///
/// Borrows the schema for the duration of one arc pass so the ranges it
/// normalizes by cannot move mid-pass.
pub struct DistanceEngine<'a> {
    schema: &'a FeatureSchema,
    algorithm: StringAlgorithm,
}

impl<'a> DistanceEngine<'a> {
    pub fn new(schema: &'a FeatureSchema, algorithm: StringAlgorithm) -> Self {
        Self { schema, algorithm }
    }

    /// Aggregate distance between two nodes, or `None` when no declared
    /// property contributed.
    ///
    /// Symmetric by construction: every contribution is a magnitude and the
    /// properties are walked in declaration order on both sides.
    pub fn distance(&self, a: &Node, b: &Node) -> Option<f64> {
        let mut contributions: SmallVec<[f64; 8]> = SmallVec::new();
        for (def, stats) in self.schema.iter() {
            match (a.features.get(&def.name), b.features.get(&def.name)) {
                (Some(FeatureValue::Number(va)), Some(FeatureValue::Number(vb))) => {
                    if stats.range != 0.0 {
                        contributions.push((vb - va).abs() / stats.range);
                    }
                }
                (Some(FeatureValue::String(sa)), Some(FeatureValue::String(sb))) => {
                    contributions.push(self.algorithm.evaluate(sa, sb));
                }
                // Missing on either side, or carried with mismatched types.
                _ => {}
            }
        }
        if contributions.is_empty() {
            None
        } else {
            Some(contributions.iter().sum())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{features, Node};
    use crate::ranges::recompute_ranges;
    use crate::schema::PropertyDef;

    fn schema_with_ranges(defs: Vec<PropertyDef>, nodes: &[Node]) -> FeatureSchema {
        let mut schema = FeatureSchema::declare(defs).unwrap();
        recompute_ranges(&mut schema, nodes);
        schema
    }

    #[test]
    fn test_numeric_normalization() {
        let a = Node::new(features([("rooms", 1.0), ("area", 250.0)]));
        let b = Node::new(features([("rooms", 12.0), ("area", 1700.0)]));
        let schema = schema_with_ranges(
            vec![PropertyDef::number("rooms"), PropertyDef::number("area")],
            &[a.clone(), b.clone()],
        );
        let engine = DistanceEngine::new(&schema, StringAlgorithm::JaroWinkler);
        // Both deltas span the full range, so each normalizes to 1.0.
        assert_eq!(engine.distance(&a, &b), Some(2.0));
    }

    #[test]
    fn test_symmetry() {
        let a = Node::new(features([("rooms", 3.0), ("area", 900.0)]));
        let b = Node::new(features([("rooms", 9.0), ("area", 1300.0)]));
        let schema = schema_with_ranges(
            vec![PropertyDef::number("rooms"), PropertyDef::number("area")],
            &[a.clone(), b.clone()],
        );
        let engine = DistanceEngine::new(&schema, StringAlgorithm::JaroWinkler);
        assert_eq!(engine.distance(&a, &b), engine.distance(&b, &a));
    }

    #[test]
    fn test_zero_range_contributes_no_signal() {
        // A single-node store leaves every range at zero. Distance against a
        // clone of that node must not divide by zero.
        let a = Node::new(features([("rooms", 4.0)]));
        let b = Node::new(features([("rooms", 4.0)]));
        let schema = schema_with_ranges(vec![PropertyDef::number("rooms")], &[a.clone()]);
        assert_eq!(schema.stats("rooms").unwrap().range, 0.0);
        let engine = DistanceEngine::new(&schema, StringAlgorithm::JaroWinkler);
        assert_eq!(engine.distance(&a, &b), None);
    }

    #[test]
    fn test_missing_feature_skipped() {
        let a = Node::new(features([("rooms", 2.0), ("area", 700.0)]));
        let b = Node::new(features([("rooms", 4.0)]));
        let schema = schema_with_ranges(
            vec![PropertyDef::number("rooms"), PropertyDef::number("area")],
            &[a.clone(), b.clone()],
        );
        let engine = DistanceEngine::new(&schema, StringAlgorithm::JaroWinkler);
        // Only rooms contributes: |4 - 2| / 2 = 1.0.
        assert_eq!(engine.distance(&a, &b), Some(1.0));
    }

    #[test]
    fn test_string_contribution_per_algorithm() {
        let a = Node::new(features([("type", FeatureValue::from("house"))]));
        let b = Node::new(features([("type", FeatureValue::from("house"))]));
        let schema = schema_with_ranges(vec![PropertyDef::string("type")], &[a.clone(), b.clone()]);

        let jw = DistanceEngine::new(&schema, StringAlgorithm::JaroWinkler);
        assert_eq!(jw.distance(&a, &b), Some(1.0));

        // Levenshtein runs in the opposite direction: identical strings are
        // zero edits apart, which sums to 0.0.
        let lev = DistanceEngine::new(&schema, StringAlgorithm::Levenshtein);
        assert_eq!(lev.distance(&a, &b), Some(0.0));

        let dice = DistanceEngine::new(&schema, StringAlgorithm::Dice);
        assert_eq!(dice.distance(&a, &b), Some(1.0));
    }

    #[test]
    fn test_levenshtein_counts_edits() {
        let a = Node::new(features([("type", FeatureValue::from("house"))]));
        let b = Node::new(features([("type", FeatureValue::from("mouse"))]));
        let schema = schema_with_ranges(vec![PropertyDef::string("type")], &[a.clone(), b.clone()]);
        let lev = DistanceEngine::new(&schema, StringAlgorithm::Levenshtein);
        assert_eq!(lev.distance(&a, &b), Some(1.0));
    }

    #[test]
    fn test_no_overlap_yields_none() {
        let a = Node::new(features([("rooms", 2.0)]));
        let b = Node::new(features([("area", 700.0)]));
        let schema = schema_with_ranges(
            vec![PropertyDef::number("rooms"), PropertyDef::number("area")],
            &[a.clone(), b.clone()],
        );
        let engine = DistanceEngine::new(&schema, StringAlgorithm::JaroWinkler);
        assert_eq!(engine.distance(&a, &b), None);
    }

    #[test]
    fn test_algorithm_spellings() {
        assert_eq!("Jaro-Winkler".parse::<StringAlgorithm>().unwrap(), StringAlgorithm::JaroWinkler);
        assert_eq!("Levenshtein".parse::<StringAlgorithm>().unwrap(), StringAlgorithm::Levenshtein);
        assert_eq!("Dice".parse::<StringAlgorithm>().unwrap(), StringAlgorithm::Dice);
        assert!(matches!(
            "Hamming".parse::<StringAlgorithm>(),
            Err(Error::InvalidSchema(_))
        ));
        assert_eq!(StringAlgorithm::JaroWinkler.to_string(), "Jaro-Winkler");
    }
}
