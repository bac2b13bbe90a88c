//! Feature schema — declared properties and their running range statistics.
//!
//! The set of property names is fixed at declaration time. The only mutable
//! part is the per-property `min`/`max`/`range` triple, and the only writer
//! is the range recomputation pass in [`crate::ranges`]. A schema is owned
//! by one machine for its lifetime; it is never shared across instances.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{FeatureKind, FeatureMap};
use crate::{Error, Result};

/// A declared property: a name and the primitive type its values must have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
}

impl PropertyDef {
    pub fn number(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: FeatureKind::Number }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: FeatureKind::String }
    }
}

/// Observed bounds of a numeric property across all stored nodes.
///
/// `min` starts at +∞ and `max` at 0: the tracker assumes feature values
/// are non-negative. A negative feature value would leave `max` stuck at 0
/// and corrupt the range, so non-negative domains are a precondition of the
/// engine, not something it detects. String properties keep the defaults
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyStats {
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl Default for PropertyStats {
    fn default() -> Self {
        Self { min: f64::INFINITY, max: 0.0, range: 0.0 }
    }
}

/// Ordered set of declared properties plus their range statistics.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    props: Vec<PropertyDef>,
    /// Parallel to `props`.
    stats: Vec<PropertyStats>,
    /// name → position in `props`.
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Declare a schema from an ordered, non-empty list of properties.
    ///
    /// Fails with [`Error::InvalidSchema`] on an empty list or a duplicate
    /// property name.
    pub fn declare(props: Vec<PropertyDef>) -> Result<Self> {
        if props.is_empty() {
            return Err(Error::InvalidSchema(
                "at least one property must be declared".into(),
            ));
        }
        let mut index = HashMap::with_capacity(props.len());
        for (pos, def) in props.iter().enumerate() {
            if index.insert(def.name.clone(), pos).is_some() {
                return Err(Error::InvalidSchema(format!(
                    "duplicate property '{}'",
                    def.name
                )));
            }
        }
        let stats = vec![PropertyStats::default(); props.len()];
        Ok(Self { props, stats, index })
    }

    /// Number of declared properties.
    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// The declared properties, in declaration order.
    pub fn properties(&self) -> &[PropertyDef] {
        &self.props
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<FeatureKind> {
        self.index.get(name).map(|&pos| self.props[pos].kind)
    }

    /// Range statistics for one property.
    pub fn stats(&self, name: &str) -> Option<&PropertyStats> {
        self.index.get(name).map(|&pos| &self.stats[pos])
    }

    /// Properties and statistics paired up, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyDef, &PropertyStats)> {
        self.props.iter().zip(self.stats.iter())
    }

    /// Snapshot of (name, stats) in declaration order, for event payloads.
    pub fn stats_snapshot(&self) -> Vec<(String, PropertyStats)> {
        self.props
            .iter()
            .zip(self.stats.iter())
            .map(|(def, stats)| (def.name.clone(), *stats))
            .collect()
    }

    /// Split borrow for the range recomputation pass.
    pub(crate) fn props_and_stats_mut(&mut self) -> (&[PropertyDef], &mut [PropertyStats]) {
        (&self.props, &mut self.stats)
    }

    /// Check a feature map against the declared properties.
    ///
    /// Fails with [`Error::SchemaViolation`] when a feature name was never
    /// declared, when a value's type does not match the declaration, or
    /// when a numeric value is not finite (NaN or ±∞ would corrupt range
    /// tracking and make vote equality meaningless).
    pub fn validate(&self, features: &FeatureMap) -> Result<()> {
        for (name, value) in features {
            let Some(kind) = self.kind_of(name) else {
                return Err(Error::SchemaViolation(format!(
                    "feature '{name}' is not declared"
                )));
            };
            if value.kind() != kind {
                return Err(Error::SchemaViolation(format!(
                    "feature '{name}' must be a {kind}, got a {}",
                    value.kind()
                )));
            }
            if let Some(n) = value.as_number() {
                if !n.is_finite() {
                    return Err(Error::SchemaViolation(format!(
                        "feature '{name}' must be finite, got {n}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{features, FeatureValue};

    fn housing_schema() -> FeatureSchema {
        FeatureSchema::declare(vec![
            PropertyDef::number("rooms"),
            PropertyDef::number("area"),
            PropertyDef::string("type"),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_declaration_rejected() {
        let err = FeatureSchema::declare(vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = FeatureSchema::declare(vec![
            PropertyDef::number("rooms"),
            PropertyDef::number("rooms"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let schema = housing_schema();
        let names: Vec<&str> = schema.properties().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["rooms", "area", "type"]);
    }

    #[test]
    fn test_stats_initialize_asymmetric() {
        let schema = housing_schema();
        let stats = schema.stats("rooms").unwrap();
        assert_eq!(stats.min, f64::INFINITY);
        assert_eq!(stats.max, 0.0);
        assert_eq!(stats.range, 0.0);
    }

    #[test]
    fn test_validate_accepts_partial_vector() {
        let schema = housing_schema();
        // The queried property is typically absent from an input vector.
        assert!(schema.validate(&features([("rooms", 12.0), ("area", 1375.0)])).is_ok());
    }

    #[test]
    fn test_validate_rejects_undeclared() {
        let schema = housing_schema();
        let err = schema.validate(&features([("price", 100.0)])).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(_)));
    }

    #[test]
    fn test_validate_rejects_wrong_kind() {
        let schema = housing_schema();
        let err = schema
            .validate(&features([("rooms", FeatureValue::from("two"))]))
            .unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(_)));
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let schema = housing_schema();
        let err = schema.validate(&features([("rooms", f64::NAN)])).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(_)));
    }

    #[test]
    fn test_serde_uses_type_key() {
        let def = PropertyDef::number("rooms");
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "rooms", "type": "number" }));
    }
}
