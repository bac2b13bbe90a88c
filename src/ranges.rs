//! Range recomputation — the single writer of schema statistics.
//!
//! Runs once per guess, before the arc pass, so every numeric delta is
//! normalized by bounds that cover the full node set including the query
//! node. The pass is not incremental: it walks every stored node each time.
//! Because nodes are never removed, expanding the previous bounds gives the
//! same result as starting over, so the tracker only ever widens.

use crate::model::{FeatureKind, FeatureValue, Node};
use crate::schema::FeatureSchema;

/// Expand every numeric property's `min`/`max` to bound the given nodes,
/// then refresh `range = max - min`.
///
/// A property with no numeric observation keeps `range = 0`, which the
/// distance engine reads as "contributes no signal". String properties are
/// left untouched.
pub fn recompute_ranges(schema: &mut FeatureSchema, nodes: &[Node]) {
    let (props, stats) = schema.props_and_stats_mut();
    for (def, stat) in props.iter().zip(stats.iter_mut()) {
        if def.kind != FeatureKind::Number {
            continue;
        }
        for node in nodes {
            if let Some(FeatureValue::Number(v)) = node.features.get(&def.name) {
                if *v < stat.min {
                    stat.min = *v;
                }
                if *v > stat.max {
                    stat.max = *v;
                }
            }
        }
        // min > max means the property was never observed; leave range at 0
        // rather than subtracting the sentinels.
        if stat.min <= stat.max {
            stat.range = stat.max - stat.min;
        }
    }
}
