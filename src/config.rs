//! Machine construction options.

use std::time::Duration;

use crate::distance::StringAlgorithm;
use crate::schema::PropertyDef;
use crate::{Error, Result};

/// How the all-pairs arc pass behaves on each guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArcMode {
    /// Recompute the distance of every pair of distinct nodes. The default,
    /// and the documented performance ceiling: O(n²) work per guess.
    #[default]
    Full,
    /// Recompute only the pairs involving the just-inserted query node.
    ///
    /// Predictions are identical to `Full` because neighbor retrieval reads
    /// only arcs containing the query node and ranges are refreshed before
    /// every arc pass. Arcs between older nodes go stale when later
    /// insertions move a range; that is the tradeoff of opting in.
    Incremental,
}

/// Options recognized at machine construction.
///
/// ```
/// use knearest_rs::{MachineConfig, PropertyDef};
///
/// let config = MachineConfig::new(vec![
///     PropertyDef::number("rooms"),
///     PropertyDef::number("area"),
///     PropertyDef::number("type"),
/// ])
/// .with_k(3)
/// .with_verbose(true);
/// # assert_eq!(config.k, 3);
/// ```
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Required, non-empty, ordered. Every node is checked against this.
    pub properties: Vec<PropertyDef>,
    /// Diagnostic label carried in log lines. Defaults to "".
    pub name: String,
    /// Neighbors consulted per vote. Defaults to 1.
    pub k: usize,
    /// Distance strategy for string-typed features.
    pub string_algorithm: StringAlgorithm,
    /// Raise milestone diagnostics from debug to info level.
    pub verbose: bool,
    /// Write a confirmed prediction back into the query node.
    pub update_on_predict: bool,
    /// Arc recomputation strategy.
    pub arc_mode: ArcMode,
    /// Optional per-guess deadline. Expiry abandons the pipeline with
    /// [`Error::Timeout`]; arc upserts already applied stay valid.
    pub guess_timeout: Option<Duration>,
}

impl MachineConfig {
    pub fn new(properties: Vec<PropertyDef>) -> Self {
        Self {
            properties,
            name: String::new(),
            k: 1,
            string_algorithm: StringAlgorithm::default(),
            verbose: false,
            update_on_predict: true,
            arc_mode: ArcMode::default(),
            guess_timeout: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_string_algorithm(mut self, algorithm: StringAlgorithm) -> Self {
        self.string_algorithm = algorithm;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_update_on_predict(mut self, update: bool) -> Self {
        self.update_on_predict = update;
        self
    }

    pub fn with_arc_mode(mut self, mode: ArcMode) -> Self {
        self.arc_mode = mode;
        self
    }

    pub fn with_guess_timeout(mut self, timeout: Duration) -> Self {
        self.guess_timeout = Some(timeout);
        self
    }

    /// Constraints not covered by schema declaration.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidSchema("k must be at least 1".into()));
        }
        Ok(())
    }
}
