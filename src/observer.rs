//! Machine events and observers.
//!
//! Observation is explicit: callers register observers on the machine they
//! care about, there is no global bus. Events describe state transitions
//! that already happened; failures are additionally emitted as
//! [`MachineEvent::Error`] but always propagate to the caller as well.

use crate::model::{FeatureMap, NodeId, PairKey};
use crate::predict::PredictionResult;
use crate::schema::PropertyStats;

/// Lifecycle notifications emitted during loading and guessing.
#[derive(Debug, Clone, PartialEq)]
pub enum MachineEvent {
    /// A node was stored (seed load or query insert).
    NodeAdded { id: NodeId, features: FeatureMap },
    /// Range statistics were refreshed; one entry per declared property.
    RangesUpdated { stats: Vec<(String, PropertyStats)> },
    /// A previously-absent arc was cached. Refreshes of known pairs do not
    /// emit.
    ArcComputed { pair: PairKey, distance: f64 },
    /// A guess completed.
    PredictionReady(PredictionResult),
    /// An operation failed; the same error is returned to the caller.
    Error { message: String },
}

/// Receiver for [`MachineEvent`]s.
///
/// Observers run synchronously on the calling task, in registration order,
/// so they should return quickly.
pub trait MachineObserver: Send + Sync {
    fn on_event(&self, event: &MachineEvent);
}

impl<F> MachineObserver for F
where
    F: Fn(&MachineEvent) + Send + Sync,
{
    fn on_event(&self, event: &MachineEvent) {
        self(event)
    }
}
