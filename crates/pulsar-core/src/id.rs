//! Strongly-typed identifiers and the [`Tick`] counter type.

use std::fmt;

/// Identifies a simulation entity (neuron, source channel, sink
/// channel, or synapse).
///
/// Ids are assigned by the consumer, are unique across all entity
/// categories within a process, and increase monotonically in creation
/// order for neurons and synapses. The reconciliation merge-join
/// depends on that monotonic ordering for its O(n) guarantee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Discrete simulation timestep counter.
///
/// Signed: the engine parks at `-1` after construction and after a
/// `reset`, so that the next advance executes tick `0`. All produced
/// snapshots carry a tick of `0` or greater, except the snapshot a
/// `network` load emits before the first advance.
pub type Tick = i64;
