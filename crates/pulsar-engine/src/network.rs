//! Live simulation entities and the [`NetworkState`] that owns them.
//!
//! Entities are stored in flat `Vec`s ordered ascending by id (the
//! reconciler maintains that ordering). Synapse endpoints are resolved
//! to indices into those `Vec`s; the indices are recomputed on every
//! reconciliation, and no structural mutation happens between
//! reconciliations, so they stay valid across ticks.

use smallvec::SmallVec;

use pulsar_core::{EntityId, Tick};

/// Synapse indices fanning out from one entity. Most neurons and
/// channels have a handful of outgoing synapses.
pub type Outgoing = SmallVec<[usize; 4]>;

/// Per-tick multiplicative decay factor derived from a time constant.
///
/// `mu = exp(-1/tau)`; a non-positive (or non-finite) `tau` means the
/// quantity does not decay.
pub fn decay_from_tau(tau: f64) -> Option<f64> {
    if tau > 0.0 && tau.is_finite() {
        Some((-1.0 / tau).exp())
    } else {
        None
    }
}

/// Second-order current kernel of a synapse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kernel {
    /// Per-tick multiplicative decay of the integrated current.
    pub mu: f64,
    /// Increment added to the current when a spike arrives: `1 - mu`.
    pub alpha: f64,
}

impl Kernel {
    /// Build a kernel from a time constant; `tau <= 0` means no kernel.
    pub fn from_tau(tau: f64) -> Option<Self> {
        decay_from_tau(tau).map(|mu| Self { mu, alpha: 1.0 - mu })
    }

    /// The time constant `-1/ln(mu)` reported with sunk spikes.
    pub fn tau(&self) -> f64 {
        -1.0 / self.mu.ln()
    }
}

/// A leaky integrate-and-fire neuron.
#[derive(Clone, Debug, PartialEq)]
pub struct Neuron {
    /// Process-unique entity id.
    pub id: EntityId,
    /// Per-tick potential decay factor; `None` means no leak.
    pub decay: Option<f64>,
    /// Firing threshold.
    pub threshold: f64,
    /// Subtract the threshold on firing instead of zeroing.
    pub subtract_on_reset: bool,
    /// Membrane potential. Never negative.
    pub potential: f64,
    /// Tick of the most recent spike, if any.
    pub spike_time: Option<Tick>,
    /// Indices of synapses whose presynaptic end is this neuron.
    pub outgoing: Outgoing,
}

/// One channel of a spike source.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceChannel {
    /// Process-unique entity id.
    pub id: EntityId,
    /// Tick of the most recent injected spike, if any.
    pub spike_time: Option<Tick>,
    /// Indices of synapses whose presynaptic end is this channel.
    pub outgoing: Outgoing,
}

/// A scheduled or periodic spike source.
#[derive(Clone, Debug, PartialEq)]
pub struct SpikeSource {
    /// Process-unique entity id.
    pub id: EntityId,
    /// Channels in channel-index order.
    pub channels: Vec<SourceChannel>,
    /// Sorted, duplicate-free `(tick, channel index)` schedule.
    pub schedule: Vec<pulsar_core::ScheduleEntry>,
    /// `Some(p)`: the schedule repeats every `p` ticks.
    pub period: Option<Tick>,
    /// Index of the next schedule entry to consider.
    pub cursor: usize,
}

/// A passive spike sink: pure topology, no dynamic state.
#[derive(Clone, Debug, PartialEq)]
pub struct SpikeSink {
    /// Process-unique entity id.
    pub id: EntityId,
    /// Ids of the sink's channels, in channel-index order.
    pub channels: Vec<EntityId>,
}

/// Resolved presynaptic endpoint of a synapse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreRef {
    /// Index into [`NetworkState::neurons`].
    Neuron(usize),
    /// Source index into [`NetworkState::sources`] and channel index
    /// within that source.
    SourceChannel(usize, usize),
}

/// Resolved postsynaptic endpoint of a synapse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostRef {
    /// Index into [`NetworkState::neurons`].
    Neuron(usize),
    /// A sink channel; only its id is needed (sinks carry no state).
    SinkChannel(EntityId),
}

/// A weighted, delayed synapse.
#[derive(Clone, Debug, PartialEq)]
pub struct Synapse {
    /// Process-unique entity id.
    pub id: EntityId,
    /// Resolved presynaptic endpoint.
    pub pre: PreRef,
    /// Resolved postsynaptic endpoint.
    pub post: PostRef,
    /// Conduction delay in ticks, at least 1.
    pub delay: u32,
    /// Weight applied on arrival (first-order) or multiplied into the
    /// integrated current (second-order).
    pub weight: f64,
    /// Second-order current kernel; `None` makes the synapse
    /// first-order.
    pub kernel: Option<Kernel>,
    /// In-flight spike ages, oldest at the front. New spikes enter at
    /// the back with age 0; delivery removes only from the front.
    pub spikes: std::collections::VecDeque<u32>,
    /// Integrated current; used only when a kernel is present.
    pub current: f64,
}

/// Owns all simulation entities and their live dynamic state.
///
/// Mutated only by reconciliation ([`crate::reconcile`]) and tick
/// execution ([`crate::tick`]).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkState {
    /// Neurons, ascending by id.
    pub neurons: Vec<Neuron>,
    /// Spike sources, ascending by id.
    pub sources: Vec<SpikeSource>,
    /// Spike sinks, ascending by id.
    pub sinks: Vec<SpikeSink>,
    /// Synapses, ascending by id.
    pub synapses: Vec<Synapse>,
}

impl NetworkState {
    /// An empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore every dynamic field to its default: potentials and
    /// currents to zero, spike times cleared, in-flight spikes dropped,
    /// schedule cursors rewound.
    pub fn reset_dynamic(&mut self) {
        for neuron in &mut self.neurons {
            neuron.potential = 0.0;
            neuron.spike_time = None;
        }
        for source in &mut self.sources {
            for channel in &mut source.channels {
                channel.spike_time = None;
            }
            source.cursor = 0;
        }
        for synapse in &mut self.synapses {
            synapse.spikes.clear();
            synapse.current = 0.0;
        }
    }
}
