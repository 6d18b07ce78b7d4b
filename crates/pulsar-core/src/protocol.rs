//! Consumer↔engine message protocol.
//!
//! The consumer drives the engine with [`ClientCommand`]s and receives
//! [`EngineEvent`]s back. The only shared resource between the two
//! sides is a set of reusable [`SnapshotBuffer`]s, each exclusively
//! owned by exactly one side at any instant: the engine sends a buffer
//! inside [`SimUpdate`] and the consumer hands it back with
//! [`ClientCommand::ReturnBuffer`] once it is done reading.

use crate::id::{EntityId, Tick};

// ── Network description ──────────────────────────────────────────

/// Declarative description of a neuron.
///
/// `tau` is the membrane time constant in ticks; the decay factor
/// applied once per tick is `exp(-1/tau)`. A `tau` of zero (or any
/// non-positive value) means the neuron does not leak.
#[derive(Clone, Debug, PartialEq)]
pub struct NeuronDesc {
    /// Process-unique entity id.
    pub id: EntityId,
    /// Membrane time constant in ticks; `<= 0` disables leak.
    pub tau: f64,
    /// Firing threshold.
    pub threshold: f64,
    /// On firing, subtract the threshold from the potential instead of
    /// zeroing it.
    pub subtract_on_reset: bool,
}

/// One `(tick, channel index)` entry of a spike source schedule.
///
/// Schedules are sorted ascending by `(tick, channel)` with no
/// duplicate pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// The tick (or tick modulo period, for periodic sources) at which
    /// the spike is injected.
    pub tick: Tick,
    /// Index into the source's channel list.
    pub channel: usize,
}

/// Declarative description of a spike source and its channels.
#[derive(Clone, Debug, PartialEq)]
pub struct SpikeSourceDesc {
    /// Process-unique entity id of the source itself.
    pub id: EntityId,
    /// Ids of the source's channels, in channel-index order.
    pub channels: Vec<EntityId>,
    /// Sorted, duplicate-free spike schedule.
    pub schedule: Vec<ScheduleEntry>,
    /// `Some(p)`: the schedule repeats every `p` ticks. `None`: the
    /// schedule plays once.
    pub period: Option<Tick>,
}

/// Declarative description of a spike sink and its channels.
#[derive(Clone, Debug, PartialEq)]
pub struct SpikeSinkDesc {
    /// Process-unique entity id of the sink itself.
    pub id: EntityId,
    /// Ids of the sink's channels, in channel-index order.
    pub channels: Vec<EntityId>,
}

/// Declarative description of a synapse.
#[derive(Clone, Debug, PartialEq)]
pub struct SynapseDesc {
    /// Process-unique entity id.
    pub id: EntityId,
    /// Presynaptic endpoint: a neuron or a spike source channel.
    pub pre: EntityId,
    /// Postsynaptic endpoint: a neuron or a spike sink channel.
    pub post: EntityId,
    /// Conduction delay in ticks, at least 1. A spike emitted during
    /// tick `T` arrives during tick `T + delay`.
    pub delay: u32,
    /// Weight added to the post potential on arrival (first-order) or
    /// multiplied into the integrated current (second-order).
    pub weight: f64,
    /// Current-kernel time constant in ticks; `<= 0` makes the synapse
    /// first-order (no kernel).
    pub tau: f64,
}

/// A complete declarative network snapshot.
///
/// Each list is sorted ascending by id. The engine reconciles this
/// against its live state, preserving per-id dynamic state for ids
/// that recur and discarding state for ids that disappear.
///
/// # Examples
///
/// ```
/// use pulsar_core::{EntityId, NetworkDesc, NeuronDesc, SpikeSourceDesc, ScheduleEntry};
///
/// // One pulse generator feeding nothing yet.
/// let desc = NetworkDesc {
///     neurons: vec![],
///     spike_sources: vec![SpikeSourceDesc {
///         id: EntityId(0),
///         channels: vec![EntityId(1)],
///         schedule: vec![ScheduleEntry { tick: 0, channel: 0 }],
///         period: Some(4),
///     }],
///     spike_sinks: vec![],
///     synapses: vec![],
/// };
/// assert_eq!(desc.spike_sources[0].channels.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkDesc {
    /// Neurons, sorted ascending by id.
    pub neurons: Vec<NeuronDesc>,
    /// Spike sources, sorted ascending by id.
    pub spike_sources: Vec<SpikeSourceDesc>,
    /// Spike sinks, sorted ascending by id.
    pub spike_sinks: Vec<SpikeSinkDesc>,
    /// Synapses, sorted ascending by id.
    pub synapses: Vec<SynapseDesc>,
}

// ── Snapshot buffer ──────────────────────────────────────────────

/// A reusable, exclusively-owned flat `f64` snapshot buffer.
///
/// Pre-allocated by the engine's buffer pool and shuttled between
/// engine and consumer; the encoder resizes it to the exact layout
/// length on every write. Layout (all values `f64`):
///
/// ```text
/// per neuron (stored order):        [id, potential/threshold, ticks-since-spike or -1]
/// per spike source (stored order):  [id, channel_count]
///   per channel (index order):      [id, ticks-since-spike or -1]
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnapshotBuffer {
    /// The flat encoded values.
    pub data: Vec<f64>,
}

impl SnapshotBuffer {
    /// Create an empty buffer; the encoder sizes it on first use.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }
}

// ── Engine → consumer ────────────────────────────────────────────

/// A spike that reached a sink channel during a tick.
///
/// Recorded for external observation (sonification, logging); it is
/// never fed back into the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct SunkSpike {
    /// The synapse that delivered the spike.
    pub synapse: EntityId,
    /// The presynaptic entity (neuron or source channel).
    pub pre: EntityId,
    /// The sink channel that received the spike.
    pub post: EntityId,
    /// The synapse's conduction delay in ticks.
    pub delay: u32,
    /// The synapse weight.
    pub weight: f64,
    /// The kernel time constant `-1/ln(mu)`, or `0.0` for a
    /// first-order synapse.
    pub tau: f64,
}

/// Pending spike ages on one synapse, normalized for interpolation.
#[derive(Clone, Debug, PartialEq)]
pub struct SynapseSpikes {
    /// The synapse carrying the spikes.
    pub synapse: EntityId,
    /// One entry per in-flight spike, oldest first: `age / delay`,
    /// in `[0, 1)`.
    pub ages: Vec<f64>,
}

/// Post-tick state handed to the consumer.
#[derive(Clone, Debug, PartialEq)]
pub struct SimUpdate {
    /// Whether the engine's pacing loop is running.
    pub playing: bool,
    /// The tick this snapshot describes.
    pub tick: Tick,
    /// The current pacing target in ticks per second (0 = unbounded).
    pub tick_rate: f64,
    /// The encoded snapshot. Ownership transfers to the consumer; hand
    /// it back via [`ClientCommand::ReturnBuffer`].
    pub buffer: SnapshotBuffer,
    /// Spikes delivered to sink channels during this tick.
    pub sunk_spikes: Vec<SunkSpike>,
    /// Normalized pending spike ages, only for synapses with at least
    /// one in-flight spike.
    pub spikes: Vec<SynapseSpikes>,
    /// Number of neurons in the snapshot.
    pub neuron_count: usize,
}

/// Messages the engine emits to the consumer.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// A `Reset` command has been applied; dynamic state is back at
    /// defaults and the next advance is tick 0.
    ResetAck,
    /// A snapshot of post-tick (or paused) state.
    Update(SimUpdate),
}

// ── Consumer → engine ────────────────────────────────────────────

/// Messages the consumer sends to the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientCommand {
    /// Return ownership of a snapshot buffer to the engine's pool.
    /// Services a queued advance or snapshot immediately.
    ReturnBuffer(SnapshotBuffer),
    /// Start the self-pacing tick loop.
    Play,
    /// Stop the loop and emit a snapshot without advancing.
    Pause,
    /// Update the pacing target (ticks per second, 0 = unbounded).
    /// Affects future scheduling decisions only; an already-armed
    /// deadline is not recomputed. Values the engine cannot pace with
    /// (non-finite, negative, or too small to invert) are ignored.
    SetTickRate(f64),
    /// Advance exactly one tick. Ignored while playing.
    Step,
    /// Reinitialize all dynamic state and rewind so the next advance
    /// is tick 0. Acknowledged with [`EngineEvent::ResetAck`].
    Reset,
    /// Replace the network description. Reconciles synchronously,
    /// preserving per-id dynamic state; emits a snapshot if paused.
    LoadNetwork(NetworkDesc),
}
