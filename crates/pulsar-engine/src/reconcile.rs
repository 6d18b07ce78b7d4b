//! Reconciliation: merging a declarative [`NetworkDesc`] into live
//! [`NetworkState`] while preserving per-id dynamic state.
//!
//! Both the live entity `Vec`s and the incoming description lists are
//! sorted ascending by id, and ids are monotonic in creation order, so
//! a linear ordered merge-join suffices: matching ids are updated in
//! place, ids only present live are removed (after the scan, in
//! descending index order so pending indices stay valid), and ids only
//! present incoming are appended. O(n+m), no hashing. This must stay
//! an explicit ordered merge; replacing it with an unordered map
//! changes behavior under ties and loses the complexity guarantee.
//!
//! Synapse endpoints are resolved against a single id→entity index
//! spanning every category; a `pre` id must land on a neuron or source
//! channel and a `post` id on a neuron or sink channel. Anything else
//! is a fatal [`ProtocolError`].

use std::collections::VecDeque;

use indexmap::IndexMap;

use pulsar_core::{
    EndpointRole, EntityId, EntityKind, NetworkDesc, ProtocolError, ScheduleEntry,
    SpikeSourceDesc, Tick,
};

use crate::network::{
    decay_from_tau, Kernel, NetworkState, Neuron, Outgoing, PostRef, PreRef, SourceChannel,
    SpikeSink, SpikeSource, Synapse,
};

/// Ids removed from each entity category by one reconciliation pass.
///
/// Sinks are replaced wholesale (they hold no dynamic state) and are
/// not tracked here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciled {
    /// Neuron ids that disappeared.
    pub removed_neurons: Vec<EntityId>,
    /// Spike source ids that disappeared.
    pub removed_sources: Vec<EntityId>,
    /// Synapse ids that disappeared.
    pub removed_synapses: Vec<EntityId>,
}

/// What an id resolved to in the cross-category index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EntityRef {
    Neuron(usize),
    SourceChannel(usize, usize),
    SinkChannel,
}

/// Linear sorted merge-join of a live entity list against an incoming
/// description list.
///
/// Matching ids invoke `on_update` in place; live-only ids are removed
/// after the scan in descending index order; incoming-only ids are
/// appended via `on_create`. Returns the removed ids in ascending
/// order. Both inputs must be sorted ascending by id.
pub(crate) fn merge_join<T, D>(
    current: &mut Vec<T>,
    incoming: &[D],
    current_id: impl Fn(&T) -> EntityId,
    incoming_id: impl Fn(&D) -> EntityId,
    mut on_create: impl FnMut(&D) -> Result<T, ProtocolError>,
    mut on_update: impl FnMut(&mut T, &D) -> Result<(), ProtocolError>,
) -> Result<Vec<EntityId>, ProtocolError> {
    debug_assert!(
        incoming
            .windows(2)
            .all(|w| incoming_id(&w[0]) < incoming_id(&w[1])),
        "incoming description list must be sorted ascending by id"
    );

    let mut stale = Vec::new();
    let scan_len = current.len();
    let mut cur = 0;
    let mut inc = 0;
    loop {
        if cur < scan_len {
            if inc < incoming.len() && current_id(&current[cur]) == incoming_id(&incoming[inc]) {
                on_update(&mut current[cur], &incoming[inc])?;
                cur += 1;
                inc += 1;
            } else {
                // Monotonic ids guarantee a mismatched live id never
                // reappears later in the incoming list.
                stale.push(cur);
                cur += 1;
            }
        } else if inc < incoming.len() {
            let created = on_create(&incoming[inc])?;
            current.push(created);
            inc += 1;
        } else {
            break;
        }
    }

    let removed: Vec<EntityId> = stale.iter().map(|&i| current_id(&current[i])).collect();
    for &idx in stale.iter().rev() {
        current.remove(idx);
    }
    Ok(removed)
}

/// Leftmost schedule index whose tick is not below `tick`; wraps to 0
/// when a periodic schedule is exhausted.
pub(crate) fn bisect_left(schedule: &[ScheduleEntry], tick: Tick, periodic: bool) -> usize {
    let idx = schedule.partition_point(|entry| entry.tick < tick);
    if periodic && idx == schedule.len() {
        0
    } else {
        idx
    }
}

/// The tick a source compares schedule entries against.
fn effective_tick(tick: Tick, period: Option<Tick>) -> Tick {
    match period {
        Some(p) => tick % p,
        None => tick,
    }
}

/// Periods must be positive to be meaningful; anything else plays the
/// schedule once.
fn normalize_period(period: Option<Tick>) -> Option<Tick> {
    period.filter(|&p| p > 0)
}

fn validate_schedule(desc: &SpikeSourceDesc) -> Result<(), ProtocolError> {
    for entry in &desc.schedule {
        if entry.channel >= desc.channels.len() {
            return Err(ProtocolError::ScheduleChannelOutOfBounds {
                source: desc.id,
                channel: entry.channel,
                channel_count: desc.channels.len(),
            });
        }
    }
    Ok(())
}

fn build_source(desc: &SpikeSourceDesc, tick: Tick) -> Result<SpikeSource, ProtocolError> {
    validate_schedule(desc)?;
    let period = normalize_period(desc.period);
    Ok(SpikeSource {
        id: desc.id,
        channels: desc
            .channels
            .iter()
            .map(|&id| SourceChannel {
                id,
                spike_time: None,
                outgoing: Outgoing::new(),
            })
            .collect(),
        cursor: bisect_left(
            &desc.schedule,
            effective_tick(tick, period),
            period.is_some(),
        ),
        schedule: desc.schedule.clone(),
        period,
    })
}

impl NetworkState {
    /// Merge `desc` into the live state.
    ///
    /// Per-id dynamic state (potentials, in-flight spikes, currents,
    /// spike times, cursors) survives for ids that recur, starts at
    /// defaults for new ids, and is discarded for ids that disappear.
    /// Source cursors are re-derived against `tick` so a replaced
    /// schedule picks up at the right position mid-run.
    ///
    /// Errors are fatal protocol violations; the state may be partially
    /// updated and must not be ticked afterwards.
    pub fn reconcile(
        &mut self,
        desc: &NetworkDesc,
        tick: Tick,
    ) -> Result<Reconciled, ProtocolError> {
        let removed_neurons = merge_join(
            &mut self.neurons,
            &desc.neurons,
            |n| n.id,
            |d| d.id,
            |d| {
                Ok(Neuron {
                    id: d.id,
                    decay: decay_from_tau(d.tau),
                    threshold: d.threshold,
                    subtract_on_reset: d.subtract_on_reset,
                    potential: 0.0,
                    spike_time: None,
                    outgoing: Outgoing::new(),
                })
            },
            |n, d| {
                n.decay = decay_from_tau(d.tau);
                n.threshold = d.threshold;
                n.subtract_on_reset = d.subtract_on_reset;
                n.outgoing.clear();
                Ok(())
            },
        )?;

        let removed_sources = merge_join(
            &mut self.sources,
            &desc.spike_sources,
            |s| s.id,
            |d| d.id,
            |d| build_source(d, tick),
            |s, d| {
                validate_schedule(d)?;
                let period = normalize_period(d.period);
                // Channel identity is positional in the description but
                // spike times belong to channel ids; carry them over.
                let old_times: IndexMap<EntityId, Option<Tick>> =
                    s.channels.iter().map(|c| (c.id, c.spike_time)).collect();
                s.channels = d
                    .channels
                    .iter()
                    .map(|&id| SourceChannel {
                        id,
                        spike_time: old_times.get(&id).copied().flatten(),
                        outgoing: Outgoing::new(),
                    })
                    .collect();
                s.cursor = bisect_left(
                    &d.schedule,
                    effective_tick(tick, period),
                    period.is_some(),
                );
                s.schedule = d.schedule.clone();
                s.period = period;
                Ok(())
            },
        )?;

        // Sinks hold no dynamic state: replace wholesale.
        self.sinks = desc
            .spike_sinks
            .iter()
            .map(|d| SpikeSink {
                id: d.id,
                channels: d.channels.clone(),
            })
            .collect();

        // One id index across every category, so wrong-category
        // endpoint resolution is detected rather than silently missed.
        let mut index: IndexMap<EntityId, EntityRef> = IndexMap::new();
        for (i, neuron) in self.neurons.iter().enumerate() {
            index.insert(neuron.id, EntityRef::Neuron(i));
        }
        for (si, source) in self.sources.iter().enumerate() {
            for (ci, channel) in source.channels.iter().enumerate() {
                index.insert(channel.id, EntityRef::SourceChannel(si, ci));
            }
        }
        for sink in &self.sinks {
            for &id in &sink.channels {
                index.insert(id, EntityRef::SinkChannel);
            }
        }

        let resolve_pre = |synapse: EntityId, id: EntityId| match index.get(&id) {
            Some(&EntityRef::Neuron(i)) => Ok(PreRef::Neuron(i)),
            Some(&EntityRef::SourceChannel(s, c)) => Ok(PreRef::SourceChannel(s, c)),
            Some(&EntityRef::SinkChannel) => Err(ProtocolError::EndpointCategory {
                synapse,
                role: EndpointRole::Pre,
                id,
                found: EntityKind::SinkChannel,
            }),
            None => Err(ProtocolError::UnresolvedEndpoint {
                synapse,
                role: EndpointRole::Pre,
                id,
            }),
        };
        let resolve_post = |synapse: EntityId, id: EntityId| match index.get(&id) {
            Some(&EntityRef::Neuron(i)) => Ok(PostRef::Neuron(i)),
            Some(&EntityRef::SinkChannel) => Ok(PostRef::SinkChannel(id)),
            Some(&EntityRef::SourceChannel(..)) => Err(ProtocolError::EndpointCategory {
                synapse,
                role: EndpointRole::Post,
                id,
                found: EntityKind::SourceChannel,
            }),
            None => Err(ProtocolError::UnresolvedEndpoint {
                synapse,
                role: EndpointRole::Post,
                id,
            }),
        };

        let removed_synapses = merge_join(
            &mut self.synapses,
            &desc.synapses,
            |s| s.id,
            |d| d.id,
            |d| {
                Ok(Synapse {
                    id: d.id,
                    pre: resolve_pre(d.id, d.pre)?,
                    post: resolve_post(d.id, d.post)?,
                    delay: d.delay,
                    weight: d.weight,
                    kernel: Kernel::from_tau(d.tau),
                    spikes: VecDeque::new(),
                    current: 0.0,
                })
            },
            |s, d| {
                s.pre = resolve_pre(d.id, d.pre)?;
                s.post = resolve_post(d.id, d.post)?;
                s.delay = d.delay;
                s.weight = d.weight;
                s.kernel = Kernel::from_tau(d.tau);
                Ok(())
            },
        )?;

        // Every surviving entity had its adjacency cleared above;
        // rebuild fan-out from the resolved endpoints.
        for (si, synapse) in self.synapses.iter().enumerate() {
            match synapse.pre {
                PreRef::Neuron(n) => self.neurons[n].outgoing.push(si),
                PreRef::SourceChannel(s, c) => self.sources[s].channels[c].outgoing.push(si),
            }
        }

        Ok(Reconciled {
            removed_neurons,
            removed_sources,
            removed_synapses,
        })
    }
}
