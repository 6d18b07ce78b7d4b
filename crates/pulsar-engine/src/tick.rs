//! Tick execution: advancing [`NetworkState`] by exactly one step.
//!
//! The phase order inside a tick is load-bearing; reordering changes
//! numeric results:
//!
//! 1. membrane potential decay;
//! 2. per synapse: kernel current decay, delivery of arrived spikes,
//!    ageing of the rest;
//! 3. second-order current integration into post potentials;
//! 4. threshold check and firing (at most one spike per neuron per
//!    tick);
//! 5. scheduled/periodic source injection.
//!
//! Arrival integration (phases 2 and 3) precedes the threshold check
//! (phase 4), so a spike whose arrival pushes a neuron over threshold
//! fires the neuron within the same tick.

use pulsar_core::{NetworkDesc, ProtocolError, SunkSpike, Tick};

use crate::network::{NetworkState, PostRef, PreRef};
use crate::reconcile::Reconciled;

/// Owns the live [`NetworkState`] and the tick counter, and advances
/// them one step at a time.
///
/// The sim thread owns the engine exclusively; there is no locking and
/// a tick always runs to completion before the next begins.
#[derive(Clone, Debug, Default)]
pub struct TickEngine {
    network: NetworkState,
    tick: Tick,
}

impl TickEngine {
    /// An engine with an empty network, parked before tick 0.
    pub fn new() -> Self {
        Self {
            network: NetworkState::new(),
            tick: -1,
        }
    }

    /// The most recently executed tick (`-1` before the first advance).
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Read access to the live network.
    pub fn network(&self) -> &NetworkState {
        &self.network
    }

    /// Reconcile a declarative description into the live network,
    /// re-deriving source cursors against the current tick.
    pub fn apply_network(&mut self, desc: &NetworkDesc) -> Result<Reconciled, ProtocolError> {
        self.network.reconcile(desc, self.tick)
    }

    /// Restore all dynamic state to defaults and rewind so the next
    /// advance executes tick 0.
    pub fn reset(&mut self) {
        self.tick = -1;
        self.network.reset_dynamic();
    }

    /// Advance the network by exactly one tick, returning the spikes
    /// that reached sink channels during it.
    pub fn execute_tick(&mut self) -> Vec<SunkSpike> {
        self.tick += 1;
        let tick = self.tick;
        let mut sunk = Vec::new();

        let neurons = &mut self.network.neurons;
        let sources = &mut self.network.sources;
        let synapses = &mut self.network.synapses;

        // Phase 1: membrane decay.
        for neuron in neurons.iter_mut() {
            if let Some(mu) = neuron.decay {
                neuron.potential *= mu;
            }
        }

        // Phase 2: synapse currents and spike delivery.
        for synapse in synapses.iter_mut() {
            if let Some(kernel) = synapse.kernel {
                if synapse.current > 0.0 {
                    synapse.current *= kernel.mu;
                }
            }

            // Deliver from the head: ages are strictly decreasing from
            // the front (one spike per pre entity per tick), so the
            // arrived prefix is contiguous.
            while let Some(&age) = synapse.spikes.front() {
                if age + 1 < synapse.delay {
                    break;
                }
                synapse.spikes.pop_front();
                match synapse.post {
                    PostRef::Neuron(n) => match synapse.kernel {
                        None => {
                            let neuron = &mut neurons[n];
                            neuron.potential = (neuron.potential + synapse.weight).max(0.0);
                        }
                        Some(kernel) => synapse.current += kernel.alpha,
                    },
                    PostRef::SinkChannel(post) => {
                        let pre = match synapse.pre {
                            PreRef::Neuron(n) => neurons[n].id,
                            PreRef::SourceChannel(s, c) => sources[s].channels[c].id,
                        };
                        sunk.push(SunkSpike {
                            synapse: synapse.id,
                            pre,
                            post,
                            delay: synapse.delay,
                            weight: synapse.weight,
                            tau: synapse.kernel.map_or(0.0, |kernel| kernel.tau()),
                        });
                    }
                }
            }

            for age in synapse.spikes.iter_mut() {
                *age += 1;
            }
        }

        // Phase 3: second-order integration. Runs after every delivery
        // has landed; the floor at zero makes the ordering observable,
        // so currents feed potentials only once all arrivals are in.
        for synapse in synapses.iter_mut() {
            if synapse.kernel.is_some() && synapse.current > 0.0 {
                if let PostRef::Neuron(n) = synapse.post {
                    let neuron = &mut neurons[n];
                    neuron.potential =
                        (neuron.potential + synapse.current * synapse.weight).max(0.0);
                }
            }
        }

        // Phase 4: threshold check and firing.
        for neuron in neurons.iter_mut() {
            if neuron.potential >= neuron.threshold {
                if neuron.subtract_on_reset {
                    neuron.potential -= neuron.threshold;
                } else {
                    neuron.potential = 0.0;
                }
                for &si in &neuron.outgoing {
                    synapses[si].spikes.push_back(0);
                }
                neuron.spike_time = Some(tick);
            }
        }

        // Phase 5: source injection. The cursor-start guard bounds a
        // periodic schedule to one full cycle per tick; it never loops
        // unboundedly on a degenerate schedule.
        for source in sources.iter_mut() {
            let start = source.cursor;
            let effective = match source.period {
                Some(period) => tick % period,
                None => tick,
            };
            while source.cursor < source.schedule.len()
                && source.schedule[source.cursor].tick == effective
            {
                let entry = source.schedule[source.cursor];
                let channel = &mut source.channels[entry.channel];
                for &si in &channel.outgoing {
                    synapses[si].spikes.push_back(0);
                }
                channel.spike_time = Some(tick);
                match source.period {
                    None => source.cursor += 1,
                    Some(_) => {
                        source.cursor = (source.cursor + 1) % source.schedule.len();
                        if source.cursor == start {
                            break;
                        }
                    }
                }
            }
        }

        sunk
    }
}
