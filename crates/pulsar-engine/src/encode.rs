//! Flat `f64` snapshot encoding of the live network state.
//!
//! Each completed tick is encoded into a [`SnapshotBuffer`] borrowed
//! from the [`crate::pool::BufferPool`]. The layout is positional:
//! consumers walk it with the entity counts carried alongside in the
//! update, so the encoder and the layout documented on
//! [`SnapshotBuffer`] must agree exactly.

use pulsar_core::{SnapshotBuffer, SynapseSpikes, Tick};

use crate::network::NetworkState;

/// Sentinel written where an entity has never spiked.
const NEVER_SPIKED: f64 = -1.0;

/// Number of `f64` slots a snapshot of `network` occupies.
///
/// Three per neuron, two per source header, two per source channel.
pub fn encoded_len(network: &NetworkState) -> usize {
    let channels: usize = network
        .sources
        .iter()
        .map(|source| source.channels.len())
        .sum();
    network.neurons.len() * 3 + network.sources.len() * 2 + channels * 2
}

/// Encode the observable state of `network` at `tick` into `buffer`.
///
/// The buffer is cleared first; its previous contents (and capacity
/// from earlier, differently-sized networks) do not leak through.
pub fn encode_state(network: &NetworkState, tick: Tick, buffer: &mut SnapshotBuffer) {
    buffer.data.clear();
    buffer.data.reserve(encoded_len(network));

    for neuron in &network.neurons {
        buffer.data.push(neuron.id.0 as f64);
        buffer.data.push(neuron.potential / neuron.threshold);
        buffer.data.push(match neuron.spike_time {
            Some(at) => (tick - at) as f64,
            None => NEVER_SPIKED,
        });
    }
    for source in &network.sources {
        buffer.data.push(source.id.0 as f64);
        buffer.data.push(source.channels.len() as f64);
        for channel in &source.channels {
            buffer.data.push(channel.id.0 as f64);
            buffer.data.push(match channel.spike_time {
                Some(at) => (tick - at) as f64,
                None => NEVER_SPIKED,
            });
        }
    }
}

/// In-flight spike ages per synapse, normalized into `[0, 1)` by each
/// synapse's delay. Synapses with nothing in flight are omitted.
pub fn pending_spike_ages(network: &NetworkState) -> Vec<SynapseSpikes> {
    network
        .synapses
        .iter()
        .filter(|synapse| !synapse.spikes.is_empty())
        .map(|synapse| SynapseSpikes {
            synapse: synapse.id,
            ages: synapse
                .spikes
                .iter()
                .map(|&age| f64::from(age) / f64::from(synapse.delay))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick::TickEngine;
    use pulsar_core::{
        EntityId, NetworkDesc, NeuronDesc, ScheduleEntry, SpikeSinkDesc, SpikeSourceDesc,
        SynapseDesc,
    };

    fn neuron(id: u64, threshold: f64) -> NeuronDesc {
        NeuronDesc {
            id: EntityId(id),
            tau: 0.0,
            threshold,
            subtract_on_reset: false,
        }
    }

    #[test]
    fn encoded_len_counts_every_slot() {
        let mut engine = TickEngine::new();
        engine
            .apply_network(&NetworkDesc {
                neurons: vec![neuron(1, 1.0), neuron(2, 1.0)],
                spike_sources: vec![SpikeSourceDesc {
                    id: EntityId(3),
                    channels: vec![EntityId(4), EntityId(5)],
                    schedule: vec![],
                    period: None,
                }],
                spike_sinks: vec![],
                synapses: vec![],
            })
            .unwrap();
        // 2 neurons * 3 + 1 source * 2 + 2 channels * 2
        assert_eq!(encoded_len(engine.network()), 12);
    }

    #[test]
    fn layout_is_neurons_then_sources_with_inline_channels() {
        let mut engine = TickEngine::new();
        engine
            .apply_network(&NetworkDesc {
                neurons: vec![neuron(1, 2.0)],
                spike_sources: vec![SpikeSourceDesc {
                    id: EntityId(7),
                    channels: vec![EntityId(8)],
                    schedule: vec![ScheduleEntry {
                        tick: 0,
                        channel: 0,
                    }],
                    period: None,
                }],
                spike_sinks: vec![],
                synapses: vec![],
            })
            .unwrap();
        engine.execute_tick();
        engine.execute_tick();
        engine.execute_tick();

        let mut buffer = SnapshotBuffer::default();
        encode_state(engine.network(), engine.tick(), &mut buffer);
        // Neuron: id, potential / threshold, never spiked.
        assert_eq!(buffer.data[0], 1.0);
        assert_eq!(buffer.data[1], 0.0);
        assert_eq!(buffer.data[2], NEVER_SPIKED);
        // Source header: id, channel count.
        assert_eq!(buffer.data[3], 7.0);
        assert_eq!(buffer.data[4], 1.0);
        // Channel: id, ticks since the tick-0 injection (now at tick 2).
        assert_eq!(buffer.data[5], 8.0);
        assert_eq!(buffer.data[6], 2.0);
        assert_eq!(buffer.data.len(), 7);
    }

    #[test]
    fn potential_is_normalized_by_threshold() {
        let mut network = NetworkState::new();
        network.neurons.push(crate::network::Neuron {
            id: EntityId(1),
            decay: None,
            threshold: 4.0,
            subtract_on_reset: false,
            potential: 1.0,
            spike_time: None,
            outgoing: crate::network::Outgoing::new(),
        });

        let mut buffer = SnapshotBuffer::default();
        encode_state(&network, 0, &mut buffer);
        assert_eq!(buffer.data[1], 0.25);
    }

    #[test]
    fn encode_clears_previous_contents() {
        let network = NetworkState::new();
        let mut buffer = SnapshotBuffer {
            data: vec![9.0; 32],
        };
        encode_state(&network, 0, &mut buffer);
        assert!(buffer.data.is_empty());
    }

    #[test]
    fn pending_ages_are_normalized_and_sparse() {
        let mut engine = TickEngine::new();
        engine
            .apply_network(&NetworkDesc {
                neurons: vec![neuron(1, 1.0)],
                spike_sources: vec![SpikeSourceDesc {
                    id: EntityId(2),
                    channels: vec![EntityId(3)],
                    schedule: vec![ScheduleEntry {
                        tick: 0,
                        channel: 0,
                    }],
                    period: None,
                }],
                spike_sinks: vec![SpikeSinkDesc {
                    id: EntityId(4),
                    channels: vec![EntityId(5)],
                }],
                synapses: vec![
                    SynapseDesc {
                        id: EntityId(10),
                        pre: EntityId(3),
                        post: EntityId(1),
                        delay: 4,
                        weight: 1.0,
                        tau: 0.0,
                    },
                    SynapseDesc {
                        id: EntityId(11),
                        pre: EntityId(1),
                        post: EntityId(5),
                        delay: 2,
                        weight: 1.0,
                        tau: 0.0,
                    },
                ],
            })
            .unwrap();
        // Tick 0 injects on the source channel at age 0; tick 1 ages the
        // in-flight spike to 1 of the 4-tick delay.
        engine.execute_tick();
        engine.execute_tick();

        let spikes = pending_spike_ages(engine.network());
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].synapse, EntityId(10));
        assert_eq!(spikes[0].ages, vec![0.25]);
    }
}
