//! Integration test: a single neuron driven end to end through the
//! simulation world.
//!
//! One neuron (threshold 1.0, no leak, zero-on-reset) is fed by an
//! unkernelled delay-1 synapse from a spike-source channel that fires
//! once at tick 0. The source injects during tick 0; the spike arrives
//! during tick 1 and the neuron fires in that same tick, because
//! arrival integration precedes the threshold check within a tick.
//! Every update's encoded buffer is checked against the documented
//! layout.

use std::time::Duration;

use pulsar_core::{
    EngineEvent, EntityId, NetworkDesc, NeuronDesc, ScheduleEntry, SimUpdate, SpikeSourceDesc,
    SynapseDesc,
};
use pulsar_engine::{EngineConfig, SimWorld};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn recv_update(world: &SimWorld) -> SimUpdate {
    match world.recv_event_timeout(RECV_TIMEOUT) {
        Some(EngineEvent::Update(update)) => update,
        other => panic!("expected update, got {other:?}"),
    }
}

fn scenario_network() -> NetworkDesc {
    NetworkDesc {
        neurons: vec![NeuronDesc {
            id: EntityId(2),
            tau: 0.0,
            threshold: 1.0,
            subtract_on_reset: false,
        }],
        spike_sources: vec![SpikeSourceDesc {
            id: EntityId(10),
            channels: vec![EntityId(11)],
            schedule: vec![ScheduleEntry {
                tick: 0,
                channel: 0,
            }],
            period: None,
        }],
        spike_sinks: vec![],
        synapses: vec![SynapseDesc {
            id: EntityId(20),
            pre: EntityId(11),
            post: EntityId(2),
            delay: 1,
            weight: 1.0,
            tau: 0.0,
        }],
    }
}

#[test]
fn single_neuron_fires_one_tick_after_injection() {
    let world = SimWorld::spawn(EngineConfig::default()).unwrap();
    world.load_network(scenario_network()).unwrap();

    // Loading while paused publishes the unticked state.
    let update = recv_update(&world);
    assert_eq!(update.tick, -1);
    assert!(!update.playing);
    assert_eq!(update.neuron_count, 1);
    // Neuron: id, potential / threshold, never spiked.
    assert_eq!(&update.buffer.data[0..3], &[2.0, 0.0, -1.0]);
    // Source header then channel: never fired.
    assert_eq!(&update.buffer.data[3..7], &[10.0, 1.0, 11.0, -1.0]);
    world.return_buffer(update.buffer).unwrap();

    // Tick 0: the source injects at the end of the tick. The spike sits
    // on the synapse at age 0; nothing has reached the neuron yet.
    world.step().unwrap();
    let update = recv_update(&world);
    assert_eq!(update.tick, 0);
    assert_eq!(&update.buffer.data[0..3], &[2.0, 0.0, -1.0]);
    assert_eq!(&update.buffer.data[3..7], &[10.0, 1.0, 11.0, 0.0]);
    assert_eq!(update.spikes.len(), 1);
    assert_eq!(update.spikes[0].synapse, EntityId(20));
    assert_eq!(update.spikes[0].ages, vec![0.0]);
    world.return_buffer(update.buffer).unwrap();

    // Tick 1: the delay-1 spike arrives, the potential reaches the
    // threshold, and the neuron fires in the same tick. Zero-on-reset
    // leaves the potential at 0; the spike delta is 0 (fired this tick).
    world.step().unwrap();
    let update = recv_update(&world);
    assert_eq!(update.tick, 1);
    assert_eq!(&update.buffer.data[0..3], &[2.0, 0.0, 0.0]);
    assert_eq!(&update.buffer.data[3..7], &[10.0, 1.0, 11.0, 1.0]);
    assert!(update.spikes.is_empty());
    assert!(update.sunk_spikes.is_empty());
    world.return_buffer(update.buffer).unwrap();

    // Tick 2: quiescent. Spike deltas age by one.
    world.step().unwrap();
    let update = recv_update(&world);
    assert_eq!(update.tick, 2);
    assert_eq!(&update.buffer.data[0..3], &[2.0, 0.0, 1.0]);
    assert_eq!(&update.buffer.data[3..7], &[10.0, 1.0, 11.0, 2.0]);
    world.return_buffer(update.buffer).unwrap();

    world.shutdown().unwrap();
}

#[test]
fn reset_rewinds_to_the_unticked_state() {
    let world = SimWorld::spawn(EngineConfig::default()).unwrap();
    world.load_network(scenario_network()).unwrap();

    let update = recv_update(&world);
    world.return_buffer(update.buffer).unwrap();

    // Run past the firing tick.
    for expected in 0..=1 {
        world.step().unwrap();
        let update = recv_update(&world);
        assert_eq!(update.tick, expected);
        world.return_buffer(update.buffer).unwrap();
    }

    // Reset acknowledges, then (paused) immediately re-runs tick 0.
    world.reset().unwrap();
    match world.recv_event_timeout(RECV_TIMEOUT) {
        Some(EngineEvent::ResetAck) => {}
        other => panic!("expected reset acknowledgement, got {other:?}"),
    }
    let update = recv_update(&world);
    assert_eq!(update.tick, 0);
    // The rewound source injects at tick 0 again.
    assert_eq!(&update.buffer.data[3..7], &[10.0, 1.0, 11.0, 0.0]);
    assert_eq!(update.spikes.len(), 1);
    world.return_buffer(update.buffer).unwrap();

    world.shutdown().unwrap();
}
