//! Integration test: buffer-pool backpressure and the pending-request
//! slot, exercised through the public handle.
//!
//! All tests run with `tick_rate: 0.0` so pacing never arms a timer;
//! the pool is then the only thing gating tick production, which makes
//! the traces fully deterministic: one update per free buffer, in
//! strict tick order.

use std::time::Duration;

use pulsar_core::{EngineEvent, EntityId, NetworkDesc, NeuronDesc, SimUpdate, SynapseDesc};
use pulsar_engine::{EngineConfig, SimWorld};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(100);

fn recv_update(world: &SimWorld) -> SimUpdate {
    match world.recv_event_timeout(RECV_TIMEOUT) {
        Some(EngineEvent::Update(update)) => update,
        other => panic!("expected update, got {other:?}"),
    }
}

fn one_neuron() -> NetworkDesc {
    NetworkDesc {
        neurons: vec![NeuronDesc {
            id: EntityId(1),
            tau: 0.0,
            threshold: 1.0,
            subtract_on_reset: false,
        }],
        ..NetworkDesc::default()
    }
}

fn unpaced(buffer_count: usize) -> EngineConfig {
    EngineConfig {
        buffer_count,
        tick_rate: 0.0,
        ..EngineConfig::default()
    }
}

#[test]
fn playing_stalls_when_the_pool_runs_dry() {
    let world = SimWorld::spawn(unpaced(2)).unwrap();
    world.load_network(one_neuron()).unwrap();

    // The load snapshot takes the first buffer.
    let snapshot = recv_update(&world);
    assert_eq!(snapshot.tick, -1);

    // Play takes the second for tick 0, then stalls with one pending
    // advance. No further update can arrive until a buffer returns.
    world.play().unwrap();
    let tick0 = recv_update(&world);
    assert_eq!(tick0.tick, 0);
    assert!(tick0.playing);
    assert_eq!(world.recv_event_timeout(QUIET), None);

    // Each returned buffer buys exactly one tick, in order.
    world.return_buffer(snapshot.buffer).unwrap();
    let tick1 = recv_update(&world);
    assert_eq!(tick1.tick, 1);
    assert_eq!(world.recv_event_timeout(QUIET), None);

    world.return_buffer(tick0.buffer).unwrap();
    let tick2 = recv_update(&world);
    assert_eq!(tick2.tick, 2);
    assert_eq!(world.recv_event_timeout(QUIET), None);

    world.shutdown().unwrap();
}

#[test]
fn extra_steps_collapse_into_one_pending_advance() {
    let world = SimWorld::spawn(unpaced(2)).unwrap();
    world.load_network(one_neuron()).unwrap();

    let snapshot = recv_update(&world);
    world.step().unwrap();
    let tick0 = recv_update(&world);
    assert_eq!(tick0.tick, 0);

    // Pool is dry. Further steps queue a single pending advance.
    world.step().unwrap();
    world.step().unwrap();
    world.step().unwrap();
    assert_eq!(world.recv_event_timeout(QUIET), None);

    // First return services the one pending advance.
    world.return_buffer(snapshot.buffer).unwrap();
    let tick1 = recv_update(&world);
    assert_eq!(tick1.tick, 1);

    // Second return finds nothing pending.
    world.return_buffer(tick0.buffer).unwrap();
    assert_eq!(world.recv_event_timeout(QUIET), None);

    world.shutdown().unwrap();
}

#[test]
fn pause_snapshot_supersedes_a_pending_advance() {
    let world = SimWorld::spawn(unpaced(1)).unwrap();
    world.load_network(one_neuron()).unwrap();

    // The load snapshot drains the single-buffer pool.
    let snapshot = recv_update(&world);
    assert_eq!(snapshot.tick, -1);

    // Play queues an advance it cannot run; pause replaces it with a
    // snapshot request.
    world.play().unwrap();
    world.pause().unwrap();
    assert_eq!(world.recv_event_timeout(QUIET), None);

    // The returned buffer carries the snapshot: no tick was ever
    // executed, and the world reports itself paused.
    world.return_buffer(snapshot.buffer).unwrap();
    let update = recv_update(&world);
    assert_eq!(update.tick, -1);
    assert!(!update.playing);
    assert_eq!(world.recv_event_timeout(QUIET), None);

    world.shutdown().unwrap();
}

#[test]
fn tick_rate_changes_apply_in_command_order_and_skip_invalid_values() {
    let world = SimWorld::spawn(unpaced(8)).unwrap();
    world.load_network(one_neuron()).unwrap();
    let update = recv_update(&world);
    assert_eq!(update.tick_rate, 0.0);
    world.return_buffer(update.buffer).unwrap();

    world.set_tick_rate(f64::NAN).unwrap();
    world.set_tick_rate(30.0).unwrap();
    world.set_tick_rate(-5.0).unwrap();
    world.step().unwrap();

    // NaN and negative rates are dropped; 30 sticks.
    let update = recv_update(&world);
    assert_eq!(update.tick_rate, 30.0);
    world.return_buffer(update.buffer).unwrap();

    world.shutdown().unwrap();
}

#[test]
fn unresolvable_synapse_endpoint_aborts_the_simulation_thread() {
    let world = SimWorld::spawn(unpaced(8)).unwrap();
    let mut network = one_neuron();
    network.synapses.push(SynapseDesc {
        id: EntityId(50),
        pre: EntityId(999),
        post: EntityId(1),
        delay: 1,
        weight: 1.0,
        tau: 0.0,
    });
    world.load_network(network).unwrap();

    // The thread panics on the unresolvable endpoint; shutdown
    // surfaces the panic payload.
    assert!(world.shutdown().is_err());
}
