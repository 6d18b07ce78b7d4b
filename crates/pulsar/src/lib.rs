//! Pulsar: a discrete-time spiking neural network simulation engine.
//!
//! This is the top-level facade crate that re-exports the public API
//! from the Pulsar sub-crates. For most users, adding `pulsar` as a
//! single dependency is sufficient.
//!
//! The engine advances leaky integrate-and-fire neurons in fixed ticks
//! on a dedicated background thread. Networks are described
//! declaratively with [`types::NetworkDesc`] and reconciled into live
//! state without losing per-entity dynamics; each completed tick is
//! published as a flat `f64` snapshot drawn from a fixed buffer pool,
//! so a slow consumer stalls the simulation instead of growing a queue.
//!
//! # Quick start
//!
//! ```rust
//! use pulsar::prelude::*;
//!
//! // One neuron, no inputs.
//! let network = NetworkDesc {
//!     neurons: vec![NeuronDesc {
//!         id: EntityId(1),
//!         tau: 10.0,
//!         threshold: 1.0,
//!         subtract_on_reset: false,
//!     }],
//!     ..NetworkDesc::default()
//! };
//!
//! let world = SimWorld::spawn(EngineConfig::default()).unwrap();
//! world.load_network(network).unwrap();
//!
//! // Loading while paused publishes a snapshot of the unticked state.
//! let update = match world.recv_event().unwrap() {
//!     EngineEvent::Update(update) => update,
//!     other => panic!("expected update, got {other:?}"),
//! };
//! assert_eq!(update.tick, -1);
//! assert_eq!(update.neuron_count, 1);
//!
//! // Hand the buffer back, then step one tick.
//! world.return_buffer(update.buffer).unwrap();
//! world.step().unwrap();
//! let update = match world.recv_event().unwrap() {
//!     EngineEvent::Update(update) => update,
//!     other => panic!("expected update, got {other:?}"),
//! };
//! assert_eq!(update.tick, 0);
//!
//! world.shutdown().unwrap();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `pulsar-core` | IDs, network descriptions, the update protocol, protocol errors |
//! | [`engine`] | `pulsar-engine` | The simulation world, tick engine, reconciler, and buffer pool |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and the engine protocol (`pulsar-core`).
///
/// Contains [`types::NetworkDesc`] and its entity descriptions, the
/// [`types::ClientCommand`] / [`types::EngineEvent`] protocol, and
/// [`types::ProtocolError`].
pub use pulsar_core as types;

/// The simulation engine (`pulsar-engine`).
///
/// [`engine::SimWorld`] runs the simulation on a background thread;
/// [`engine::TickEngine`] is the synchronous core for callers that
/// want to drive ticks themselves.
pub use pulsar_engine as engine;

/// Common imports for typical Pulsar usage.
///
/// ```rust
/// use pulsar::prelude::*;
/// ```
pub mod prelude {
    // Network descriptions
    pub use pulsar_core::{
        EntityId, NetworkDesc, NeuronDesc, ScheduleEntry, SpikeSinkDesc, SpikeSourceDesc,
        SynapseDesc,
    };

    // Protocol
    pub use pulsar_core::{
        ClientCommand, EngineEvent, SimUpdate, SnapshotBuffer, SunkSpike, SynapseSpikes,
    };

    // Errors
    pub use pulsar_core::ProtocolError;

    // Engine
    pub use pulsar_engine::{
        ConfigError, EngineConfig, PacingConfig, SimWorld, SubmitError, TickEngine,
    };
}
