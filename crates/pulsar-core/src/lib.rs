//! Core types and wire protocol for the Pulsar spiking-network simulator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the strongly-typed identifiers, the consumer↔engine message protocol
//! (network descriptions in, snapshot updates out), and the protocol
//! error types shared by the rest of the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod protocol;

pub use error::{EndpointRole, EntityKind, ProtocolError};
pub use id::{EntityId, Tick};
pub use protocol::{
    ClientCommand, EngineEvent, NetworkDesc, NeuronDesc, ScheduleEntry, SimUpdate,
    SnapshotBuffer, SpikeSinkDesc, SpikeSourceDesc, SunkSpike, SynapseDesc, SynapseSpikes,
};
