//! Simulation engine for Pulsar spiking networks.
//!
//! Owns the live network state and advances it tick by tick on a
//! dedicated background thread, handing each completed tick to the
//! consumer as an encoded snapshot through a backpressure-controlled
//! buffer pool. Reconciliation merges declarative network descriptions
//! into live state without losing per-id dynamic state.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod encode;
pub mod handle;
pub mod network;
pub mod pool;
pub mod reconcile;
pub mod tick;

mod sim_thread;

pub use config::{ConfigError, EngineConfig, PacingConfig};
pub use handle::{SimWorld, SubmitError};
pub use network::NetworkState;
pub use pool::BufferPool;
pub use reconcile::Reconciled;
pub use tick::TickEngine;
