//! Caller-facing handle to a running simulation world.
//!
//! [`SimWorld::spawn`] validates the configuration, starts the
//! simulation thread, and returns a handle that submits commands and
//! receives [`EngineEvent`]s. Dropping the handle (or calling
//! [`shutdown`](SimWorld::shutdown)) disconnects the command channel,
//! which the thread treats as its stop signal.

use std::error::Error;
use std::fmt;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use pulsar_core::{ClientCommand, EngineEvent, NetworkDesc, SnapshotBuffer};

use crate::config::{ConfigError, EngineConfig};
use crate::sim_thread::SimThreadState;

// ── SubmitError ────────────────────────────────────────────────────

/// Error submitting a command to the simulation thread.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The simulation thread is no longer running.
    Shutdown,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shutdown => write!(f, "simulation thread has shut down"),
        }
    }
}

impl Error for SubmitError {}

// ── SimWorld ───────────────────────────────────────────────────────

/// Handle to a simulation world running on its own thread.
///
/// All methods are submit-and-continue: they enqueue a command and
/// return immediately. Results arrive asynchronously as
/// [`EngineEvent`]s on the event channel.
#[derive(Debug)]
pub struct SimWorld {
    cmd_tx: Option<Sender<ClientCommand>>,
    event_rx: Receiver<EngineEvent>,
    thread: Option<JoinHandle<()>>,
}

impl SimWorld {
    /// Validate `config` and spawn the simulation thread.
    ///
    /// The world starts paused with an empty network; nothing is
    /// published until a command asks for it.
    pub fn spawn(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let state = SimThreadState::new(&config, cmd_rx, event_tx);
        let thread = std::thread::Builder::new()
            .name("pulsar-sim".to_string())
            .spawn(move || state.run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;
        Ok(Self {
            cmd_tx: Some(cmd_tx),
            event_rx,
            thread: Some(thread),
        })
    }

    fn send(&self, command: ClientCommand) -> Result<(), SubmitError> {
        match &self.cmd_tx {
            Some(tx) => tx.send(command).map_err(|_| SubmitError::Shutdown),
            None => Err(SubmitError::Shutdown),
        }
    }

    /// Replace the network description; live state is reconciled, not
    /// rebuilt. Publishes a snapshot if the world is paused.
    pub fn load_network(&self, desc: NetworkDesc) -> Result<(), SubmitError> {
        self.send(ClientCommand::LoadNetwork(desc))
    }

    /// Start free-running ticks. No-op if already playing.
    pub fn play(&self) -> Result<(), SubmitError> {
        self.send(ClientCommand::Play)
    }

    /// Stop free-running ticks and publish a snapshot of where the
    /// simulation stopped.
    pub fn pause(&self) -> Result<(), SubmitError> {
        self.send(ClientCommand::Pause)
    }

    /// Execute exactly one tick. Ignored while playing.
    pub fn step(&self) -> Result<(), SubmitError> {
        self.send(ClientCommand::Step)
    }

    /// Rewind to the pre-first-tick state, keeping the network
    /// structure. Acknowledged with [`EngineEvent::ResetAck`].
    pub fn reset(&self) -> Result<(), SubmitError> {
        self.send(ClientCommand::Reset)
    }

    /// Change the target tick rate. Values the engine cannot pace with
    /// are ignored by the thread; zero means unpaced.
    pub fn set_tick_rate(&self, tick_rate: f64) -> Result<(), SubmitError> {
        self.send(ClientCommand::SetTickRate(tick_rate))
    }

    /// Hand a consumed update's buffer back to the pool. Until enough
    /// buffers return, the simulation cannot produce further updates.
    pub fn return_buffer(&self, buffer: SnapshotBuffer) -> Result<(), SubmitError> {
        self.send(ClientCommand::ReturnBuffer(buffer))
    }

    /// Block until the next event arrives. `None` once the thread has
    /// shut down and the channel is drained.
    pub fn recv_event(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    /// Take an event if one is ready, without blocking.
    pub fn try_recv_event(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Block up to `timeout` for the next event.
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Disconnect the command channel and join the simulation thread.
    ///
    /// `Err` carries the thread's panic payload; a protocol violation
    /// in a loaded network description surfaces here.
    pub fn shutdown(mut self) -> std::thread::Result<()> {
        self.cmd_tx = None;
        match self.thread.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

impl Drop for SimWorld {
    fn drop(&mut self) {
        self.cmd_tx = None;
        if let Some(handle) = self.thread.take() {
            // Best-effort join; panics are swallowed here. Use
            // shutdown() to observe them.
            let _ = handle.join();
        }
    }
}
