//! Simulation thread: command handling, tick pacing, and update
//! publication.
//!
//! The thread owns [`TickEngine`] and [`BufferPool`] exclusively (moved
//! in via `thread::Builder::spawn`). No locks anywhere: commands
//! arrive on a crossbeam channel and updates go back on another. Pacing
//! is cooperative: between ticks the thread either parks on the command
//! channel with a deadline or keeps ticking in a short hot loop, so
//! commands are never starved for longer than one batch.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use pulsar_core::{ClientCommand, EngineEvent, SimUpdate, SnapshotBuffer, SunkSpike};

use crate::config::{EngineConfig, PacingConfig};
use crate::encode;
use crate::pool::{BufferPool, PendingSlot, ProduceRequest};
use crate::tick::TickEngine;

/// State held by the simulation thread's main loop.
pub(crate) struct SimThreadState {
    engine: TickEngine,
    pool: BufferPool,
    pending: PendingSlot,
    playing: bool,
    tick_rate: f64,
    pacing: PacingConfig,
    /// When armed, the next tick batch starts at this instant unless a
    /// command arrives first.
    deadline: Option<Instant>,
    cmd_rx: Receiver<ClientCommand>,
    event_tx: Sender<EngineEvent>,
}

impl SimThreadState {
    pub(crate) fn new(
        config: &EngineConfig,
        cmd_rx: Receiver<ClientCommand>,
        event_tx: Sender<EngineEvent>,
    ) -> Self {
        Self {
            engine: TickEngine::new(),
            pool: BufferPool::new(config.buffer_count),
            pending: PendingSlot::default(),
            playing: false,
            tick_rate: config.tick_rate,
            pacing: config.pacing,
            deadline: None,
            cmd_rx,
            event_tx,
        }
    }

    /// Main loop. Runs until the command channel disconnects.
    pub(crate) fn run(mut self) {
        loop {
            let received = match self.deadline {
                Some(deadline) => match self.cmd_rx.recv_deadline(deadline) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return,
                },
                None => match self.cmd_rx.recv() {
                    Ok(command) => Some(command),
                    Err(_) => return,
                },
            };
            match received {
                Some(command) => self.handle(command),
                None => {
                    self.deadline = None;
                    self.advance_batch();
                }
            }
        }
    }

    /// Dispatch one client command.
    ///
    /// # Panics
    ///
    /// A [`ProtocolError`](pulsar_core::ProtocolError) from
    /// `LoadNetwork` aborts the thread: an unresolvable or
    /// wrongly-categorized synapse endpoint is a defect in the caller's
    /// description, and continuing would simulate a different network
    /// than the one requested. The panic surfaces to the caller through
    /// [`SimWorld::shutdown`](crate::SimWorld::shutdown).
    fn handle(&mut self, command: ClientCommand) {
        match command {
            ClientCommand::ReturnBuffer(buffer) => {
                self.pool.release(buffer);
                match self.pending.take() {
                    Some(ProduceRequest::Advance) => self.advance_batch(),
                    Some(ProduceRequest::Snapshot) => self.snapshot(),
                    None => {}
                }
            }
            ClientCommand::Play => {
                if !self.playing {
                    self.playing = true;
                    self.advance_batch();
                }
            }
            ClientCommand::Pause => {
                self.deadline = None;
                self.playing = false;
                self.snapshot();
            }
            ClientCommand::SetTickRate(value) => {
                // Invalid rates are dropped rather than poisoning the
                // pacing arithmetic.
                if crate::config::valid_tick_rate(value) {
                    self.tick_rate = value;
                }
            }
            ClientCommand::Step => {
                if !self.playing {
                    self.advance_batch();
                }
            }
            ClientCommand::Reset => {
                self.engine.reset();
                let _ = self.event_tx.send(EngineEvent::ResetAck);
                if !self.playing {
                    self.advance_batch();
                }
            }
            ClientCommand::LoadNetwork(desc) => {
                if let Err(err) = self.engine.apply_network(&desc) {
                    panic!("fatal network description error: {err}");
                }
                if !self.playing {
                    self.snapshot();
                }
            }
        }
    }

    /// Execute ticks until the pool runs dry, the pacing budget calls
    /// for a real sleep, or the batch cap is hit.
    ///
    /// When paused this executes exactly one tick (a single step).
    fn advance_batch(&mut self) {
        let batch_start = Instant::now();
        loop {
            let Some(buffer) = self.pool.acquire() else {
                self.pending.queue(ProduceRequest::Advance);
                return;
            };
            let tick_start = Instant::now();
            let sunk_spikes = self.engine.execute_tick();
            self.post_update(buffer, sunk_spikes);
            if !self.playing {
                return;
            }
            let budget = if self.tick_rate == 0.0 {
                Duration::ZERO
            } else {
                Duration::from_secs_f64(1.0 / self.tick_rate)
            };
            let sleep = budget.saturating_sub(tick_start.elapsed());
            if sleep < self.pacing.slack && batch_start.elapsed() < self.pacing.max_batch {
                continue;
            }
            self.deadline = Some(Instant::now() + sleep);
            return;
        }
    }

    /// Publish the current state without advancing the tick.
    fn snapshot(&mut self) {
        let Some(buffer) = self.pool.acquire() else {
            self.pending.queue(ProduceRequest::Snapshot);
            return;
        };
        self.post_update(buffer, Vec::new());
    }

    /// Encode the state into `buffer` and send it as an update.
    /// Best-effort: the consumer may already have hung up.
    fn post_update(&mut self, mut buffer: SnapshotBuffer, sunk_spikes: Vec<SunkSpike>) {
        let network = self.engine.network();
        encode::encode_state(network, self.engine.tick(), &mut buffer);
        let update = SimUpdate {
            playing: self.playing,
            tick: self.engine.tick(),
            tick_rate: self.tick_rate,
            buffer,
            sunk_spikes,
            spikes: encode::pending_spike_ages(network),
            neuron_count: network.neurons.len(),
        };
        let _ = self.event_tx.send(EngineEvent::Update(update));
    }
}
