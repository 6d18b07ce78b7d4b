//! Engine configuration, validation, and error types.
//!
//! [`EngineConfig`] is the input to [`SimWorld::spawn`](crate::SimWorld::spawn);
//! [`validate()`](EngineConfig::validate) checks structural invariants
//! before the simulation thread is started.

use std::error::Error;
use std::fmt;
use std::time::Duration;

// ── PacingConfig ───────────────────────────────────────────────────

/// Controls how the simulation thread batches ticks against the clock.
///
/// When the time left until the next tick is smaller than `slack`, the
/// thread keeps ticking in a hot loop instead of arming a timer, up to
/// `max_batch` of wall time per batch. Batching absorbs timer
/// granularity at high tick rates without starving command handling.
#[derive(Clone, Copy, Debug)]
pub struct PacingConfig {
    /// Sleeps shorter than this are skipped in favour of ticking
    /// immediately. Default: 5ms.
    pub slack: Duration,
    /// Maximum wall time spent in one uninterrupted ticking batch
    /// before the command queue is drained. Default: 20ms.
    pub max_batch: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            slack: Duration::from_millis(5),
            max_batch: Duration::from_millis(20),
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`EngineConfig::validate()`] or thread startup.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Buffer pool capacity is zero; no update could ever be published.
    EmptyBufferPool,
    /// Initial tick rate is NaN, infinite, or negative.
    InvalidTickRate {
        /// The invalid value.
        value: f64,
    },
    /// PacingConfig invariant violated.
    InvalidPacing {
        /// Description of which invariant was violated.
        reason: String,
    },
    /// The simulation thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of the spawn failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBufferPool => write!(f, "buffer_count must be at least 1"),
            Self::InvalidTickRate { value } => {
                write!(f, "tick_rate must be finite and non-negative, got {value}")
            }
            Self::InvalidPacing { reason } => {
                write!(f, "invalid pacing config: {reason}")
            }
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Zero (unpaced) or a finite positive rate whose reciprocal is also
/// finite. Rejects subnormals where `1.0 / rate` overflows to infinity
/// and would panic in `Duration::from_secs_f64`.
pub(crate) fn valid_tick_rate(rate: f64) -> bool {
    rate == 0.0 || (rate.is_finite() && rate > 0.0 && (1.0 / rate).is_finite())
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Complete configuration for spawning a simulation world.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Number of snapshot buffers in the pool. Default: 8.
    ///
    /// This bounds how many updates can be in flight to the consumer at
    /// once; the simulation stalls rather than allocate more.
    pub buffer_count: usize,
    /// Initial target tick rate in ticks per second. Default: 60.
    ///
    /// Zero means unpaced: ticks run as fast as buffers return.
    pub tick_rate: f64,
    /// Tick batching parameters.
    pub pacing: PacingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_count: 8,
            tick_rate: 60.0,
            pacing: PacingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_count == 0 {
            return Err(ConfigError::EmptyBufferPool);
        }
        if !valid_tick_rate(self.tick_rate) {
            return Err(ConfigError::InvalidTickRate {
                value: self.tick_rate,
            });
        }
        if self.pacing.max_batch.is_zero() {
            return Err(ConfigError::InvalidPacing {
                reason: "max_batch must be non-zero".to_string(),
            });
        }
        if self.pacing.slack > self.pacing.max_batch {
            return Err(ConfigError::InvalidPacing {
                reason: format!(
                    "slack ({:?}) exceeds max_batch ({:?})",
                    self.pacing.slack, self.pacing.max_batch,
                ),
            });
        }
        Ok(())
    }
}
