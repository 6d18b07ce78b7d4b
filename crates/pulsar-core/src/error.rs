//! Protocol error types.
//!
//! A [`ProtocolError`] marks a malformed network description: a synapse
//! endpoint that does not resolve, or resolves to an entity of the
//! wrong category, or a spike schedule referencing a channel the source
//! does not have. These are programming errors on the consumer side;
//! the engine has no defined recovery and aborts its sim thread when
//! one surfaces.

use std::error::Error;
use std::fmt;

use crate::id::EntityId;

/// The category an id resolved to in the cross-category entity index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// A leaky integrate-and-fire neuron.
    Neuron,
    /// One channel of a spike source.
    SourceChannel,
    /// One channel of a spike sink.
    SinkChannel,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neuron => write!(f, "neuron"),
            Self::SourceChannel => write!(f, "spike source channel"),
            Self::SinkChannel => write!(f, "spike sink channel"),
        }
    }
}

/// Which end of a synapse failed to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointRole {
    /// The presynaptic end: must be a neuron or a source channel.
    Pre,
    /// The postsynaptic end: must be a neuron or a sink channel.
    Post,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre => write!(f, "pre"),
            Self::Post => write!(f, "post"),
        }
    }
}

/// Fatal violations of the network-description protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// A synapse endpoint id matches no entity in the description.
    UnresolvedEndpoint {
        /// The synapse whose endpoint failed to resolve.
        synapse: EntityId,
        /// Which end failed.
        role: EndpointRole,
        /// The id that matched nothing.
        id: EntityId,
    },
    /// A synapse endpoint id resolved to the wrong entity category
    /// (e.g. a sink channel used as a presynaptic endpoint).
    EndpointCategory {
        /// The synapse whose endpoint resolved wrongly.
        synapse: EntityId,
        /// Which end resolved wrongly.
        role: EndpointRole,
        /// The offending id.
        id: EntityId,
        /// The category the id actually belongs to.
        found: EntityKind,
    },
    /// A schedule entry references a channel index the source does not
    /// have.
    ScheduleChannelOutOfBounds {
        /// The spike source carrying the schedule.
        source: EntityId,
        /// The out-of-bounds channel index.
        channel: usize,
        /// The source's actual channel count.
        channel_count: usize,
    },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedEndpoint { synapse, role, id } => {
                write!(
                    f,
                    "synapse {synapse}: no matching entity for {role} endpoint id {id}"
                )
            }
            Self::EndpointCategory {
                synapse,
                role,
                id,
                found,
            } => {
                write!(
                    f,
                    "synapse {synapse}: {role} endpoint id {id} resolves to a {found}"
                )
            }
            Self::ScheduleChannelOutOfBounds {
                source,
                channel,
                channel_count,
            } => {
                write!(
                    f,
                    "spike source {source}: schedule references channel index {channel} \
                     but only {channel_count} channels exist"
                )
            }
        }
    }
}

impl Error for ProtocolError {}
