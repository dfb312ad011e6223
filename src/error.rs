//! # Error Types
//!
//! Errors are split by where they surface. Validation, backpressure and
//! lifecycle misuse are returned synchronously to the caller of a facade
//! operation. Failures that happen inside the dispatcher (no session, a
//! rejected client call) are never returned to anyone: they are reported
//! through the [`EventSink`](crate::runtime::EventSink) as a [`Failure`].

use core::fmt;

use crate::runtime::ChannelFull;

/// A command parameter does not fit the fixed capacity of its field, or is
/// otherwise malformed. Such a command is never enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// The server URI is longer than [`MAX_URI_LEN`](crate::command::MAX_URI_LEN).
    UriTooLong { len: usize, max: usize },
    /// The topic is longer than [`MAX_TOPIC_LEN`](crate::command::MAX_TOPIC_LEN).
    TopicTooLong { len: usize, max: usize },
    /// The payload is larger than [`MAX_PAYLOAD_LEN`](crate::command::MAX_PAYLOAD_LEN).
    PayloadTooLarge { len: usize, max: usize },
    /// The client identifier is longer than
    /// [`MAX_CLIENT_ID_LEN`](crate::identity::MAX_CLIENT_ID_LEN).
    ClientIdTooLong { len: usize, max: usize },
    EmptyUri,
    EmptyTopic,
    EmptyClientId,
    /// A publish topic contained `+` or `#`.
    WildcardInTopic,
    /// QoS levels above 2 do not exist.
    InvalidQos(u8),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UriTooLong { len, max } => write!(f, "server uri is {len} bytes, max {max}"),
            Self::TopicTooLong { len, max } => write!(f, "topic is {len} bytes, max {max}"),
            Self::PayloadTooLarge { len, max } => write!(f, "payload is {len} bytes, max {max}"),
            Self::ClientIdTooLong { len, max } => write!(f, "client id is {len} bytes, max {max}"),
            Self::EmptyUri => f.write_str("server uri is empty"),
            Self::EmptyTopic => f.write_str("topic is empty"),
            Self::EmptyClientId => f.write_str("client id is empty"),
            Self::WildcardInTopic => f.write_str("publish topic contains a wildcard"),
            Self::InvalidQos(qos) => write!(f, "invalid qos level {qos}"),
        }
    }
}

/// The outcome of a facade operation that could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// The command channel is at capacity. The caller may retry or drop.
    ChannelFull,
    /// No worker is running to consume the command.
    NotRunning,
    /// The command was rejected before reaching the channel.
    Validation(ValidationError),
}

impl From<ValidationError> for CommandError {
    fn from(err: ValidationError) -> Self {
        CommandError::Validation(err)
    }
}

impl From<ChannelFull> for CommandError {
    fn from(_: ChannelFull) -> Self {
        CommandError::ChannelFull
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelFull => f.write_str("command channel is full"),
            Self::NotRunning => f.write_str("worker is not running"),
            Self::Validation(err) => write!(f, "invalid command: {err}"),
        }
    }
}

/// Worker lifecycle misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WorkerError {
    /// `start_worker` was called while a worker is still active.
    AlreadyRunning,
    /// `stop_worker` was called with no active worker.
    NotRunning,
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => f.write_str("worker already running"),
            Self::NotRunning => f.write_str("worker not running"),
        }
    }
}

/// Why the dispatcher dropped a command after taking it off the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Failure {
    /// The command needs an active session and there is none.
    NotConnected,
    /// `Connect` arrived while a session already exists.
    AlreadyConnected,
    /// The external MQTT client rejected the call.
    ClientCall,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => f.write_str("no connection"),
            Self::AlreadyConnected => f.write_str("already connected"),
            Self::ClientCall => f.write_str("mqtt client call failed"),
        }
    }
}
