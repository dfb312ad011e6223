//! MQTT Runtime Module
//!
//! Serializes MQTT actions requested from many execution contexts into a
//! single worker that owns the MQTT client.
//!
//! # Overview
//!
//! ```text
//!  producers                       dispatcher task              client context
//! ┌────────────┐  try_send   ┌───────────────┐  calls   ┌──────────────┐
//! │ MqttHandle │────────────▶│ CommandChannel│─────────▶│  MqttClient  │
//! └────────────┘  Command    └───────────────┘          └──────┬───────┘
//!        ▲                          │ reads                    │ on_event
//!        │ is_connected     ┌───────▼──────┐   writes   ┌──────▼───────┐
//!        └──────────────────│  StateFlags  │◀───────────│ EventCallback│
//!                           └──────────────┘            └──────────────┘
//! ```
//!
//! - Producers never block: [`MqttHandle`] validates and enqueues with
//!   `try_send`, failing fast with `ChannelFull`.
//! - The [`Dispatcher`] is the only consumer and the only caller of the
//!   client, one command at a time, in submission order.
//! - The client reports network events through [`EventCallback`], which only
//!   updates `Connected` and forwards records to the [`EventSink`].
//!
//! The channel and the `Connected` flag are the only shared mutable state.

pub(crate) mod channel;
pub(crate) mod context;
pub(crate) mod dispatcher;
pub(crate) mod events;
pub(crate) mod flags;
pub(crate) mod handle;
pub(crate) mod sink;

pub use channel::{ChannelFull, CommandChannel, DEFAULT_DEPTH};
pub use context::MqttContext;
pub use dispatcher::Dispatcher;
pub use events::{
    EventCallback, EventKind, InboundMessage, MAX_INBOUND_PAYLOAD_LEN, MAX_INBOUND_TOPIC_LEN,
    MqttEvent, RejectReason,
};
pub use flags::StateFlags;
pub use handle::MqttHandle;
pub use sink::{EventSink, LogSink, NoopSink, Record};
