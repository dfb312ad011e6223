//! Observability sink.
//!
//! The dispatcher and the event callback report everything worth knowing as
//! [`Record`]s. Recording is fire-and-forget: the sink cannot fail and the
//! runtime never waits on it.
//!
//! # Object Safety
//!
//! `EventSink` is dyn-compatible so the context can hold a
//! `&dyn EventSink` without a generic parameter, which keeps it usable in a
//! `static`.

use super::events::{InboundMessage, RejectReason};
use crate::client::MessageId;
use crate::command::CommandKind;
use crate::error::Failure;

/// One informational record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record<'a> {
    WorkerStarted,
    /// The worker exited. `dropped` queued commands were discarded unexecuted.
    WorkerStopped {
        dropped: usize,
    },
    BeforeConnect,
    Connected,
    Disconnected,
    Subscribed {
        msg_id: Option<MessageId>,
    },
    Unsubscribed {
        msg_id: Option<MessageId>,
    },
    Published {
        msg_id: Option<MessageId>,
    },
    /// An inbound publish.
    Message(&'a InboundMessage),
    InboundRejected(RejectReason),
    ClientError,
    OtherEvent(i32),
    /// The dispatcher handed a command to the client.
    CommandIssued {
        kind: CommandKind,
        msg_id: Option<MessageId>,
    },
    /// The dispatcher dropped a command.
    CommandFailed {
        kind: CommandKind,
        failure: Failure,
    },
    /// A publish whose effective payload was empty. Not sent, not an error.
    EmptyPayload {
        topic: &'a str,
    },
}

/// Receives records from any execution context.
///
/// Implementations must return quickly: `record` is called from the client's
/// event context as well as from the dispatcher.
pub trait EventSink: Sync {
    fn record(&self, record: &Record<'_>);
}

/// A sink that discards everything.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn record(&self, _record: &Record<'_>) {}
}

/// A sink that writes every record to the crate's log backend.
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, record: &Record<'_>) {
        match *record {
            Record::WorkerStarted => info!("mqtt worker started"),
            Record::WorkerStopped { dropped } => {
                info!("mqtt worker stopped, {} queued commands dropped", dropped)
            }
            Record::BeforeConnect => info!("MQTT_EVENT_BEFORE_CONNECT"),
            Record::Connected => info!("MQTT_EVENT_CONNECTED"),
            Record::Disconnected => info!("MQTT_EVENT_DISCONNECTED"),
            Record::Subscribed { msg_id } => info!("MQTT_EVENT_SUBSCRIBED, msg_id={:?}", msg_id),
            Record::Unsubscribed { msg_id } => {
                info!("MQTT_EVENT_UNSUBSCRIBED, msg_id={:?}", msg_id)
            }
            Record::Published { msg_id } => info!("MQTT_EVENT_PUBLISHED, msg_id={:?}", msg_id),
            Record::Message(message) => info!(
                "MQTT_EVENT_DATA topic={} payload={:?}",
                message.topic.as_str(),
                message.payload.as_slice()
            ),
            Record::InboundRejected(reason) => warn!("inbound message rejected: {:?}", reason),
            Record::ClientError => warn!("MQTT_EVENT_ERROR"),
            Record::OtherEvent(id) => info!("other event id: {}", id),
            Record::CommandIssued { kind, msg_id } => {
                debug!("{:?} issued, msg_id={:?}", kind, msg_id)
            }
            Record::CommandFailed { kind, failure } => warn!("{:?} failed: {:?}", kind, failure),
            Record::EmptyPayload { topic } => info!("empty payload for {}, not published", topic),
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn record(&self, record: &Record<'_>) {
        (**self).record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting(std::sync::atomic::AtomicUsize);

    impl EventSink for Counting {
        fn record(&self, _record: &Record<'_>) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    }

    #[test]
    fn references_forward_to_the_sink() {
        let sink = Counting(std::sync::atomic::AtomicUsize::new(0));
        let by_ref: &dyn EventSink = &&sink;
        by_ref.record(&Record::Connected);
        LogSink.record(&Record::WorkerStopped { dropped: 2 });
        NoopSink.record(&Record::Disconnected);
        assert_eq!(sink.0.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
