//! Event callback adapter.
//!
//! The external MQTT client calls [`EventCallback::on_event`] from its own
//! execution context whenever the network reports something. The adapter
//! does nothing but fast local work: it flips the `Connected` flag, copies
//! inbound data into bounded buffers and forwards records to the sink. It
//! never blocks and never calls back into the client.

use heapless::{String, Vec};

use super::flags::StateFlags;
use super::sink::{EventSink, Record};
use crate::client::MessageId;
use crate::command::{MAX_PAYLOAD_LEN, MAX_TOPIC_LEN, QoS};

/// Largest inbound topic forwarded to the sink.
pub const MAX_INBOUND_TOPIC_LEN: usize = MAX_TOPIC_LEN;
/// Largest inbound payload forwarded to the sink.
pub const MAX_INBOUND_PAYLOAD_LEN: usize = MAX_PAYLOAD_LEN;

/// What the client is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    BeforeConnect,
    Connected,
    Disconnected,
    Subscribed,
    Unsubscribed,
    Published,
    /// An inbound publish.
    Data,
    Error,
    /// A client-specific event id this crate does not interpret.
    Other(i32),
}

/// An event descriptor as reported by the client.
///
/// For [`EventKind::Data`], `topic_len`/`data_len` are the lengths the client
/// declares. They are trusted only after being checked against the slices
/// and the inbound bounds, and the slices are never assumed to be
/// terminated.
#[derive(Debug, Clone, Copy)]
pub struct MqttEvent<'a> {
    pub kind: EventKind,
    pub msg_id: Option<MessageId>,
    pub topic: &'a [u8],
    pub topic_len: usize,
    pub data: &'a [u8],
    pub data_len: usize,
    pub qos: QoS,
    pub retain: bool,
}

impl<'a> MqttEvent<'a> {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            msg_id: None,
            topic: &[],
            topic_len: 0,
            data: &[],
            data_len: 0,
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }

    pub fn with_msg_id(self, msg_id: MessageId) -> Self {
        Self {
            msg_id: Some(msg_id),
            ..self
        }
    }

    /// A data event whose declared lengths match the slices.
    pub fn data(topic: &'a [u8], data: &'a [u8], qos: QoS, retain: bool) -> Self {
        Self {
            topic,
            topic_len: topic.len(),
            data,
            data_len: data.len(),
            qos,
            retain,
            ..Self::new(EventKind::Data)
        }
    }
}

/// An inbound message copied out of the client's buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub msg_id: Option<MessageId>,
    pub topic: String<MAX_INBOUND_TOPIC_LEN>,
    pub payload: Vec<u8, MAX_INBOUND_PAYLOAD_LEN>,
    pub qos: QoS,
    pub retain: bool,
}

/// Why an inbound data event was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RejectReason {
    /// A declared length exceeds the buffer it describes.
    LengthMismatch,
    TopicTooLong { len: usize },
    PayloadTooLarge { len: usize },
    /// The topic is not valid UTF-8.
    InvalidTopic,
}

impl InboundMessage {
    /// Copies the data carried by `event` into owned, exactly sized buffers.
    pub fn decode(event: &MqttEvent<'_>) -> Result<Self, RejectReason> {
        let topic = event
            .topic
            .get(..event.topic_len)
            .ok_or(RejectReason::LengthMismatch)?;
        let payload = event
            .data
            .get(..event.data_len)
            .ok_or(RejectReason::LengthMismatch)?;
        if topic.len() > MAX_INBOUND_TOPIC_LEN {
            return Err(RejectReason::TopicTooLong { len: topic.len() });
        }
        if payload.len() > MAX_INBOUND_PAYLOAD_LEN {
            return Err(RejectReason::PayloadTooLarge { len: payload.len() });
        }
        let topic = core::str::from_utf8(topic).map_err(|_| RejectReason::InvalidTopic)?;

        let mut owned_topic = String::new();
        owned_topic
            .push_str(topic)
            .map_err(|_| RejectReason::TopicTooLong { len: topic.len() })?;
        let owned_payload = Vec::from_slice(payload)
            .map_err(|_| RejectReason::PayloadTooLarge { len: payload.len() })?;

        Ok(Self {
            msg_id: event.msg_id,
            topic: owned_topic,
            payload: owned_payload,
            qos: event.qos,
            retain: event.retain,
        })
    }
}

/// The adapter handed to the external client.
///
/// It is `Copy` and only borrows the context, so the client can keep one for
/// as long as the context lives.
#[derive(Clone, Copy)]
pub struct EventCallback<'a> {
    flags: &'a StateFlags,
    sink: &'a dyn EventSink,
}

impl<'a> EventCallback<'a> {
    pub fn new(flags: &'a StateFlags, sink: &'a dyn EventSink) -> Self {
        Self { flags, sink }
    }

    pub fn on_event(&self, event: &MqttEvent<'_>) {
        match event.kind {
            EventKind::Connected => {
                debug!("mqtt event: connected");
                self.flags.set_connected(true);
                self.sink.record(&Record::Connected);
            }
            EventKind::Disconnected => {
                debug!("mqtt event: disconnected");
                self.flags.set_connected(false);
                self.sink.record(&Record::Disconnected);
            }
            EventKind::Subscribed => self.sink.record(&Record::Subscribed {
                msg_id: event.msg_id,
            }),
            EventKind::Unsubscribed => self.sink.record(&Record::Unsubscribed {
                msg_id: event.msg_id,
            }),
            EventKind::Published => self.sink.record(&Record::Published {
                msg_id: event.msg_id,
            }),
            EventKind::Data => match InboundMessage::decode(event) {
                Ok(message) => self.sink.record(&Record::Message(&message)),
                Err(reason) => {
                    warn!("dropping inbound message: {:?}", reason);
                    self.sink.record(&Record::InboundRejected(reason));
                }
            },
            EventKind::Error => self.sink.record(&Record::ClientError),
            EventKind::BeforeConnect => self.sink.record(&Record::BeforeConnect),
            EventKind::Other(id) => self.sink.record(&Record::OtherEvent(id)),
        }
    }
}
