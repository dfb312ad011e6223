//! # Commands
//!
//! A [`Command`] is one requested MQTT action with its parameters, stored
//! inline in fixed-capacity buffers so it can be moved through the command
//! channel without allocation. Commands are built by the facade, copied into
//! the channel and consumed exactly once by the dispatcher.

use heapless::{String, Vec};

use crate::error::ValidationError;
use crate::util::{bounded_bytes, bounded_str};

/// Maximum length of a broker URI, e.g. `mqtt://broker.local:1883`.
pub const MAX_URI_LEN: usize = 128;
/// Maximum length of a topic name or filter.
pub const MAX_TOPIC_LEN: usize = 128;
/// Maximum length of a publish payload.
pub const MAX_PAYLOAD_LEN: usize = 512;

pub type Uri = String<MAX_URI_LEN>;
pub type Topic = String<MAX_TOPIC_LEN>;
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

/// Represents the Quality of Service (QoS) levels for MQTT messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = ValidationError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            _ => Err(ValidationError::InvalidQos(val)),
        }
    }
}

/// The discriminant of a [`Command`], used in records and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    Connect,
    Disconnect,
    Publish,
    Subscribe,
    Unsubscribe,
}

/// A single requested MQTT action.
///
/// The constructors validate every field against its capacity and reject
/// oversized input with a [`ValidationError`]. Nothing is ever truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect {
        server_uri: Uri,
    },
    Disconnect,
    Publish {
        topic: Topic,
        payload: Payload,
        qos: QoS,
        retain: bool,
    },
    Subscribe {
        topic: Topic,
        qos: QoS,
    },
    Unsubscribe {
        topic: Topic,
    },
}

impl Command {
    pub fn connect(server_uri: &str) -> Result<Self, ValidationError> {
        if server_uri.is_empty() {
            return Err(ValidationError::EmptyUri);
        }
        let server_uri = bounded_str(server_uri).ok_or(ValidationError::UriTooLong {
            len: server_uri.len(),
            max: MAX_URI_LEN,
        })?;
        Ok(Command::Connect { server_uri })
    }

    pub fn disconnect() -> Self {
        Command::Disconnect
    }

    /// Builds a publish command. Publish topics must not contain wildcards.
    pub fn publish(
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Self, ValidationError> {
        if topic.contains(['+', '#']) {
            return Err(ValidationError::WildcardInTopic);
        }
        let topic = topic_field(topic)?;
        let payload = bounded_bytes(payload).ok_or(ValidationError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        })?;
        Ok(Command::Publish {
            topic,
            payload,
            qos,
            retain,
        })
    }

    pub fn subscribe(topic: &str, qos: QoS) -> Result<Self, ValidationError> {
        Ok(Command::Subscribe {
            topic: topic_field(topic)?,
            qos,
        })
    }

    pub fn unsubscribe(topic: &str) -> Result<Self, ValidationError> {
        Ok(Command::Unsubscribe {
            topic: topic_field(topic)?,
        })
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Connect { .. } => CommandKind::Connect,
            Command::Disconnect => CommandKind::Disconnect,
            Command::Publish { .. } => CommandKind::Publish,
            Command::Subscribe { .. } => CommandKind::Subscribe,
            Command::Unsubscribe { .. } => CommandKind::Unsubscribe,
        }
    }
}

fn topic_field(topic: &str) -> Result<Topic, ValidationError> {
    if topic.is_empty() {
        return Err(ValidationError::EmptyTopic);
    }
    bounded_str(topic).ok_or(ValidationError::TopicTooLong {
        len: topic.len(),
        max: MAX_TOPIC_LEN,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qos_from_u8() {
        assert_eq!(QoS::try_from(0), Ok(QoS::AtMostOnce));
        assert_eq!(QoS::try_from(2), Ok(QoS::ExactlyOnce));
        assert_eq!(QoS::try_from(3), Err(ValidationError::InvalidQos(3)));
    }

    #[test]
    fn publish_keeps_fields_intact() {
        let cmd = Command::publish("t/1", b"v", QoS::AtLeastOnce, true).unwrap();
        let Command::Publish {
            topic,
            payload,
            qos,
            retain,
        } = &cmd
        else {
            panic!("expected publish, got {cmd:?}");
        };
        assert_eq!(topic.as_str(), "t/1");
        assert_eq!(payload.as_slice(), b"v");
        assert_eq!(*qos, QoS::AtLeastOnce);
        assert!(*retain);
        assert_eq!(cmd.kind(), CommandKind::Publish);
    }

    #[test]
    fn oversized_topic_is_rejected() {
        let topic = [b'a'; MAX_TOPIC_LEN + 1];
        let topic = core::str::from_utf8(&topic).unwrap();
        assert_eq!(
            Command::subscribe(topic, QoS::AtMostOnce),
            Err(ValidationError::TopicTooLong {
                len: MAX_TOPIC_LEN + 1,
                max: MAX_TOPIC_LEN
            })
        );
        assert!(Command::subscribe(&topic[1..], QoS::AtMostOnce).is_ok());
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = [0u8; MAX_PAYLOAD_LEN + 1];
        assert_eq!(
            Command::publish("t", &payload, QoS::AtMostOnce, false),
            Err(ValidationError::PayloadTooLarge {
                len: MAX_PAYLOAD_LEN + 1,
                max: MAX_PAYLOAD_LEN
            })
        );
        assert!(Command::publish("t", &payload[1..], QoS::AtMostOnce, false).is_ok());
    }

    #[test]
    fn oversized_uri_is_rejected() {
        let uri = [b'u'; MAX_URI_LEN + 1];
        let uri = core::str::from_utf8(&uri).unwrap();
        assert!(matches!(
            Command::connect(uri),
            Err(ValidationError::UriTooLong { .. })
        ));
        assert_eq!(Command::connect(""), Err(ValidationError::EmptyUri));
    }

    #[test]
    fn topics_must_be_non_empty_and_publish_topics_concrete() {
        assert_eq!(Command::unsubscribe(""), Err(ValidationError::EmptyTopic));
        assert_eq!(
            Command::publish("a/+/b", b"x", QoS::AtMostOnce, false),
            Err(ValidationError::WildcardInTopic)
        );
        assert_eq!(
            Command::publish("a/#", b"x", QoS::AtMostOnce, false),
            Err(ValidationError::WildcardInTopic)
        );
        assert!(Command::subscribe("a/#", QoS::AtMostOnce).is_ok());
    }
}
