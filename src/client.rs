//! # MQTT Client Abstraction
//!
//! This module defines the `MqttClient` trait, which abstracts the external
//! MQTT protocol engine (connection handshake, framing, keep-alive, QoS
//! retries). The dispatcher is the only caller of these methods and it never
//! has more than one call in flight.
//!
//! Network responses do not come back through these methods. The client
//! reports them asynchronously by calling
//! [`EventCallback::on_event`](crate::runtime::EventCallback::on_event) from
//! its own execution context.
//!
//! With the Rust 2024 Edition, this trait uses native `async fn`, removing the
//! need for the `#[async_trait]` macro.

use crate::command::QoS;

/// Identifier the client assigns to an outgoing packet.
pub type MessageId = u16;

/// Parameters handed to [`MqttClient::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig<'a> {
    /// Broker URI, e.g. `mqtt://broker.local:1883`.
    pub uri: &'a str,
    pub client_id: &'a str,
}

/// A trait representing the external MQTT client capability.
#[allow(async_fn_in_trait)]
pub trait MqttClient {
    /// An initialised client session.
    type Handle;

    /// The error type returned by the client.
    type Error: core::fmt::Debug;

    /// Creates a session for the given broker. Does not connect yet.
    async fn init(&mut self, config: &ClientConfig<'_>) -> Result<Self::Handle, Self::Error>;

    /// Starts connecting. Completion is signalled through a `Connected` event.
    async fn start(&mut self, handle: &mut Self::Handle) -> Result<(), Self::Error>;

    async fn stop(&mut self, handle: &mut Self::Handle) -> Result<(), Self::Error>;

    /// Releases the session. The handle is consumed even on error.
    async fn destroy(&mut self, handle: Self::Handle) -> Result<(), Self::Error>;

    async fn publish(
        &mut self,
        handle: &mut Self::Handle,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<MessageId, Self::Error>;

    async fn subscribe(
        &mut self,
        handle: &mut Self::Handle,
        topic: &str,
        qos: QoS,
    ) -> Result<MessageId, Self::Error>;

    async fn unsubscribe(
        &mut self,
        handle: &mut Self::Handle,
        topic: &str,
    ) -> Result<MessageId, Self::Error>;
}
