//! # Serialized MQTT Command Dispatch for Embedded Systems
//!
//! `mqtt-dispatch` lets any number of call sites (tasks, threads, interrupt
//! handlers) request MQTT operations without blocking on network I/O and
//! without racing each other inside a non-reentrant MQTT client. It is built
//! upon the [Embassy](https://embassy.dev/) synchronization primitives.
//!
//! ## Core Features
//!
//! - **`no_std` & `no_alloc`:** Commands are stored inline in `heapless`
//!   buffers and moved through a fixed-capacity channel.
//! - **Non-blocking producers:** Facade operations validate and enqueue in
//!   constant time and report backpressure as `ChannelFull`.
//! - **One call in flight:** A single dispatcher owns the MQTT client and
//!   issues calls strictly in submission order.
//! - **Client agnostic:** The MQTT protocol engine is supplied through the
//!   `MqttClient` trait; network events come back through `EventCallback`.
//!
//! ## Usage
//!
//! ```ignore
//! use mqtt_dispatch::runtime::{LogSink, MqttContext};
//! use mqtt_dispatch::{QoS, WorkerConfig};
//!
//! static MQTT: MqttContext<'static, 4> = MqttContext::new(&LogSink);
//!
//! #[embassy_executor::task]
//! async fn mqtt_worker(dispatcher: Dispatcher<'static, 4>, mut client: EspMqtt) {
//!     dispatcher.run(&mut client).await;
//! }
//!
//! let dispatcher = MQTT.start_worker(WorkerConfig::from_identity(&mac)?)?;
//! spawner.spawn(mqtt_worker(dispatcher, EspMqtt::new(MQTT.events())))?;
//!
//! let mqtt = MQTT.handle();
//! mqtt.connect("mqtt://broker.local")?;
//! mqtt.wait_connected().await;
//! mqtt.subscribe("device/cmd", QoS::AtMostOnce)?;
//! mqtt.publish("device/state", b"online\n", QoS::AtLeastOnce, true)?;
//! ```
//!
//! ## Logging
//!
//! Enable either the `log` or the `defmt` feature to get diagnostics. The
//! [`EventSink`](runtime::EventSink) is the structured record stream and is
//! independent of logging.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod client;
pub mod command;
pub mod error;
pub mod identity;
pub mod options;
pub mod runtime;
pub mod util;

// Re-export key types for easier access at the crate root.
pub use client::{ClientConfig, MessageId, MqttClient};
pub use command::{Command, CommandKind, QoS};
pub use error::{CommandError, Failure, ValidationError, WorkerError};
pub use options::WorkerConfig;
pub use runtime::{Dispatcher, MqttContext, MqttHandle};
