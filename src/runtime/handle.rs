//! Facade operations.
//!
//! [`MqttHandle`] is what producers hold. Every operation builds a
//! [`Command`], validates it and enqueues it without waiting, so it is safe
//! to call from any context, including interrupt handlers. None of them wait
//! for the network: whether the command eventually succeeds is reported
//! through the sink.

use core::future::poll_fn;
use core::task::Poll;

use super::channel::DEFAULT_DEPTH;
use super::context::{MqttContext, Refused};
use crate::command::{Command, QoS};
use crate::error::CommandError;

/// A handle that lets producers request MQTT actions without access to the
/// client.
///
/// The handle only borrows the context and can be copied freely into
/// multiple tasks.
#[derive(Clone, Copy)]
pub struct MqttHandle<'c, const DEPTH: usize = DEFAULT_DEPTH> {
    ctx: &'c MqttContext<'c, DEPTH>,
}

impl<'c, const DEPTH: usize> MqttHandle<'c, DEPTH> {
    pub fn new(ctx: &'c MqttContext<'c, DEPTH>) -> Self {
        Self { ctx }
    }

    pub fn connect(&self, server_uri: &str) -> Result<(), CommandError> {
        self.submit(Command::connect(server_uri)?)
    }

    pub fn disconnect(&self) -> Result<(), CommandError> {
        self.submit(Command::disconnect())
    }

    /// Requests a publish. Topic and payload are checked against their
    /// capacities here, so an oversized message never reaches the channel.
    pub fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), CommandError> {
        self.submit(Command::publish(topic, payload, qos, retain)?)
    }

    pub fn subscribe(&self, topic: &str, qos: QoS) -> Result<(), CommandError> {
        self.submit(Command::subscribe(topic, qos)?)
    }

    pub fn unsubscribe(&self, topic: &str) -> Result<(), CommandError> {
        self.submit(Command::unsubscribe(topic)?)
    }

    /// Enqueues a prepared command without waiting.
    pub fn submit(&self, command: Command) -> Result<(), CommandError> {
        self.ctx.try_enqueue(command).map_err(|refused| match refused {
            Refused::NotRunning => CommandError::NotRunning,
            Refused::Full(rejected) => {
                warn!("command channel full, {:?} not queued", rejected.kind());
                CommandError::ChannelFull
            }
        })
    }

    /// Enqueues a prepared command, waiting for space if the channel is full.
    ///
    /// Gives up with `NotRunning` if the worker stops while waiting. Only for
    /// ordinary task contexts; interrupt handlers must use
    /// [`submit`](Self::submit).
    pub async fn submit_wait(&self, command: Command) -> Result<(), CommandError> {
        let mut pending = Some(command);
        poll_fn(|cx| {
            while let Some(command) = pending.take() {
                match self.ctx.try_enqueue(command) {
                    Ok(()) => return Poll::Ready(Ok(())),
                    Err(Refused::NotRunning) => return Poll::Ready(Err(CommandError::NotRunning)),
                    Err(Refused::Full(rejected)) => {
                        pending = Some(rejected);
                        // Room may have appeared since the attempt; retry then.
                        if self.ctx.channel().poll_ready_to_send(cx).is_pending() {
                            return Poll::Pending;
                        }
                    }
                }
            }
            Poll::Ready(Ok(()))
        })
        .await
    }

    pub fn is_connected(&self) -> bool {
        self.ctx.flags().is_connected()
    }

    pub async fn wait_connected(&self) {
        self.ctx.flags().wait_for(true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MAX_TOPIC_LEN;
    use crate::error::ValidationError;
    use crate::options::WorkerConfig;
    use crate::runtime::sink::NoopSink;
    use embassy_futures::join::join;
    use futures::executor::block_on;

    fn config() -> WorkerConfig {
        WorkerConfig::from_identity(&[0xaa; 6]).unwrap()
    }

    #[test]
    fn rejects_commands_without_a_worker() {
        let ctx = MqttContext::<2>::new(&NoopSink);
        assert_eq!(
            ctx.handle().connect("mqtt://broker"),
            Err(CommandError::NotRunning)
        );
        assert_eq!(ctx.queued(), 0);
    }

    #[test]
    fn reports_channel_full_and_keeps_queue() {
        let ctx = MqttContext::<2>::new(&NoopSink);
        let _dispatcher = ctx.start_worker(config()).unwrap();
        let mqtt = ctx.handle();

        mqtt.subscribe("a", QoS::AtMostOnce).unwrap();
        mqtt.unsubscribe("b").unwrap();
        assert_eq!(mqtt.disconnect(), Err(CommandError::ChannelFull));

        assert_eq!(
            ctx.channel().try_receive(),
            Some(Command::subscribe("a", QoS::AtMostOnce).unwrap())
        );
        assert_eq!(
            ctx.channel().try_receive(),
            Some(Command::unsubscribe("b").unwrap())
        );
        assert_eq!(ctx.channel().try_receive(), None);
    }

    #[test]
    fn validation_fails_before_enqueue() {
        let ctx = MqttContext::<2>::new(&NoopSink);
        let _dispatcher = ctx.start_worker(config()).unwrap();
        let topic = "t".repeat(MAX_TOPIC_LEN + 1);

        assert_eq!(
            ctx.handle().publish(&topic, b"v", QoS::AtMostOnce, false),
            Err(CommandError::Validation(ValidationError::TopicTooLong {
                len: MAX_TOPIC_LEN + 1,
                max: MAX_TOPIC_LEN
            }))
        );
        assert_eq!(ctx.queued(), 0);
    }

    #[test]
    fn submit_wait_enqueues() {
        let ctx = MqttContext::<1>::new(&NoopSink);
        let mqtt = ctx.handle();
        assert_eq!(
            block_on(mqtt.submit_wait(Command::disconnect())),
            Err(CommandError::NotRunning)
        );

        let _dispatcher = ctx.start_worker(config()).unwrap();
        block_on(mqtt.submit_wait(Command::disconnect())).unwrap();
        assert_eq!(ctx.queued(), 1);
        assert!(!mqtt.is_connected());
    }

    #[test]
    fn submit_wait_gives_up_when_the_worker_stops() {
        let ctx = MqttContext::<1>::new(&NoopSink);
        let dispatcher = ctx.start_worker(config()).unwrap();
        let mqtt = ctx.handle();
        mqtt.disconnect().unwrap();

        let (result, ()) = block_on(join(mqtt.submit_wait(Command::disconnect()), async {
            ctx.stop_worker().unwrap();
            assert_eq!(ctx.close(), 1);
        }));
        assert_eq!(result, Err(CommandError::NotRunning));
        assert_eq!(ctx.queued(), 0);
        drop(dispatcher);
    }
}
