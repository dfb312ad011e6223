//! The dispatcher: the single consumer of the command channel.
//!
//! The dispatcher takes one command at a time off the channel, checks that
//! it can run, and calls the external client. It exclusively owns the client
//! and its session handle for the whole run, so at most one client call is
//! ever in flight. Whatever happens to a single command, the loop carries on
//! with the next one; outcomes are reported through the sink.

use embassy_futures::select::{Either, select};

use super::context::MqttContext;
use super::sink::Record;
use crate::client::{ClientConfig, MessageId, MqttClient};
use crate::command::{Command, CommandKind, QoS};
use crate::error::Failure;
use crate::options::WorkerConfig;
use crate::util::effective_payload;

/// What happened to a command the dispatcher accepted.
enum Outcome {
    /// Handed to the client.
    Issued(Option<MessageId>),
    /// Nothing to do.
    Skipped,
}

/// The worker loop returned by
/// [`MqttContext::start_worker`](super::MqttContext::start_worker).
///
/// Await [`run`](Self::run) from a dedicated task. Dropping the dispatcher
/// discards whatever is still queued and frees the worker slot.
pub struct Dispatcher<'c, const DEPTH: usize> {
    ctx: &'c MqttContext<'c, DEPTH>,
    config: WorkerConfig,
}

impl<'c, const DEPTH: usize> Dispatcher<'c, DEPTH> {
    pub(crate) fn new(ctx: &'c MqttContext<'c, DEPTH>, config: WorkerConfig) -> Self {
        Self { ctx, config }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Runs until [`MqttContext::stop_worker`](super::MqttContext::stop_worker)
    /// is called.
    ///
    /// On exit the session is stopped and destroyed, `Connected` is cleared
    /// and any commands still queued are discarded.
    pub async fn run<C: MqttClient>(self, client: &mut C) {
        let ctx = self.ctx;
        let mut session: Option<C::Handle> = None;
        ctx.sink().record(&Record::WorkerStarted);

        loop {
            // The stop signal is polled first so a pending stop wins over a
            // queued command.
            match select(ctx.stop_signal().wait(), self.next_command()).await {
                Either::First(()) => break,
                Either::Second(Some(command)) => {
                    self.dispatch(client, &mut session, command).await
                }
                Either::Second(None) => trace!("no command received before timeout"),
            }
        }

        if let Some(handle) = session.take()
            && let Err(e) = release(client, handle).await
        {
            client_failure(CommandKind::Disconnect, e);
        }
        ctx.flags().set_connected(false);
        let dropped = ctx.close();
        info!("mqtt worker stopped");
        ctx.sink().record(&Record::WorkerStopped { dropped });
    }

    async fn next_command(&self) -> Option<Command> {
        match self.config.receive_timeout {
            Some(timeout) => self.ctx.channel().receive_timeout(timeout).await,
            None => Some(self.ctx.channel().receive().await),
        }
    }

    async fn dispatch<C: MqttClient>(
        &self,
        client: &mut C,
        session: &mut Option<C::Handle>,
        command: Command,
    ) {
        let kind = command.kind();
        debug!("dispatching {:?}", kind);

        let outcome = match command {
            Command::Connect { server_uri } => self.connect(client, session, &server_uri).await,
            Command::Disconnect => self.disconnect(client, session).await,
            Command::Publish {
                topic,
                payload,
                qos,
                retain,
            } => self.publish(client, session, &topic, &payload, qos, retain).await,
            Command::Subscribe { topic, qos } => match self.active(session) {
                Ok(handle) => client
                    .subscribe(handle, &topic, qos)
                    .await
                    .map(|id| Outcome::Issued(Some(id)))
                    .map_err(|e| client_failure(kind, e)),
                Err(failure) => Err(failure),
            },
            Command::Unsubscribe { topic } => match self.active(session) {
                Ok(handle) => client
                    .unsubscribe(handle, &topic)
                    .await
                    .map(|id| Outcome::Issued(Some(id)))
                    .map_err(|e| client_failure(kind, e)),
                Err(failure) => Err(failure),
            },
        };

        match outcome {
            Ok(Outcome::Issued(msg_id)) => self
                .ctx
                .sink()
                .record(&Record::CommandIssued { kind, msg_id }),
            Ok(Outcome::Skipped) => {}
            Err(failure) => {
                warn!("{:?} dropped: {:?}", kind, failure);
                self.ctx
                    .sink()
                    .record(&Record::CommandFailed { kind, failure });
            }
        }
    }

    async fn connect<C: MqttClient>(
        &self,
        client: &mut C,
        session: &mut Option<C::Handle>,
        server_uri: &str,
    ) -> Result<Outcome, Failure> {
        if session.is_some() {
            return Err(Failure::AlreadyConnected);
        }
        info!(
            "connecting to {} as {}",
            server_uri,
            self.config.client_id.as_str()
        );
        let config = ClientConfig {
            uri: server_uri,
            client_id: self.config.client_id.as_str(),
        };
        let mut handle = client
            .init(&config)
            .await
            .map_err(|e| client_failure(CommandKind::Connect, e))?;
        if let Err(e) = client.start(&mut handle).await {
            // The handle never became a session; do not leak it.
            if let Err(e) = client.destroy(handle).await {
                client_failure(CommandKind::Connect, e);
            }
            return Err(client_failure(CommandKind::Connect, e));
        }
        // `Connected` is raised by the event callback once the broker answers.
        *session = Some(handle);
        Ok(Outcome::Issued(None))
    }

    async fn disconnect<C: MqttClient>(
        &self,
        client: &mut C,
        session: &mut Option<C::Handle>,
    ) -> Result<Outcome, Failure> {
        let handle = session.take().ok_or(Failure::NotConnected)?;
        let released = release(client, handle).await;
        self.ctx.flags().set_connected(false);
        released
            .map(|()| Outcome::Issued(None))
            .map_err(|e| client_failure(CommandKind::Disconnect, e))
    }

    async fn publish<C: MqttClient>(
        &self,
        client: &mut C,
        session: &mut Option<C::Handle>,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Outcome, Failure> {
        let handle = self.active(session)?;
        let payload = effective_payload(payload);
        if payload.is_empty() {
            info!("empty payload for {}, nothing to publish", topic);
            self.ctx.sink().record(&Record::EmptyPayload { topic });
            return Ok(Outcome::Skipped);
        }
        client
            .publish(handle, topic, payload, qos, retain)
            .await
            .map(|id| Outcome::Issued(Some(id)))
            .map_err(|e| client_failure(CommandKind::Publish, e))
    }

    /// The session handle, if the broker connection is up.
    fn active<'h, H>(&self, session: &'h mut Option<H>) -> Result<&'h mut H, Failure> {
        match session {
            Some(handle) if self.ctx.flags().is_connected() => Ok(handle),
            _ => Err(Failure::NotConnected),
        }
    }
}

impl<const DEPTH: usize> Drop for Dispatcher<'_, DEPTH> {
    fn drop(&mut self) {
        let dropped = self.ctx.close();
        if dropped > 0 {
            warn!("dispatcher dropped with {} commands queued", dropped);
        }
        self.ctx.release_worker();
    }
}

async fn release<C: MqttClient>(client: &mut C, mut handle: C::Handle) -> Result<(), C::Error> {
    let stopped = client.stop(&mut handle).await;
    let destroyed = client.destroy(handle).await;
    stopped.and(destroyed)
}

fn client_failure<E: core::fmt::Debug>(kind: CommandKind, err: E) -> Failure {
    #[cfg(feature = "log")]
    log::warn!("{:?} rejected by mqtt client: {:?}", kind, err);
    #[cfg(feature = "defmt")]
    defmt::warn!(
        "{:?} rejected by mqtt client: {:?}",
        kind,
        defmt::Debug2Format(&err)
    );
    #[cfg(not(any(feature = "log", feature = "defmt")))]
    let _ = (kind, err);
    Failure::ClientCall
}
