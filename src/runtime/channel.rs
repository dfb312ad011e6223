//! The bounded command channel.
//!
//! A thin wrapper over an `embassy-sync` channel guarded by a
//! `CriticalSectionRawMutex`, so [`CommandChannel::try_send`] is safe to call
//! from interrupt handlers as well as from tasks and threads. Commands are
//! moved in whole: the consumer never sees a partially written command.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use core::task::{Context, Poll};

use embassy_sync::channel::{Channel, TrySendError};
use embassy_time::{Duration, with_timeout};

use crate::command::Command;

/// Default number of commands the channel can hold.
pub const DEFAULT_DEPTH: usize = 4;

/// Returned by [`CommandChannel::try_send`] when the channel is at capacity.
///
/// Hands the rejected command back so the caller can retry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFull(pub Command);

/// Fixed-capacity FIFO of [`Command`]s. Many producers, one consumer.
///
/// Receiving is crate-private: the dispatcher is the only consumer.
pub struct CommandChannel<const DEPTH: usize> {
    inner: Channel<CriticalSectionRawMutex, Command, DEPTH>,
}

impl<const DEPTH: usize> CommandChannel<DEPTH> {
    pub const fn new() -> Self {
        Self {
            inner: Channel::new(),
        }
    }

    /// Enqueues without waiting. Fails fast when the channel is full.
    pub fn try_send(&self, command: Command) -> Result<(), ChannelFull> {
        self.inner.try_send(command).map_err(|e| match e {
            TrySendError::Full(command) => ChannelFull(command),
        })
    }

    /// Enqueues, waiting for free space. Only for task contexts.
    pub async fn send(&self, command: Command) {
        self.inner.send(command).await
    }

    /// Registers `cx` to be woken once there is room for another command.
    pub(crate) fn poll_ready_to_send(&self, cx: &mut Context<'_>) -> Poll<()> {
        self.inner.poll_ready_to_send(cx)
    }

    /// Waits for the next command.
    pub(crate) async fn receive(&self) -> Command {
        self.inner.receive().await
    }

    /// Waits up to `timeout` for the next command.
    pub(crate) async fn receive_timeout(&self, timeout: Duration) -> Option<Command> {
        with_timeout(timeout, self.inner.receive()).await.ok()
    }

    pub(crate) fn try_receive(&self) -> Option<Command> {
        self.inner.try_receive().ok()
    }

    /// Discards every queued command and returns how many there were.
    pub(crate) fn drain(&self) -> usize {
        let mut dropped = 0;
        while self.inner.try_receive().is_ok() {
            dropped += 1;
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub const fn capacity(&self) -> usize {
        DEPTH
    }
}

impl<const DEPTH: usize> Default for CommandChannel<DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::QoS;
    use futures::executor::block_on;

    fn subscribe(topic: &str) -> Command {
        Command::subscribe(topic, QoS::AtMostOnce).unwrap()
    }

    #[test]
    fn delivers_in_submission_order() {
        let channel = CommandChannel::<4>::new();
        channel.try_send(subscribe("a")).unwrap();
        channel.try_send(Command::disconnect()).unwrap();
        channel.try_send(subscribe("b")).unwrap();

        assert_eq!(block_on(channel.receive()), subscribe("a"));
        assert_eq!(block_on(channel.receive()), Command::Disconnect);
        assert_eq!(block_on(channel.receive()), subscribe("b"));
        assert!(channel.is_empty());
    }

    #[test]
    fn full_channel_rejects_and_keeps_queue_intact() {
        let channel = CommandChannel::<2>::new();
        channel.try_send(subscribe("a")).unwrap();
        channel.try_send(subscribe("b")).unwrap();
        assert!(channel.is_full());

        let rejected = channel.try_send(subscribe("c")).unwrap_err();
        assert_eq!(rejected, ChannelFull(subscribe("c")));
        assert_eq!(channel.len(), 2);

        assert_eq!(channel.try_receive(), Some(subscribe("a")));
        assert_eq!(channel.try_receive(), Some(subscribe("b")));
        assert_eq!(channel.try_receive(), None);
    }

    #[test]
    fn drain_counts_discarded_commands() {
        let channel = CommandChannel::<3>::new();
        channel.try_send(subscribe("a")).unwrap();
        channel.try_send(subscribe("b")).unwrap();
        assert_eq!(channel.drain(), 2);
        assert!(channel.is_empty());
        assert_eq!(channel.capacity(), 3);
    }

    #[test]
    fn receive_timeout_on_empty_channel() {
        let channel = CommandChannel::<1>::new();
        assert_eq!(
            block_on(channel.receive_timeout(Duration::from_millis(5))),
            None
        );
        channel.try_send(Command::disconnect()).unwrap();
        assert_eq!(
            block_on(channel.receive_timeout(Duration::from_millis(5))),
            Some(Command::Disconnect)
        );
    }
}
