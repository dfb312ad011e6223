//! The worker context.
//!
//! [`MqttContext`] owns everything the producers, the dispatcher and the
//! event callback share: the command channel, the `Connected` flag, the
//! worker slot and the stop signal. It is created with a `const fn`, so it
//! can live in a `static`, and every other runtime type only borrows it.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use super::channel::{ChannelFull, CommandChannel, DEFAULT_DEPTH};
use super::dispatcher::Dispatcher;
use super::events::EventCallback;
use super::flags::StateFlags;
use super::handle::MqttHandle;
use super::sink::EventSink;
use crate::command::Command;
use crate::error::WorkerError;
use crate::options::WorkerConfig;

/// Why a command was not enqueued.
pub(crate) enum Refused {
    NotRunning,
    Full(Command),
}

/// Shared state for one MQTT worker.
///
/// ```ignore
/// static CONTEXT: MqttContext<'static, 4> = MqttContext::new(&LogSink);
///
/// let dispatcher = CONTEXT.start_worker(WorkerConfig::from_identity(&mac)?)?;
/// spawner.spawn(mqtt_worker(dispatcher, client))?;
///
/// let mqtt = CONTEXT.handle();
/// mqtt.connect("mqtt://broker.local")?;
/// ```
pub struct MqttContext<'a, const DEPTH: usize = DEFAULT_DEPTH> {
    channel: CommandChannel<DEPTH>,
    flags: StateFlags,
    running: AtomicBool,
    /// Set while the worker takes new commands. Checked and acted on under
    /// the same critical section as the enqueue itself.
    accepting: Mutex<CriticalSectionRawMutex, Cell<bool>>,
    stop: Signal<CriticalSectionRawMutex, ()>,
    sink: &'a dyn EventSink,
}

impl<'a, const DEPTH: usize> MqttContext<'a, DEPTH> {
    pub const fn new(sink: &'a dyn EventSink) -> Self {
        Self {
            channel: CommandChannel::new(),
            flags: StateFlags::new(),
            running: AtomicBool::new(false),
            accepting: Mutex::new(Cell::new(false)),
            stop: Signal::new(),
            sink,
        }
    }

    /// Claims the worker slot and returns the dispatcher to run.
    ///
    /// At most one worker is active per context. The slot is released when
    /// the returned [`Dispatcher`] is dropped, which happens when its `run`
    /// future completes.
    pub fn start_worker(&self, config: WorkerConfig) -> Result<Dispatcher<'_, DEPTH>, WorkerError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("mqtt worker already running");
            return Err(WorkerError::AlreadyRunning);
        }
        self.stop.reset();
        let stale = self.channel.drain();
        if stale > 0 {
            warn!("discarding {} commands left by a previous worker", stale);
        }
        self.accepting.lock(|accepting| accepting.set(true));
        info!(
            "starting mqtt worker: client_id={}",
            config.client_id.as_str()
        );
        Ok(Dispatcher::new(self, config))
    }

    /// Asks the running worker to exit after its current command.
    ///
    /// New commands are refused with `NotRunning` from this point on.
    pub fn stop_worker(&self) -> Result<(), WorkerError> {
        if !self.is_running() {
            return Err(WorkerError::NotRunning);
        }
        self.accepting.lock(|accepting| accepting.set(false));
        self.stop.signal(());
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether producers can currently enqueue commands.
    pub fn is_accepting(&self) -> bool {
        self.accepting.lock(Cell::get)
    }

    /// A facade handle for producers.
    pub fn handle(&self) -> MqttHandle<'_, DEPTH> {
        MqttHandle::new(self)
    }

    /// The adapter to register with the external MQTT client.
    pub fn events(&self) -> EventCallback<'_> {
        EventCallback::new(&self.flags, self.sink)
    }

    pub fn flags(&self) -> &StateFlags {
        &self.flags
    }

    /// Number of commands waiting for the dispatcher.
    pub fn queued(&self) -> usize {
        self.channel.len()
    }

    pub(crate) fn channel(&self) -> &CommandChannel<DEPTH> {
        &self.channel
    }

    pub(crate) fn sink(&self) -> &dyn EventSink {
        self.sink
    }

    pub(crate) fn stop_signal(&self) -> &Signal<CriticalSectionRawMutex, ()> {
        &self.stop
    }

    /// Enqueues `command` if a worker is taking commands.
    ///
    /// A command that gets in here is either received by the dispatcher or
    /// counted by [`close`](Self::close).
    pub(crate) fn try_enqueue(&self, command: Command) -> Result<(), Refused> {
        self.accepting.lock(|accepting| {
            if !accepting.get() {
                return Err(Refused::NotRunning);
            }
            self.channel
                .try_send(command)
                .map_err(|ChannelFull(rejected)| Refused::Full(rejected))
        })
    }

    /// Stops taking commands and discards the queued ones, returning how
    /// many there were. Wakes producers parked on a full channel.
    pub(crate) fn close(&self) -> usize {
        self.accepting.lock(|accepting| accepting.set(false));
        self.channel.drain()
    }

    pub(crate) fn release_worker(&self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::sink::NoopSink;

    fn config() -> WorkerConfig {
        WorkerConfig::from_identity(&[0, 1, 2, 3, 4, 5]).unwrap()
    }

    #[test]
    fn second_start_reports_already_running() {
        let ctx = MqttContext::<2>::new(&NoopSink);
        let dispatcher = ctx.start_worker(config()).unwrap();
        assert!(ctx.is_running());
        assert!(matches!(
            ctx.start_worker(config()),
            Err(WorkerError::AlreadyRunning)
        ));

        drop(dispatcher);
        assert!(!ctx.is_running());
        assert!(ctx.start_worker(config()).is_ok());
    }

    #[test]
    fn stop_without_worker_reports_not_running() {
        let ctx = MqttContext::<2>::new(&NoopSink);
        assert_eq!(ctx.stop_worker(), Err(WorkerError::NotRunning));

        let _dispatcher = ctx.start_worker(config()).unwrap();
        assert!(ctx.is_accepting());
        assert_eq!(ctx.stop_worker(), Ok(()));
        // Stopping is cooperative: the slot stays claimed until the
        // dispatcher goes away, but nothing new gets in.
        assert!(ctx.is_running());
        assert!(!ctx.is_accepting());
        assert!(matches!(
            ctx.try_enqueue(Command::disconnect()),
            Err(Refused::NotRunning)
        ));
        assert!(ctx.channel().is_empty());
    }

    #[test]
    fn dropped_dispatcher_discards_its_queue() {
        let ctx = MqttContext::<2>::new(&NoopSink);
        let dispatcher = ctx.start_worker(config()).unwrap();
        assert!(ctx.try_enqueue(Command::disconnect()).is_ok());
        assert_eq!(ctx.channel().len(), 1);

        drop(dispatcher);
        assert!(!ctx.is_accepting());
        assert!(ctx.channel().is_empty());
    }

    #[test]
    fn usable_from_a_static() {
        static CONTEXT: MqttContext<'static, 3> = MqttContext::new(&NoopSink);
        assert_eq!(CONTEXT.channel().capacity(), 3);
        assert!(!CONTEXT.flags().is_connected());
    }
}
