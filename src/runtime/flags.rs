//! Shared connection state.
//!
//! `Connected` is the only state shared between the dispatcher, the event
//! callback and producers. Reads and writes are atomic and never block, so
//! any context may query it. Async waiters are parked in a small waker
//! registry behind a critical section.

use core::cell::RefCell;
use core::future::poll_fn;
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::Poll;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::waitqueue::MultiWakerRegistration;

/// Maximum number of tasks parked in [`StateFlags::wait_for`] at once.
/// Registering more wakes everyone so they re-register.
const MAX_WAITERS: usize = 4;

pub struct StateFlags {
    connected: AtomicBool,
    waiters: Mutex<CriticalSectionRawMutex, RefCell<MultiWakerRegistration<MAX_WAITERS>>>,
}

impl StateFlags {
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            waiters: Mutex::new(RefCell::new(MultiWakerRegistration::new())),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Writes `Connected` and wakes waiters if it changed.
    ///
    /// Only the event callback and the dispatcher's disconnect/stop paths
    /// write this flag.
    pub(crate) fn set_connected(&self, connected: bool) -> bool {
        let previous = self.connected.swap(connected, Ordering::AcqRel);
        if previous != connected {
            self.waiters.lock(|w| w.borrow_mut().wake());
        }
        previous
    }

    /// Waits until `Connected` equals `connected`.
    pub async fn wait_for(&self, connected: bool) {
        poll_fn(|cx| {
            if self.is_connected() == connected {
                return Poll::Ready(());
            }
            self.waiters.lock(|w| w.borrow_mut().register(cx.waker()));
            // Re-check: the flag may have flipped between the load and the
            // registration.
            if self.is_connected() == connected {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }
}

impl Default for StateFlags {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::join::join;
    use embassy_futures::yield_now;
    use futures::executor::block_on;

    #[test]
    fn starts_disconnected() {
        let flags = StateFlags::new();
        assert!(!flags.is_connected());
    }

    #[test]
    fn set_reports_previous_value() {
        let flags = StateFlags::new();
        assert!(!flags.set_connected(true));
        assert!(flags.set_connected(true));
        assert!(flags.is_connected());
        assert!(flags.set_connected(false));
        assert!(!flags.is_connected());
    }

    #[test]
    fn waiter_wakes_on_change() {
        let flags = StateFlags::new();
        block_on(join(flags.wait_for(true), async {
            yield_now().await;
            flags.set_connected(true);
        }));
        assert!(flags.is_connected());
        // Already satisfied: returns immediately.
        block_on(flags.wait_for(true));
    }

    #[test]
    fn waiter_wakes_from_another_thread() {
        let flags = StateFlags::new();
        flags.set_connected(true);
        std::thread::scope(|s| {
            s.spawn(|| {
                std::thread::sleep(std::time::Duration::from_millis(10));
                flags.set_connected(false);
            });
            block_on(flags.wait_for(false));
        });
        assert!(!flags.is_connected());
    }
}
