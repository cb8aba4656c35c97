//! Delayed messages on the tokio timer.
//!
//! A timer is a spawned task that sleeps and then posts one message to a
//! channel. Cancelling aborts the task; a message that was already posted is
//! left for the receiver's generation check to discard.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Post `message` on `tx` after `delay`.
pub fn spawn_after<T: Send + 'static>(
    delay: Duration,
    tx: UnboundedSender<T>,
    message: T,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        // Receiver gone means the player stopped.
        let _ = tx.send(message);
    })
}

/// Holds at most one pending timer. Arming always cancels the previous one.
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Cancel any pending timer and arm a new one.
    pub fn arm<T: Send + 'static>(&mut self, delay: Duration, tx: UnboundedSender<T>, message: T) {
        self.cancel();
        self.handle = Some(spawn_after(delay, tx, message));
    }

    /// Cancel the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether a timer is armed and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
