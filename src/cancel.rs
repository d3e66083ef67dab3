//! Cooperative cancellation for the training and self-play loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::warn;

const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Shared stop flag. Loops poll it at minibatch, epoch and game boundaries,
/// so a cancelled run always stops between writes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for up to `duration`, waking early on cancellation. Returns
    /// `true` if the token was cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        while !self.is_cancelled() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
        true
    }
}

/// Cancel `token` on Ctrl-C. A second Ctrl-C while shutdown is pending
/// only repeats the warning.
pub fn install_interrupt_handler(token: &CancellationToken) -> Result<(), ctrlc::Error> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        if token.is_cancelled() {
            warn!("Already stopping, waiting for the current step to finish");
        } else {
            warn!("Interrupted, stopping at the next safe point");
            token.cancel();
        }
    })
}
