//! One-shot timers
//!
//! The engine never talks to the clock directly: it asks a [`TimerService`]
//! to run a callback once after a delay and keeps the returned
//! [`TimerHandle`] so the timer can be cancelled. [`PhaseTimer`] wraps a
//! service and enforces that at most one timer is ever pending.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

/// Callback run when a timer expires
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Schedule-once-after-delay primitive
pub trait TimerService: Send + Sync {
    /// Run `callback` once after `delay` unless the handle is cancelled first
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

/// Handle to a scheduled timer
///
/// Dropping the handle cancels the timer.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel the timer. Cancelling an expired timer is a no-op.
    pub fn cancel(mut self) {
        self.cancel_inner();
    }

    fn cancel_inner(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel_inner();
    }
}

/// Timer service backed by `tokio::time::sleep`
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimerService;

impl TimerService for TokioTimerService {
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        TimerHandle::new(move || task.abort())
    }
}

/// The engine's single phase timer
///
/// Every `arm` cancels the pending timer first. Expiries are delivered as a
/// generation number on a channel; only the generation of the currently
/// pending timer is accepted, so a timer that fired just before it was
/// cancelled can never advance the state machine.
pub struct PhaseTimer {
    service: Arc<dyn TimerService>,
    pending: Option<TimerHandle>,
    generation: u64,
    fired_tx: mpsc::UnboundedSender<u64>,
}

impl PhaseTimer {
    /// Create a timer and the receiver its expiries arrive on
    pub fn new(service: Arc<dyn TimerService>) -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        (
            Self {
                service,
                pending: None,
                generation: 0,
                fired_tx,
            },
            fired_rx,
        )
    }

    /// Cancel any pending timer, then schedule a new one
    pub fn arm(&mut self, delay: Duration) -> u64 {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let fired_tx = self.fired_tx.clone();
        let handle = self.service.schedule_once(
            delay,
            Box::new(move || {
                let _ = fired_tx.send(generation);
            }),
        );
        self.pending = Some(handle);

        trace!(generation, delay_ms = delay.as_millis() as u64, "Phase timer armed");
        generation
    }

    /// Cancel the pending timer, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.cancel();
            trace!(generation = self.generation, "Phase timer cancelled");
        }
    }

    /// Check an expiry against the pending timer
    ///
    /// Returns `true` and clears the pending timer if `generation` belongs to
    /// it; stale expiries return `false`.
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.pending.is_some() && generation == self.generation {
            // Already fired; dropping the handle only aborts a finished task
            self.pending = None;
            true
        } else {
            trace!(generation, current = self.generation, "Ignoring stale timer expiry");
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_handle_cancel_runs_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let handle = TimerHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        handle.cancel();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handle_drop_cancels() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        {
            let _handle = TimerHandle::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_timer_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = TokioTimerService.schedule_once(
            Duration::from_millis(2500),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );

        let start = tokio::time::Instant::now();
        rx.recv().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_timer_cancel() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let handle = TokioTimerService.schedule_once(
            Duration::from_millis(100),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        handle.cancel();

        // The aborted task drops the sender, closing the channel
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_timer_rearm_discards_old_timer() {
        let (mut timer, mut fired) = PhaseTimer::new(Arc::new(TokioTimerService));

        let first = timer.arm(Duration::from_millis(100));
        let second = timer.arm(Duration::from_millis(300));
        assert_ne!(first, second);

        let generation = fired.recv().await.unwrap();
        assert_eq!(generation, second);
        assert!(timer.accept(generation));
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_timer_rejects_stale_generation() {
        let (mut timer, _fired) = PhaseTimer::new(Arc::new(TokioTimerService));

        let first = timer.arm(Duration::from_millis(100));
        timer.arm(Duration::from_millis(100));

        assert!(!timer.accept(first));
        assert!(timer.is_pending());

        timer.cancel();
        assert!(!timer.is_pending());
        assert!(!timer.accept(first + 1));
    }
}
