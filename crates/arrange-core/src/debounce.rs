//! Trailing-edge debounce backed by a cancellable timer task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Sends one event after the input has been quiet for `delay`.
///
/// Each [`schedule`](Debouncer::schedule) cancels the previous timer and
/// returns a fresh token.  The receiver confirms the token with
/// [`take_if_current`](Debouncer::take_if_current) so a timer that fired
/// just before being cancelled is still ignored.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: u64,
    pending: Option<CancellationToken>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    pub fn schedule<T, F>(&mut self, tx: &mpsc::UnboundedSender<T>, make: F) -> u64
    where
        T: Send + 'static,
        F: FnOnce(u64) -> T + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let token = self.generation;
        let cancel = CancellationToken::new();
        self.pending = Some(cancel.clone());

        let tx = tx.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("debounce: token {} cancelled", token);
                }
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(make(token));
                }
            }
        });
        token
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.pending.take() {
            cancel.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume `token` if it belongs to the latest scheduled timer.
    pub fn take_if_current(&mut self, token: u64) -> bool {
        if token == self.generation && self.pending.is_some() {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_only_latest_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));

        debouncer.schedule(&tx, |t| t);
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.schedule(&tx, |t| t);
        tokio::time::sleep(Duration::from_millis(400)).await;
        let last = debouncer.schedule(&tx, |t| t);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, last);
        assert!(debouncer.take_if_current(fired));
        assert!(!debouncer.is_pending());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_suppresses_event() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u64>();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        debouncer.schedule(&tx, |t| t);
        debouncer.cancel();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
        assert!(!debouncer.take_if_current(1));
    }
}
