//! Trailing-edge debouncing for values produced faster than they should be
//! acted upon.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Input side of a debounced stream.
///
/// Every pushed value restarts the quiet window; only the most recent value is
/// forwarded once `delay` elapses without a newer one. Dropping the debouncer
/// (or cancelling its token) discards whatever is still pending, so nothing is
/// emitted after the consumer has gone away.
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    cancel: CancellationToken,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawns the debouncing task on the current tokio runtime and returns the
    /// input handle together with the receiver of stable values.
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        Self::with_cancellation(delay, CancellationToken::new())
    }

    /// Same as [`Debouncer::new`], but the task also stops when `cancel` fires.
    pub fn with_cancellation(
        delay: Duration,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(input_rx, output_tx, delay, cancel.clone()));
        (
            Self {
                input: input_tx,
                cancel,
            },
            output_rx,
        )
    }

    /// Queues `value`, superseding any value still waiting for its window.
    /// Returns `false` once the debouncer has been torn down.
    pub fn push(&self, value: T) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.input.send(value).is_ok()
    }
}

impl<T> Debouncer<T> {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<T>(
    mut input: mpsc::UnboundedReceiver<T>,
    output: mpsc::UnboundedSender<T>,
    delay: Duration,
    cancel: CancellationToken,
) {
    let mut pending: Option<T> = None;
    loop {
        match pending.take() {
            None => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    next = input.recv() => match next {
                        Some(value) => pending = Some(value),
                        None => return,
                    },
                }
            }
            Some(value) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::trace!("debouncer cancelled with a pending value");
                        return;
                    }
                    next = input.recv() => match next {
                        Some(newer) => pending = Some(newer),
                        None => return,
                    },
                    _ = tokio::time::sleep(delay) => {
                        if output.send(value).is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}
