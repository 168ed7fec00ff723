use std::time::Duration;

use tokio::sync::mpsc;

/// Trailing-edge debouncer for free-text inputs that trigger lookups.
///
/// Values pushed in quick succession collapse into the most recent one, which
/// is delivered on the output channel once the input has been quiet for the
/// configured delay. Dropping the debouncer flushes whatever is pending.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debounce task; returns the input handle and the output receiver.
    pub fn spawn(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        tokio::spawn(debounce_loop(in_rx, out_tx, delay));
        (Self { tx: in_tx }, out_rx)
    }

    /// Returns false once the output side has gone away.
    pub fn push(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// 1. Block until the first value arrives.
/// 2. Replace it with every newer value that shows up within `delay`.
/// 3. Emit the survivor once `delay` passes without input.
async fn debounce_loop<T>(
    mut rx: mpsc::UnboundedReceiver<T>,
    out: mpsc::UnboundedSender<T>,
    delay: Duration,
) {
    while let Some(mut pending) = rx.recv().await {
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(value) => pending = value,
                    None => break, // input closed, flush
                },
                _ = tokio::time::sleep(delay) => break,
            }
        }
        if out.send(pending).is_err() {
            return;
        }
    }
}
