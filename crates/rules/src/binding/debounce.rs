//! [`Debouncer`]: coalesce bursts of record snapshots.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Runs a callback with the latest pushed value once no new value has
/// arrived for `delay`. Every push restarts the quiet period.
///
/// Must be created inside a tokio runtime. Dropping the debouncer (or
/// calling [`cancel`](Self::cancel)) discards a pending value without
/// firing; [`finish`](Self::finish) fires it immediately instead.
pub struct Debouncer<T> {
    tx: Option<mpsc::UnboundedSender<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn spawn<F>(delay: Duration, mut on_settle: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        let task = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            let timer = tokio::time::sleep(delay);
            tokio::pin!(timer);

            loop {
                tokio::select! {
                    received = rx.recv() => match received {
                        Some(value) => {
                            pending = Some(value);
                            timer.as_mut().reset(Instant::now() + delay);
                        }
                        None => {
                            // Sender gone: flush and stop.
                            if let Some(value) = pending.take() {
                                on_settle(value);
                            }
                            break;
                        }
                    },
                    () = &mut timer, if pending.is_some() => {
                        if let Some(value) = pending.take() {
                            debug!(delay_ms = delay.as_millis() as u64, "debounce settled");
                            on_settle(value);
                        }
                    }
                }
            }
        });

        Self { tx: Some(tx), task }
    }

    /// Queue a new value, replacing any pending one. Returns `false` once the
    /// debouncer has been cancelled or finished.
    pub fn push(&self, value: T) -> bool {
        match &self.tx {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    /// Abort the task; a pending value is dropped.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Fire any pending value now and wait for the task to end.
    pub async fn finish(mut self) {
        self.tx.take();
        let _ = (&mut self.task).await;
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
