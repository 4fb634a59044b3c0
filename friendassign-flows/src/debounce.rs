//! Holding back a fast-changing value until it settles.
//!
//! Used for the search box: every keystroke updates the input channel, but only a value that has
//! stayed put for [`DEBOUNCE_DELAY`] makes it through to the fetch.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// The settled side of [`debounce`]. Dropping it, or cancelling the token it was made with, drops
/// whatever update is still pending.
#[derive(Debug)]
pub struct Debounced<T> {
    rx: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T: Clone> Debounced<T> {
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Waits for the next settled value. Errors once the input is gone or the token is cancelled.
    pub async fn changed(&mut self) -> Result<T, watch::error::RecvError> {
        self.rx.changed().await?;
        Ok(self.rx.borrow_and_update().clone())
    }

    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.rx.clone()
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Starts forwarding `input` to the returned [`Debounced`], but only once a value has gone `delay`
/// without being replaced. Every change restarts the wait. A settled value equal to the last one
/// sent is not sent again.
pub fn debounce<T>(
    mut input: watch::Receiver<T>,
    delay: Duration,
    cancel: &CancellationToken,
) -> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let initial = input.borrow_and_update().clone();
    let (tx, rx) = watch::channel(initial);
    let cancel = cancel.child_token();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = input.changed() => if changed.is_err() { return },
            }

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    changed = input.changed() => if changed.is_err() { return },
                    _ = sleep(delay) => break,
                }
            }

            let settled = input.borrow_and_update().clone();
            tx.send_if_modified(|current| {
                if *current == settled {
                    false
                } else {
                    *current = settled;
                    true
                }
            });
        }
    });

    Debounced { rx, task }
}
