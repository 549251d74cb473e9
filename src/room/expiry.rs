use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use super::models::SeatId;

struct PendingExpiry {
    token: u64,
    handle: JoinHandle<()>,
}

/// One cancellable delayed task per seat. Scheduling again for the same seat
/// aborts the earlier task.
#[derive(Default)]
pub struct DisconnectTimers {
    pending: Mutex<HashMap<SeatId, PendingExpiry>>,
    next_token: AtomicU64,
}

impl DisconnectTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task(token)` after `delay`. The token identifies this schedule in
    /// a later call to [`DisconnectTimers::complete`].
    pub async fn schedule<F, Fut>(&self, seat_id: SeatId, delay: Duration, task: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let work = task(token);

        // held across the spawn so the task cannot complete before it is recorded
        let mut pending = self.pending.lock().await;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        });
        if let Some(previous) = pending.insert(seat_id.clone(), PendingExpiry { token, handle }) {
            debug!(seat_id = %seat_id, "Replacing pending expiry");
            previous.handle.abort();
        }
        token
    }

    /// Aborts the pending task for a seat. Returns whether one was pending.
    pub async fn cancel(&self, seat_id: &str) -> bool {
        match self.pending.lock().await.remove(seat_id) {
            Some(expiry) => {
                expiry.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Forgets a task that has run, unless it was superseded in the meantime.
    pub async fn complete(&self, seat_id: &str, token: u64) {
        let mut pending = self.pending.lock().await;
        if pending.get(seat_id).is_some_and(|p| p.token == token) {
            pending.remove(seat_id);
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_pending(&self, seat_id: &str) -> bool {
        self.pending.lock().await.contains_key(seat_id)
    }
}
