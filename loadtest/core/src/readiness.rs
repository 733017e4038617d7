use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{sync::watch, time::timeout};

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("readiness signal not set within {waited_secs}s")]
    Timeout { waited_secs: u64 },
}

/// One-time process-wide gate.
///
/// The setup path sets the signal exactly once when base state is usable;
/// init hooks and user tasks wait on clones of the same handle. Waiting
/// after the signal is set returns immediately, and setting it again is a
/// no-op.
#[derive(Clone)]
pub struct ReadinessSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for ReadinessSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Mark the gate as open. Returns whether this call was the first set.
    pub fn set(&self) -> bool {
        !self.tx.send_replace(true)
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the signal is set.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        // The sender lives inside `self`, so the channel cannot close while
        // anyone is still waiting on it.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Wait until the signal is set, giving up after `limit`.
    pub async fn wait_timeout(&self, limit: Duration) -> Result<(), ReadinessError> {
        timeout(limit, self.wait())
            .await
            .map_err(|_| ReadinessError::Timeout {
                waited_secs: limit.as_secs(),
            })
    }
}
