//! Cooperative shutdown shared by every loop.
//!
//! A [`Shutdown`] is a cloneable handle around a `watch` channel holding a
//! single flag.  Any holder can [`trigger`](Shutdown::trigger) it (quit key,
//! Ctrl-C); async loops `select!` on [`wait`](Shutdown::wait), the blocking
//! input thread checks [`is_triggered`](Shutdown::is_triggered) between
//! event polls.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown.  Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            let triggered = *rx.borrow_and_update();
            if triggered || rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
