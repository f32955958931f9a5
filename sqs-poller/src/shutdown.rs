//! Cooperative shutdown signal for the poll loop.
//!
//! The worker only looks at the signal before each receive call; a receive
//! or batch already in flight always runs to completion.

use std::future::Future;
use tokio::sync::watch;

/// Create a connected trigger and signal.
pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

/// Raises the shutdown signal.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes the shutdown signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// A signal that triggers once `signal` completes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_future<F>(signal: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (trigger, shutdown) = channel();
        tokio::spawn(async move {
            signal.await;
            trigger.trigger();
        });
        shutdown
    }

    /// A signal that never triggers.
    pub fn never() -> Self {
        let (_, shutdown) = channel();
        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the signal is raised.
    ///
    /// Returns immediately if it already was. A dropped trigger never raises it.
    pub async fn triggered(&mut self) {
        if self.rx.wait_for(|triggered| *triggered).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
