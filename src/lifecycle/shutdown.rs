//! Shutdown coordination for the gateway.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Wraps a broadcast channel; the server loop and any background tasks hold
/// subscriptions and drain when the signal fires.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// A future that resolves once shutdown is triggered.
    ///
    /// Also resolves if the coordinator is dropped, so a lost handle can
    /// never leave the server running forever.
    pub fn signalled(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_releases_all_subscribers() {
        let shutdown = Shutdown::new();
        let first = shutdown.signalled();
        let second = shutdown.signalled();

        shutdown.trigger();
        first.await;
        second.await;
    }

    #[tokio::test]
    async fn dropping_the_coordinator_releases_subscribers() {
        let shutdown = Shutdown::new();
        let pending = shutdown.signalled();
        drop(shutdown);
        pending.await;
    }
}
