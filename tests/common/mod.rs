//! Shared utilities for integration testing.

use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use device_registry::actor::Recipient;
use device_registry::registry::{Registry, RegistryHandle};

/// Upper bound for waiting on an expected message.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(3);

/// Test endpoint that replies can be addressed to.
pub struct Probe<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

/// Create a probe and the recipient that feeds it.
pub fn probe<T: Send + 'static>() -> (Recipient<T>, Probe<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Recipient::new(tx), Probe { rx })
}

#[allow(dead_code)]
impl<T> Probe<T> {
    /// Wait for the next message, panicking if none arrives in time.
    pub async fn receive(&mut self) -> T {
        self.receive_within(RECEIVE_TIMEOUT)
            .await
            .expect("probe received no message in time")
    }

    pub async fn receive_within(&mut self, timeout: Duration) -> Option<T> {
        tokio::time::timeout(timeout, self.rx.recv()).await.ok().flatten()
    }

    /// Assert that nothing arrives for `wait`.
    pub async fn expect_no_message(&mut self, wait: Duration) {
        assert!(
            self.receive_within(wait).await.is_none(),
            "probe received an unexpected message"
        );
    }
}

/// A registry with its shutdown sender kept alive by the caller.
pub fn spawn_registry() -> (RegistryHandle, broadcast::Sender<()>) {
    let (shutdown, rx) = broadcast::channel(1);
    (Registry::spawn(rx), shutdown)
}
