//! Debounced trigger: any burst of signals inside the quiet window
//! collapses into a single firing. The primitive knows nothing about
//! DOM mutation observers; it coalesces whatever is fed into it.

use std::time::Duration;

use tokio::{sync::mpsc, time::sleep};

#[derive(Clone)]
pub struct DebouncedTrigger {
    tx: mpsc::UnboundedSender<()>,
}

impl DebouncedTrigger {
    /// Returns the trigger plus the receiver its firings arrive on.
    pub fn new(quiet: Duration) -> (Self, mpsc::Receiver<()>) {
        let (tx, mut signal_rx) = mpsc::unbounded_channel::<()>();
        let (fire_tx, fire_rx) = mpsc::channel(1);
        tokio::spawn(async move {
            while signal_rx.recv().await.is_some() {
                sleep(quiet).await;
                // Everything that arrived during the window rides along.
                while signal_rx.try_recv().is_ok() {}
                if fire_tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        (Self { tx }, fire_rx)
    }

    /// Record one signal. Cheap and synchronous; safe from any task.
    pub fn signal(&self) {
        let _ = self.tx.send(());
    }
}
