// src/serve/reload.rs

use tokio::sync::broadcast;

/// Broadcast channel to connected browsers.
///
/// The reload action task calls [`ReloadHub::broadcast`]; every browser
/// holding an open event-stream connection receives a `reload` event and
/// refreshes the page.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<()>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Tell every connected client to reload. A send with no connected
    /// clients is not an error.
    pub fn broadcast(&self) {
        let _ = self.tx.send(());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}
