use std::sync::Arc;
use tokio::sync::watch;

use super::OrientationSample;

/// Last-write-wins register holding the most recent orientation.
///
/// Cloning yields another handle to the same register. There is no
/// history: each write replaces the previous sample.
#[derive(Debug, Clone)]
pub struct OrientationRegister {
    tx: Arc<watch::Sender<Option<OrientationSample>>>,
}

impl OrientationRegister {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn write(&self, sample: OrientationSample) {
        self.tx.send_replace(Some(sample));
    }

    /// Most recent sample, or `None` if nothing has been written yet
    #[must_use]
    pub fn latest(&self) -> Option<OrientationSample> {
        *self.tx.borrow()
    }

    /// Watch every write, e.g. to render roll/pitch debug values
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<OrientationSample>> {
        self.tx.subscribe()
    }
}

impl Default for OrientationRegister {
    fn default() -> Self {
        Self::new()
    }
}
