use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::WhiteboardConfig;
use crate::element::WhiteboardData;
use crate::notifier::Subscription;
use crate::store::WhiteboardStore;

/// Thread-safe handle to a [`WhiteboardStore`].
///
/// Clones share the same store. One operation runs at a time, including the
/// subscriber fan-out it triggers, so callbacks must not lock the same
/// handle again.
#[derive(Clone, Default)]
pub struct SharedWhiteboard {
    inner: Arc<Mutex<WhiteboardStore>>,
}

impl SharedWhiteboard {
    pub fn new(store: WhiteboardStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn from_config(config: &WhiteboardConfig) -> Self {
        Self::new(WhiteboardStore::with_config(config))
    }

    pub fn snapshot(&self) -> WhiteboardData {
        self.inner.lock().get_data()
    }

    /// Runs `f` with shared access to the store.
    pub fn read<R>(&self, f: impl FnOnce(&WhiteboardStore) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Runs `f` with exclusive access to the store.
    pub fn write<R>(&self, f: impl FnOnce(&mut WhiteboardStore) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&WhiteboardData) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.lock().subscribe(callback)
    }
}

impl std::fmt::Debug for SharedWhiteboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWhiteboard")
            .field("elements", &self.snapshot().len())
            .finish()
    }
}
