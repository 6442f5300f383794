//! Replaceable backend handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use super::PortalApi;

/// Shared slot holding the current backend handle.
///
/// Cheap to clone; all clones see the same handle. Every replacement bumps a
/// generation counter so in-flight work started against an older handle can
/// tell that its result is stale.
#[derive(Clone, Default)]
pub struct RemoteHandle {
    inner: Arc<RemoteHandleInner>,
}

#[derive(Default)]
struct RemoteHandleInner {
    api: RwLock<Option<Arc<dyn PortalApi>>>,
    generation: AtomicU64,
}

impl RemoteHandle {
    /// Create an empty handle slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or drop, with `None`) the backend handle.
    ///
    /// Returns the new generation.
    pub async fn replace(&self, api: Option<Arc<dyn PortalApi>>) -> u64 {
        let mut slot = self.inner.api.write().await;
        *slot = api;
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The current handle, if any.
    pub async fn current(&self) -> Option<Arc<dyn PortalApi>> {
        self.inner.api.read().await.clone()
    }

    /// Whether a handle is installed.
    pub async fn is_ready(&self) -> bool {
        self.inner.api.read().await.is_some()
    }

    /// The current generation. Zero until a handle is first installed.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHandle")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}
