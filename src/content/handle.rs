//! Current collection with atomic replacement.
//!
//! Readers take a snapshot with [`CollectionHandle::load`] and keep using it
//! for as long as they like. A rebuild constructs a complete new
//! [`Collection`] and publishes it with a single pointer swap, so nobody ever
//! sees a half-populated index.
//!
//! ```text
//!   reader ──load()──▶ Arc<Collection v1>
//!   rebuild ──publish(v2)──▶ swap ──▶ later load() sees v2
//!   reader still holding v1 keeps a consistent view until it drops it
//! ```

use arc_swap::ArcSwap;
use std::sync::{Arc, OnceLock};

use super::Collection;

/// Shared, atomically replaceable collection
#[derive(Debug)]
pub struct CollectionHandle {
    current: ArcSwap<Collection>,
}

impl CollectionHandle {
    pub fn new(initial: Collection) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Snapshot of the published collection. Lock-free.
    #[inline]
    pub fn load(&self) -> Arc<Collection> {
        self.current.load_full()
    }

    /// Replace the published collection
    pub fn publish(&self, collection: Collection) {
        tracing::debug!("Publishing collection with {} articles", collection.len());
        self.current.store(Arc::new(collection));
    }
}

impl Default for CollectionHandle {
    fn default() -> Self {
        Self::new(Collection::default())
    }
}

/// Process-wide handle, set once by the first successful build
static GLOBAL: OnceLock<CollectionHandle> = OnceLock::new();

/// Install the first collection. Fails if already initialized.
pub fn init(collection: Collection) -> anyhow::Result<&'static CollectionHandle> {
    let mut pending = Some(collection);
    let handle = GLOBAL.get_or_init(|| CollectionHandle::new(pending.take().unwrap_or_default()));
    if pending.is_some() {
        anyhow::bail!("Collection already initialized");
    }
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::collection::tests::article;

    #[test]
    fn test_snapshot_survives_publish() {
        let handle = CollectionHandle::new(
            Collection::build(vec![article("first", "2021-01-01", &[])]).unwrap(),
        );

        let before = handle.load();
        handle.publish(
            Collection::build(vec![
                article("first", "2021-01-01", &[]),
                article("second", "2021-02-01", &[]),
            ])
            .unwrap(),
        );
        let after = handle.load();

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
        assert_eq!(after.all()[0].slug, "second");
    }

    #[test]
    fn test_default_is_empty() {
        assert!(CollectionHandle::default().load().is_empty());
    }

    #[test]
    fn test_global_init_once() {
        // The only test touching the process-wide handle
        let handle = init(Collection::build(vec![article("a", "2021-01-01", &[])]).unwrap())
            .unwrap();
        assert_eq!(handle.load().len(), 1);
        assert!(init(Collection::default()).is_err());

        handle.publish(Collection::build(vec![article("b", "2021-01-01", &[])]).unwrap());
        let again = GLOBAL.get().unwrap();
        assert_eq!(again.load().all()[0].slug, "b");
    }
}
