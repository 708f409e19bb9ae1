use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` is how chunk contents are shared between the main thread and the
/// worker pool. A fill task holds the write guard while it populates a fresh chunk,
/// mesh tasks hold read guards while they walk the cells, and block edits take the
/// write guard on the main thread.
///
/// # Examples
///
/// ```
/// use voxel_terrain::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let counter_clone = counter.clone();
///
/// std::thread::spawn(move || {
///     *counter_clone.get_mut() += 1;
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(*counter.get(), 1);
/// ```
///
/// # Lock poisoning
/// A worker that panics while holding a guard poisons the lock. The data behind a
/// chunk lock is plain block storage with no invariants spanning a partial write
/// that another reader could trip over, so both accessors recover the guard instead
/// of propagating the poison.
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read-only guard that allows reading the contained value.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a mutable guard that allows modifying the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_value() {
        let resource = MtResource::new(vec![1, 2, 3]);
        let clone = resource.clone();
        clone.get_mut().push(4);

        assert_eq!(resource.get().len(), 4);
        assert!(Arc::ptr_eq(&resource.resource, &clone.resource));
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let resource = MtResource::new(7);
        let clone = resource.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.get_mut();
            panic!("worker died while holding the lock");
        })
        .join();

        assert_eq!(*resource.get(), 7);
    }
}
