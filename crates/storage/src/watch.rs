use std::collections::BTreeMap;

use tracing::debug;

use crate::error::StorageError;
use crate::traits::KvStore;

/// A key that was rewritten by someone other than the watching handle. Only
/// the key is reported; readers re-read the value themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type ChangeHandler = Box<dyn FnMut(&StorageChange)>;

struct Subscription {
    id: SubscriptionId,
    key: String,
    handler: ChangeHandler,
}

/// Detects writes made through other handles by polling key revisions.
///
/// The owning handle reports its own writes with [`ChangeWatcher::mark_seen`]
/// so they never come back as external changes.
#[derive(Default)]
pub struct ChangeWatcher {
    seen: BTreeMap<String, u64>,
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl ChangeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching `key` from its current revision.
    pub fn track<S: KvStore + ?Sized>(&mut self, store: &S, key: &str) -> Result<(), StorageError> {
        let revision = store.revision(key)?;
        self.seen.insert(key.to_string(), revision);
        Ok(())
    }

    pub fn is_tracking(&self, key: &str) -> bool {
        self.seen.contains_key(key)
    }

    pub fn mark_seen(&mut self, key: &str, revision: u64) {
        self.seen.insert(key.to_string(), revision);
    }

    /// Call `handler` for every later external change to `key`. An untracked
    /// key is tracked from its current revision first.
    pub fn subscribe<S: KvStore + ?Sized>(
        &mut self,
        store: &S,
        key: &str,
        handler: impl FnMut(&StorageChange) + 'static,
    ) -> Result<SubscriptionId, StorageError> {
        if !self.is_tracking(key) {
            self.track(store, key)?;
        }
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push(Subscription {
            id,
            key: key.to_string(),
            handler: Box::new(handler),
        });
        Ok(id)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Compare every watched key against the store and notify subscribers of
    /// the keys whose revision moved.
    pub fn poll<S: KvStore + ?Sized>(&mut self, store: &S) -> Result<Vec<StorageChange>, StorageError> {
        let mut changes = Vec::new();
        for (key, seen) in self.seen.iter_mut() {
            let revision = store.revision(key)?;
            if revision != *seen {
                *seen = revision;
                changes.push(StorageChange {
                    key: key.clone(),
                    revision,
                });
            }
        }
        for change in &changes {
            debug!(key = %change.key, revision = change.revision, "external storage change");
            for sub in self.subscriptions.iter_mut().filter(|s| s.key == change.key) {
                (sub.handler)(change);
            }
        }
        Ok(changes)
    }
}

impl std::fmt::Debug for ChangeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeWatcher")
            .field("seen", &self.seen)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
