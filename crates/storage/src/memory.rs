use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::StorageError;
use crate::traits::{KvStore, check_key};

#[derive(Debug, Clone)]
struct Slot {
    value: Vec<u8>,
    revision: u64,
}

/// In-memory store. Clones share the same data, so a clone acts as a second
/// view on the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Rc<RefCell<BTreeMap<String, Slot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes without any validation, e.g. to simulate hand-edited
    /// or legacy content.
    pub fn seed(&self, key: &str, value: impl Into<Vec<u8>>) -> u64 {
        let mut slots = self.slots.borrow_mut();
        let revision = slots.get(key).map_or(0, |s| s.revision) + 1;
        slots.insert(
            key.to_string(),
            Slot {
                value: value.into(),
                revision,
            },
        );
        revision
    }
}

impl KvStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.slots.borrow().get(key).map(|s| s.value.clone()))
    }

    fn write(&mut self, key: &str, value: &[u8]) -> Result<u64, StorageError> {
        check_key(key)?;
        Ok(self.seed(key, value))
    }

    fn revision(&self, key: &str) -> Result<u64, StorageError> {
        Ok(self.slots.borrow().get(key).map_or(0, |s| s.revision))
    }
}
