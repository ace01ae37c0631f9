use crate::error::StorageError;

/// Key-value port the catalog persists its tables through.
///
/// Every key holds one opaque document. Writes replace the whole document and
/// bump the key's revision, which is how other handles on the same storage
/// notice the change.
pub trait KvStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the document under `key` and return its new revision.
    fn write(&mut self, key: &str, value: &[u8]) -> Result<u64, StorageError>;

    /// Number of writes ever made to `key`; 0 if it was never written.
    fn revision(&self, key: &str) -> Result<u64, StorageError>;
}

pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
