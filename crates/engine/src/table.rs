//! Persisted JSON tables: loading with fail-soft decoding, and the strict
//! shape checks applied to imported documents.

use indexmap::IndexMap;
use serde_json::Value;
use storefront_core::{OverrideRecord, ValidationError, merge};
use storefront_storage::{KvStore, StorageError};
use tracing::warn;

use crate::base::BaseCatalog;

/// Product id to override record, in insertion order.
pub type OverrideMap = IndexMap<String, OverrideRecord>;

/// Product id to units in stock.
pub type InventoryMap = IndexMap<String, u64>;

/// Site content key (hero title, banner image, ...) to text.
pub type ContentMap = IndexMap<String, String>;

/// Read the document under `key`. Unreadable JSON counts as absent.
pub(crate) fn load_document<S: KvStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Option<Value>, StorageError> {
    let Some(bytes) = store.read(key)? else {
        return Ok(None);
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "discarding corrupt document");
            Ok(None)
        }
    }
}

pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn into_entries(document: Value) -> Result<serde_json::Map<String, Value>, ValidationError> {
    match document {
        Value::Object(entries) => Ok(entries),
        other => Err(ValidationError::InvalidDocument(describe(&other))),
    }
}

/// Validate one override entry stored under `key`. Patches must merge into a
/// valid product, so an entry for an id missing from `base` has to be a
/// complete product.
pub(crate) fn parse_override(
    base: &BaseCatalog,
    key: &str,
    value: Value,
) -> Result<OverrideRecord, ValidationError> {
    let Value::Object(fields) = &value else {
        return Err(ValidationError::InvalidRecord {
            key: key.to_string(),
            reason: format!("expected an object, got {}", describe(&value)),
        });
    };
    match fields.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => {
            if id != key {
                return Err(ValidationError::IdMismatch {
                    key: key.to_string(),
                    id: id.clone(),
                });
            }
        }
        _ => return Err(ValidationError::MissingId(key.to_string())),
    }
    let record: OverrideRecord =
        serde_json::from_value(value).map_err(|e| ValidationError::InvalidRecord {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
    if let Some(patch) = record.as_patch() {
        patch.validate_fields()?;
        merge(base.get(key), patch)?;
    }
    Ok(record)
}

/// Strict form used by import: any bad entry rejects the whole document.
pub(crate) fn overrides_from_document(
    base: &BaseCatalog,
    document: Value,
) -> Result<OverrideMap, ValidationError> {
    let entries = into_entries(document)?;
    let mut overrides = OverrideMap::with_capacity(entries.len());
    for (key, value) in entries {
        let record = parse_override(base, &key, value)?;
        overrides.insert(key, record);
    }
    Ok(overrides)
}

/// Lenient form used when reading storage: bad entries are dropped.
pub(crate) fn overrides_from_storage(base: &BaseCatalog, document: Option<Value>) -> OverrideMap {
    let Some(Value::Object(entries)) = document else {
        return OverrideMap::new();
    };
    let mut overrides = OverrideMap::with_capacity(entries.len());
    for (key, value) in entries {
        match parse_override(base, &key, value) {
            Ok(record) => {
                overrides.insert(key, record);
            }
            Err(e) => warn!(key, error = %e, "dropping unreadable override"),
        }
    }
    overrides
}

fn parse_stock(id: &str, value: &Value) -> Result<u64, ValidationError> {
    if let Some(count) = value.as_u64() {
        return Ok(count);
    }
    match value.as_i64() {
        Some(negative) => Err(ValidationError::NegativeStock {
            id: id.to_string(),
            value: negative,
        }),
        None => Err(ValidationError::InvalidStock { id: id.to_string() }),
    }
}

pub(crate) fn inventory_from_document(document: Value) -> Result<InventoryMap, ValidationError> {
    let entries = into_entries(document)?;
    let mut inventory = InventoryMap::with_capacity(entries.len());
    for (id, value) in entries {
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        let count = parse_stock(&id, &value)?;
        inventory.insert(id, count);
    }
    Ok(inventory)
}

pub(crate) fn inventory_from_storage(document: Option<Value>) -> InventoryMap {
    let Some(Value::Object(entries)) = document else {
        return InventoryMap::new();
    };
    let mut inventory = InventoryMap::with_capacity(entries.len());
    for (id, value) in entries {
        match parse_stock(&id, &value) {
            Ok(count) => {
                inventory.insert(id, count);
            }
            Err(e) => warn!(error = %e, "dropping unreadable stock entry"),
        }
    }
    inventory
}

pub(crate) fn content_from_storage(document: Option<Value>) -> ContentMap {
    let Some(Value::Object(entries)) = document else {
        return ContentMap::new();
    };
    entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key, text)),
            _ => None,
        })
        .collect()
}
