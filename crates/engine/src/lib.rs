pub mod base;
pub mod config;
pub mod error;
pub mod query;
pub mod table;
pub mod transfer;

pub use base::BaseCatalog;
pub use config::CatalogConfig;
pub use error::EngineError;
pub use query::{ProductPage, ProductQuery, SortBy};
pub use table::{ContentMap, InventoryMap, OverrideMap};
pub use transfer::{
    DirectorySink, FileSink, INVENTORY_EXPORT_FILE, MemorySink, OVERRIDES_EXPORT_FILE,
};

use std::collections::HashSet;

use serde::Serialize;
use storefront_core::{
    Category, OverrideRecord, Product, ProductPatch, ValidationError, merge, slugify_id,
};
use storefront_storage::{ChangeWatcher, KvStore, StorageChange, SubscriptionId};
use tracing::{debug, info, warn};

use crate::table::{
    content_from_storage, inventory_from_document, inventory_from_storage, load_document,
    overrides_from_document, overrides_from_storage,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub include_hidden: bool,
}

impl ListOptions {
    pub fn with_hidden() -> Self {
        Self {
            include_hidden: true,
        }
    }
}

/// The merged storefront catalog: base products with the admin's overrides
/// applied on every read.
///
/// Writes only ever touch the override, inventory and content tables in the
/// store; the base catalog is never modified. Nothing read from storage is
/// cached between calls, so every operation sees the latest persisted state.
pub struct Catalog<S: KvStore> {
    store: S,
    base: BaseCatalog,
    config: CatalogConfig,
    watcher: ChangeWatcher,
    version: u64,
}

impl<S: KvStore> Catalog<S> {
    pub fn new(store: S, base: BaseCatalog) -> Result<Self, EngineError> {
        Self::with_config(store, base, CatalogConfig::default())
    }

    pub fn with_config(
        store: S,
        base: BaseCatalog,
        config: CatalogConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let mut watcher = ChangeWatcher::new();
        for key in [&config.overrides_key, &config.inventory_key, &config.content_key] {
            watcher.track(&store, key)?;
        }
        Ok(Self {
            store,
            base,
            config,
            watcher,
            version: 0,
        })
    }

    pub fn base(&self) -> &BaseCatalog {
        &self.base
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bumped on every write made through this handle and on every external
    /// change picked up by [`Catalog::poll_external_changes`].
    pub fn version(&self) -> u64 {
        self.version
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Merged products: base order first, then added products in the order
    /// they were first saved.
    pub fn products(&self, options: ListOptions) -> Result<Vec<Product>, EngineError> {
        let overrides = self.overrides()?;
        let mut products = self.merged(&overrides);
        if !options.include_hidden {
            products.retain(|p| !p.hidden);
        }
        Ok(products)
    }

    /// Merged lookup by id. Hidden products are returned, deleted ones are not.
    pub fn product(&self, id: &str) -> Result<Option<Product>, EngineError> {
        let overrides = self.overrides()?;
        Ok(self.resolve(id, overrides.get(id)))
    }

    /// Categories in first-seen order across the whole merged catalog.
    pub fn list_categories(&self) -> Result<Vec<Category>, EngineError> {
        let mut categories: Vec<Category> = Vec::new();
        for product in self.products(ListOptions::with_hidden())? {
            if !categories.contains(&product.category) {
                categories.push(product.category);
            }
        }
        Ok(categories)
    }

    pub fn query(&self, query: &ProductQuery) -> Result<ProductPage, EngineError> {
        let products = self.products(ListOptions {
            include_hidden: query.include_hidden,
        })?;
        Ok(query.run(products, self.config.page_size))
    }

    /// The raw override table as persisted.
    pub fn overrides(&self) -> Result<OverrideMap, EngineError> {
        let document = load_document(&self.store, &self.config.overrides_key)?;
        Ok(overrides_from_storage(&self.base, document))
    }

    fn merged(&self, overrides: &OverrideMap) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .base
            .iter()
            .filter_map(|base| self.resolve(&base.id, overrides.get(&base.id)))
            .collect();
        for (id, record) in overrides {
            if !self.base.contains(id) {
                products.extend(self.resolve(id, Some(record)));
            }
        }
        products
    }

    fn resolve(&self, id: &str, record: Option<&OverrideRecord>) -> Option<Product> {
        let base = self.base.get(id);
        match record {
            None => base.cloned(),
            Some(OverrideRecord::Tombstone { .. }) => None,
            Some(OverrideRecord::Patch(patch)) => match merge(base, patch) {
                Ok(product) => Some(product),
                Err(e) => {
                    // A broken override never hides the shipped product.
                    warn!(id, error = %e, "ignoring invalid override");
                    base.cloned()
                }
            },
        }
    }

    // ========================================================================
    // Product writes
    // ========================================================================

    /// Save an edit or a new product and return the merged result.
    ///
    /// A blank id is derived from the title. Fields left unset keep their
    /// previous override or base value. Nothing is written if the merged
    /// product would be invalid.
    pub fn upsert_product(&mut self, patch: ProductPatch) -> Result<Product, EngineError> {
        let mut patch = patch.normalized();
        if patch.id.is_empty() {
            patch.id = slugify_id(patch.title.as_deref().unwrap_or_default())?;
        }
        patch.validate_fields()?;

        let mut overrides = self.overrides()?;
        let stored = match overrides.get(&patch.id) {
            Some(OverrideRecord::Patch(existing)) => {
                let mut existing = existing.clone();
                existing.absorb(patch);
                existing
            }
            // A deleted id comes back fresh on top of its base record.
            Some(OverrideRecord::Tombstone { .. }) | None => patch,
        };
        let product = merge(self.base.get(&stored.id), &stored)?;

        overrides.insert(stored.id.clone(), OverrideRecord::Patch(stored));
        self.save_overrides(&overrides)?;
        debug!(id = %product.id, "product saved");
        Ok(product)
    }

    /// Remove a product from the merged catalog. Shipped products get a
    /// tombstone; added products are dropped from the table. Unknown ids are
    /// ignored.
    pub fn delete_product(&mut self, id: &str) -> Result<(), EngineError> {
        let mut overrides = self.overrides()?;
        let changed = if self.base.contains(id) {
            let already_deleted = overrides.get(id).is_some_and(OverrideRecord::is_tombstone);
            if !already_deleted {
                let tombstone = OverrideRecord::Tombstone { id: id.to_string() };
                overrides.insert(id.to_string(), tombstone);
            }
            !already_deleted
        } else {
            overrides.shift_remove(id).is_some()
        };
        if changed {
            self.save_overrides(&overrides)?;
            debug!(id, "product deleted");
        }
        Ok(())
    }

    /// Show or hide a product without touching any other field.
    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> Result<(), EngineError> {
        let mut overrides = self.overrides()?;
        if self.resolve(id, overrides.get(id)).is_none() {
            return Err(EngineError::ProductNotFound(id.to_string()));
        }
        match overrides.get_mut(id) {
            Some(OverrideRecord::Patch(patch)) => patch.hidden = Some(hidden),
            // Only a shipped product without an override gets here.
            _ => {
                let patch = ProductPatch {
                    hidden: Some(hidden),
                    ..ProductPatch::new(id)
                };
                overrides.insert(id.to_string(), OverrideRecord::Patch(patch));
            }
        }
        self.save_overrides(&overrides)?;
        debug!(id, hidden, "visibility changed");
        Ok(())
    }

    /// Save a copy of a product titled "<title> Copy" under a fresh id.
    pub fn duplicate_product(&mut self, id: &str) -> Result<Product, EngineError> {
        let source = self
            .product(id)?
            .ok_or_else(|| EngineError::ProductNotFound(id.to_string()))?;
        let title = format!("{} Copy", source.title);
        let stem = slugify_id(&title)?;

        let overrides = self.overrides()?;
        let mut taken: HashSet<String> = overrides.keys().cloned().collect();
        taken.extend(self.base.iter().map(|p| p.id.clone()));
        let mut copy_id = stem.clone();
        let mut suffix = 2;
        while taken.contains(&copy_id) {
            copy_id = format!("{stem}-{suffix}");
            suffix += 1;
        }

        let mut patch = ProductPatch::from(source);
        patch.id = copy_id;
        patch.title = Some(title);
        self.upsert_product(patch)
    }

    // ========================================================================
    // Override import / export
    // ========================================================================

    /// Serialize the override table, hand it to `sink` and return it.
    pub fn export_overrides(&self, sink: &mut dyn FileSink) -> Result<String, EngineError> {
        let document = self.render(&self.overrides()?)?;
        sink.deliver(OVERRIDES_EXPORT_FILE, &document)?;
        Ok(document)
    }

    /// Replace the whole override table with `text`. On any error the stored
    /// table is left as it was. Returns the number of imported records.
    pub fn import_overrides(&mut self, text: &str) -> Result<usize, EngineError> {
        let document = parse_document(text)?;
        let overrides = overrides_from_document(&self.base, document)?;
        self.save_overrides(&overrides)?;
        info!(records = overrides.len(), "catalog overrides imported");
        Ok(overrides.len())
    }

    pub fn clear_overrides(&mut self) -> Result<(), EngineError> {
        self.save_overrides(&OverrideMap::new())?;
        info!("catalog overrides cleared");
        Ok(())
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    pub fn inventory(&self) -> Result<InventoryMap, EngineError> {
        let document = load_document(&self.store, &self.config.inventory_key)?;
        Ok(inventory_from_storage(document))
    }

    /// Units in stock; 0 for ids that were never stocked.
    pub fn stock(&self, id: &str) -> Result<u64, EngineError> {
        Ok(self.inventory()?.get(id).copied().unwrap_or(0))
    }

    pub fn set_stock(&mut self, id: &str, value: i64) -> Result<(), EngineError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ValidationError::EmptyId.into());
        }
        let count = u64::try_from(value).map_err(|_| ValidationError::NegativeStock {
            id: id.to_string(),
            value,
        })?;
        let mut inventory = self.inventory()?;
        inventory.insert(id.to_string(), count);
        let key = self.config.inventory_key.clone();
        self.write_table(&key, &inventory)?;
        debug!(id, count, "stock updated");
        Ok(())
    }

    pub fn export_inventory(&self, sink: &mut dyn FileSink) -> Result<String, EngineError> {
        let document = self.render(&self.inventory()?)?;
        sink.deliver(INVENTORY_EXPORT_FILE, &document)?;
        Ok(document)
    }

    pub fn import_inventory(&mut self, text: &str) -> Result<usize, EngineError> {
        let document = parse_document(text)?;
        let inventory = inventory_from_document(document)?;
        let key = self.config.inventory_key.clone();
        self.write_table(&key, &inventory)?;
        info!(entries = inventory.len(), "inventory imported");
        Ok(inventory.len())
    }

    pub fn reset_inventory(&mut self) -> Result<(), EngineError> {
        let key = self.config.inventory_key.clone();
        self.write_table(&key, &InventoryMap::new())?;
        info!("inventory reset");
        Ok(())
    }

    // ========================================================================
    // Site content
    // ========================================================================

    pub fn content(&self) -> Result<ContentMap, EngineError> {
        let document = load_document(&self.store, &self.config.content_key)?;
        Ok(content_from_storage(document))
    }

    /// Stored text for `key`, or `default` when unset.
    pub fn content_value(&self, key: &str, default: &str) -> Result<String, EngineError> {
        Ok(self
            .content()?
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    /// Replace all site content. Blank values are dropped so the built-in
    /// defaults apply to them.
    pub fn save_content(&mut self, content: ContentMap) -> Result<(), EngineError> {
        let content: ContentMap = content
            .into_iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();
        let key = self.config.content_key.clone();
        self.write_table(&key, &content)?;
        debug!(entries = content.len(), "site content saved");
        Ok(())
    }

    pub fn reset_content(&mut self) -> Result<(), EngineError> {
        self.save_content(ContentMap::new())
    }

    // ========================================================================
    // Change notification
    // ========================================================================

    /// Call `handler` whenever another handle rewrites `key`.
    pub fn on_external_change(
        &mut self,
        key: &str,
        handler: impl FnMut(&StorageChange) + 'static,
    ) -> Result<SubscriptionId, EngineError> {
        Ok(self.watcher.subscribe(&self.store, key, handler)?)
    }

    pub fn remove_change_handler(&mut self, id: SubscriptionId) -> bool {
        self.watcher.unsubscribe(id)
    }

    /// Look for writes made through other handles since the last poll. Each
    /// one bumps [`Catalog::version`] and fires the matching handlers.
    /// Concurrent edits are not merged: the last full-table write wins.
    pub fn poll_external_changes(&mut self) -> Result<Vec<StorageChange>, EngineError> {
        let changes = self.watcher.poll(&self.store)?;
        self.version += changes.len() as u64;
        Ok(changes)
    }

    // ========================================================================
    // Persistence helpers
    // ========================================================================

    fn save_overrides(&mut self, overrides: &OverrideMap) -> Result<(), EngineError> {
        let key = self.config.overrides_key.clone();
        self.write_table(&key, overrides)
    }

    fn write_table<T: Serialize>(&mut self, key: &str, table: &T) -> Result<(), EngineError> {
        let bytes =
            serde_json::to_vec(table).map_err(|e| EngineError::Serialization(e.to_string()))?;
        let revision = self.store.write(key, &bytes)?;
        self.watcher.mark_seen(key, revision);
        self.version += 1;
        Ok(())
    }

    fn render<T: Serialize>(&self, table: &T) -> Result<String, EngineError> {
        let rendered = if self.config.pretty_exports {
            serde_json::to_string_pretty(table)
        } else {
            serde_json::to_string(table)
        };
        rendered.map_err(|e| EngineError::Serialization(e.to_string()))
    }
}

fn parse_document(text: &str) -> Result<serde_json::Value, EngineError> {
    serde_json::from_str(text).map_err(|e| EngineError::Parse(e.to_string()))
}

impl<S: KvStore> std::fmt::Debug for Catalog<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("base_products", &self.base.len())
            .field("config", &self.config)
            .field("version", &self.version)
            .finish()
    }
}
