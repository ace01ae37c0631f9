//! Fixtures shared by the integration tests.

use std::path::PathBuf;

use storefront_core::{Category, Product};
use storefront_engine::{BaseCatalog, Catalog, EngineError};
use storefront_storage::{MemoryStore, SqliteStore};
use tempfile::TempDir;

/// Install a fmt subscriber honouring `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn product(id: &str, title: &str, price: f64, category: Category) -> Product {
    Product {
        id: id.to_string(),
        title: title.to_string(),
        price,
        image: format!("{id}.jpg"),
        images: Vec::new(),
        description: String::new(),
        category,
        is_new: false,
        is_best_seller: false,
        on_sale: false,
        badge: None,
        colors: Vec::new(),
        sizes: Vec::new(),
        tags: Vec::new(),
        hidden: false,
    }
}

/// Three shipped products: `abaya-01` (Classic Abaya, 80, a.jpg), a kaftan and
/// a prayer set.
pub fn sample_base() -> Result<BaseCatalog, EngineError> {
    let mut classic = product("abaya-01", "Classic Abaya", 80.0, Category::Abayas);
    classic.image = "a.jpg".to_string();
    classic.sizes = vec!["S".to_string(), "M".to_string(), "L".to_string()];
    classic.tags = vec!["crepe".to_string()];

    let mut kaftan = product("kaftan-01", "Emerald Kaftan", 140.0, Category::Kaftans);
    kaftan.description = "Silk kaftan with gold trim".to_string();
    kaftan.is_new = true;

    let prayer = product("prayer-01", "Travel Prayer Set", 40.0, Category::PrayerSets);

    BaseCatalog::from_products(vec![classic, kaftan, prayer])
}

/// Catalog over an in-memory SQLite database.
pub fn sqlite_catalog() -> Result<Catalog<SqliteStore>, EngineError> {
    init_tracing();
    Catalog::new(SqliteStore::open_in_memory()?, sample_base()?)
}

/// Catalog over a [`MemoryStore`]; clone the store to open a second view.
pub fn memory_catalog(store: MemoryStore) -> Result<Catalog<MemoryStore>, EngineError> {
    init_tracing();
    Catalog::new(store, sample_base()?)
}

/// One on-disk database that several catalogs can open, like browser tabs
/// sharing one profile.
pub struct SharedDatabase {
    _dir: TempDir,
    path: PathBuf,
}

impl SharedDatabase {
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storefront.db");
        Ok(Self { _dir: dir, path })
    }

    pub fn open(&self) -> Result<Catalog<SqliteStore>, EngineError> {
        init_tracing();
        Catalog::new(SqliteStore::open(&self.path)?, sample_base()?)
    }
}
