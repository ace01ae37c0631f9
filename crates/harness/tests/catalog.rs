use storefront_core::{Category, OverrideRecord, ProductPatch, ValidationError};
use storefront_engine::{EngineError, ListOptions, ProductQuery, SortBy};
use storefront_harness::{memory_catalog, sqlite_catalog};
use storefront_storage::{KvStore, MemoryStore};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn ids(products: &[storefront_core::Product]) -> Vec<&str> {
    products.iter().map(|p| p.id.as_str()).collect()
}

fn new_product(title: &str, price: f64) -> ProductPatch {
    ProductPatch {
        title: Some(title.to_string()),
        price: Some(price),
        image: Some("new.jpg".to_string()),
        ..ProductPatch::new("")
    }
}

// ============================================================================
// Merged reads
// ============================================================================

#[test]
fn untouched_catalog_lists_base_in_order() -> TestResult {
    let catalog = sqlite_catalog()?;
    let products = catalog.products(ListOptions::default())?;
    assert_eq!(ids(&products), ["abaya-01", "kaftan-01", "prayer-01"]);
    assert_eq!(catalog.product("kaftan-01")?.map(|p| p.price), Some(140.0));
    assert_eq!(catalog.product("missing")?, None);
    assert_eq!(catalog.version(), 0);
    Ok(())
}

#[test]
fn price_override_inherits_other_fields() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    let merged = catalog.upsert_product(ProductPatch {
        price: Some(95.0),
        ..ProductPatch::new("abaya-01")
    })?;

    assert_eq!(merged.id, "abaya-01");
    assert_eq!(merged.title, "Classic Abaya");
    assert_eq!(merged.price, 95.0);
    assert_eq!(merged.image, "a.jpg");
    assert_eq!(merged.category, Category::Abayas);
    assert_eq!(catalog.product("abaya-01")?, Some(merged));

    // Only the price is persisted.
    let stored = catalog.overrides()?;
    let patch = stored["abaya-01"].as_patch().ok_or("expected a patch")?;
    assert_eq!(patch.price, Some(95.0));
    assert_eq!(patch.title, None);
    Ok(())
}

#[test]
fn later_edits_keep_earlier_overrides() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    catalog.upsert_product(ProductPatch {
        price: Some(95.0),
        ..ProductPatch::new("abaya-01")
    })?;
    let merged = catalog.upsert_product(ProductPatch {
        on_sale: Some(true),
        ..ProductPatch::new("abaya-01")
    })?;
    assert_eq!(merged.price, 95.0);
    assert!(merged.on_sale);
    Ok(())
}

#[test]
fn new_products_follow_base_in_insertion_order() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    let created = catalog.upsert_product(ProductPatch {
        colors: Some(vec![" Navy".into(), "Navy".into(), "".into(), "Sand ".into()]),
        ..new_product("Silk Abaya — Royal Blue", 120.0)
    })?;
    assert_eq!(created.id, "silk-abaya-royal-blue");
    assert_eq!(created.colors, ["Navy", "Sand"]);
    assert_eq!(created.category, Category::Abayas);
    assert!(!created.hidden);

    catalog.upsert_product(ProductPatch {
        category: Some(Category::ModestDresses),
        ..new_product("Tiered Dress", 75.0)
    })?;
    // Editing the first addition keeps its position.
    catalog.upsert_product(ProductPatch {
        price: Some(110.0),
        ..ProductPatch::new("silk-abaya-royal-blue")
    })?;

    let products = catalog.products(ListOptions::default())?;
    assert_eq!(
        ids(&products),
        ["abaya-01", "kaftan-01", "prayer-01", "silk-abaya-royal-blue", "tiered-dress"]
    );
    assert_eq!(products[3].price, 110.0);
    Ok(())
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn invalid_writes_persist_nothing() -> TestResult {
    let mut catalog = sqlite_catalog()?;

    let err = catalog
        .upsert_product(ProductPatch {
            price: Some(-1.0),
            ..ProductPatch::new("abaya-01")
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(ValidationError::InvalidPrice(_))));

    let err = catalog
        .upsert_product(ProductPatch {
            title: Some("   ".into()),
            ..ProductPatch::new("abaya-01")
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(ValidationError::EmptyTitle)));

    let err = catalog
        .upsert_product(ProductPatch {
            image: None,
            ..new_product("No Picture", 10.0)
        })
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::Incomplete { field: "image", .. })
    ));

    let err = catalog.upsert_product(new_product(" — ", 10.0)).unwrap_err();
    assert!(matches!(err, EngineError::Validation(ValidationError::EmptySlug)));

    assert!(catalog.overrides()?.is_empty());
    assert_eq!(catalog.version(), 0);
    Ok(())
}

// ============================================================================
// Delete and visibility
// ============================================================================

#[test]
fn delete_removes_id_wherever_it_came_from() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    catalog.upsert_product(new_product("Linen Kaftan", 60.0))?;
    catalog.upsert_product(ProductPatch {
        price: Some(150.0),
        ..ProductPatch::new("kaftan-01")
    })?;

    // base only, override only, base + override
    for id in ["abaya-01", "linen-kaftan", "kaftan-01"] {
        catalog.delete_product(id)?;
        let all = catalog.products(ListOptions::with_hidden())?;
        assert!(!ids(&all).contains(&id), "{id} still listed");
        assert_eq!(catalog.product(id)?, None);
    }

    let stored = catalog.overrides()?;
    assert!(stored["abaya-01"].is_tombstone());
    assert!(stored["kaftan-01"].is_tombstone());
    assert!(!stored.contains_key("linen-kaftan"));
    Ok(())
}

#[test]
fn delete_is_idempotent() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    catalog.delete_product("never-existed")?;
    assert_eq!(catalog.version(), 0);

    catalog.delete_product("abaya-01")?;
    let version = catalog.version();
    catalog.delete_product("abaya-01")?;
    assert_eq!(catalog.version(), version);
    Ok(())
}

#[test]
fn deleted_base_product_can_be_restored_by_upsert() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    catalog.upsert_product(ProductPatch {
        price: Some(95.0),
        ..ProductPatch::new("abaya-01")
    })?;
    catalog.delete_product("abaya-01")?;

    let restored = catalog.upsert_product(ProductPatch {
        is_new: Some(true),
        ..ProductPatch::new("abaya-01")
    })?;
    // The old price override went away with the delete.
    assert_eq!(restored.price, 80.0);
    assert!(restored.is_new);
    Ok(())
}

#[test]
fn hidden_products_only_show_when_asked() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    let before = catalog.product("kaftan-01")?.ok_or("kaftan missing")?;

    catalog.set_hidden("kaftan-01", true)?;
    assert!(!ids(&catalog.products(ListOptions::default())?).contains(&"kaftan-01"));
    assert!(ids(&catalog.products(ListOptions::with_hidden())?).contains(&"kaftan-01"));
    assert!(catalog.product("kaftan-01")?.is_some_and(|p| p.hidden));

    catalog.set_hidden("kaftan-01", false)?;
    assert_eq!(catalog.product("kaftan-01")?, Some(before));
    Ok(())
}

#[test]
fn hiding_keeps_other_edits() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    catalog.upsert_product(new_product("Linen Kaftan", 60.0))?;
    catalog.set_hidden("linen-kaftan", true)?;
    let product = catalog.product("linen-kaftan")?.ok_or("missing")?;
    assert!(product.hidden);
    assert_eq!(product.price, 60.0);
    Ok(())
}

#[test]
fn hiding_unknown_or_deleted_ids_fails() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    assert!(matches!(
        catalog.set_hidden("ghost", true),
        Err(EngineError::ProductNotFound(id)) if id == "ghost"
    ));
    catalog.delete_product("prayer-01")?;
    assert!(matches!(
        catalog.set_hidden("prayer-01", true),
        Err(EngineError::ProductNotFound(_))
    ));
    Ok(())
}

#[test]
fn hiding_an_incomplete_added_record_fails() -> TestResult {
    let store = MemoryStore::new();
    store.seed(
        "catalog_overrides",
        r#"{"new-abaya": {"id": "new-abaya", "title": "New Abaya"}}"#,
    );
    let mut catalog = memory_catalog(store.clone())?;
    assert_eq!(catalog.product("new-abaya")?, None);
    assert!(matches!(
        catalog.set_hidden("new-abaya", true),
        Err(EngineError::ProductNotFound(id)) if id == "new-abaya"
    ));
    assert_eq!(store.revision("catalog_overrides")?, 1);
    Ok(())
}

// ============================================================================
// Categories, queries, duplicates
// ============================================================================

#[test]
fn categories_in_first_seen_order() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    assert_eq!(
        catalog.list_categories()?,
        [Category::Abayas, Category::Kaftans, Category::PrayerSets]
    );

    catalog.upsert_product(ProductPatch {
        category: Some(Category::ModestDresses),
        ..new_product("Tiered Dress", 75.0)
    })?;
    catalog.set_hidden("tiered-dress", true)?;
    catalog.delete_product("kaftan-01")?;
    assert_eq!(
        catalog.list_categories()?,
        [Category::Abayas, Category::PrayerSets, Category::ModestDresses]
    );
    Ok(())
}

#[test]
fn query_filters_sorts_and_pages() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    catalog.set_hidden("prayer-01", true)?;

    let page = catalog.query(&ProductQuery {
        sort: SortBy::Price,
        include_hidden: true,
        ..ProductQuery::default()
    })?;
    assert_eq!(ids(&page.items), ["prayer-01", "abaya-01", "kaftan-01"]);
    assert_eq!(page.total_pages, 1);

    let page = catalog.query(&ProductQuery {
        text: Some("gold".into()),
        ..ProductQuery::default()
    })?;
    assert_eq!(ids(&page.items), ["kaftan-01"]);

    let page = catalog.query(&ProductQuery {
        category: Some(Category::PrayerSets),
        ..ProductQuery::default()
    })?;
    assert_eq!(page.total, 0);
    Ok(())
}

#[test]
fn duplicate_gets_fresh_id() -> TestResult {
    let mut catalog = sqlite_catalog()?;
    let first = catalog.duplicate_product("abaya-01")?;
    assert_eq!(first.id, "classic-abaya-copy");
    assert_eq!(first.title, "Classic Abaya Copy");
    assert_eq!(first.sizes, ["S", "M", "L"]);

    let second = catalog.duplicate_product("abaya-01")?;
    assert_eq!(second.id, "classic-abaya-copy-2");

    assert!(matches!(
        catalog.duplicate_product("ghost"),
        Err(EngineError::ProductNotFound(_))
    ));
    Ok(())
}

// ============================================================================
// Storage resilience
// ============================================================================

#[test]
fn corrupt_storage_reads_as_empty() -> TestResult {
    let store = MemoryStore::new();
    store.seed("catalog_overrides", "{not json");
    store.seed("inventory", "[1, 2, 3]");
    let catalog = memory_catalog(store)?;

    assert_eq!(catalog.products(ListOptions::default())?.len(), 3);
    assert!(catalog.overrides()?.is_empty());
    assert_eq!(catalog.stock("abaya-01")?, 0);
    Ok(())
}

#[test]
fn broken_override_falls_back_to_base() -> TestResult {
    let store = MemoryStore::new();
    store.seed(
        "catalog_overrides",
        r#"{
            "abaya-01": {"id": "abaya-01", "price": -5},
            "half-done": {"id": "half-done", "title": "No price yet"},
            "kaftan-01": {"id": "kaftan-01", "price": 99}
        }"#,
    );
    let catalog = memory_catalog(store)?;
    let products = catalog.products(ListOptions::default())?;
    assert_eq!(ids(&products), ["abaya-01", "kaftan-01", "prayer-01"]);
    assert_eq!(products[0].price, 80.0);
    assert_eq!(products[1].price, 99.0);
    Ok(())
}

#[test]
fn writes_go_only_to_the_override_table() -> TestResult {
    let store = MemoryStore::new();
    let mut catalog = memory_catalog(store.clone())?;
    catalog.upsert_product(ProductPatch {
        price: Some(95.0),
        ..ProductPatch::new("abaya-01")
    })?;
    assert_eq!(store.revision("catalog_overrides")?, 1);
    assert_eq!(store.revision("inventory")?, 0);
    assert_eq!(catalog.base().get("abaya-01").map(|p| p.price), Some(80.0));
    assert!(matches!(
        catalog.overrides()?.get("abaya-01"),
        Some(OverrideRecord::Patch(_))
    ));
    Ok(())
}
