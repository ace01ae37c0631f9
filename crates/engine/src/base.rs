use std::collections::HashMap;

use storefront_core::{Product, ValidationError};

use crate::error::EngineError;

const BUNDLED_CATALOG: &str = include_str!("../data/catalog.json");

/// The read-only product list shipped with the application.
#[derive(Debug, Clone, Default)]
pub struct BaseCatalog {
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl BaseCatalog {
    pub fn from_products(products: Vec<Product>) -> Result<Self, EngineError> {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            if product.id.trim().is_empty() {
                return Err(ValidationError::EmptyId.into());
            }
            product.validate()?;
            if index.insert(product.id.clone(), position).is_some() {
                return Err(ValidationError::DuplicateId(product.id.clone()).into());
            }
        }
        Ok(Self { products, index })
    }

    /// Parse a JSON array of products.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let products: Vec<Product> =
            serde_json::from_str(text).map_err(|e| EngineError::Parse(e.to_string()))?;
        Self::from_products(products)
    }

    pub fn bundled() -> Result<Self, EngineError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.index.get(id).map(|&i| &self.products[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
