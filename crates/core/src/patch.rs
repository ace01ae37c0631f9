use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::list::normalize_list;
use crate::product::{Category, Product, validate_price};

/// A partial product keyed by id. Unset fields fall back to the base record
/// when merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_best_seller: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_sale: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl ProductPatch {
    /// An empty patch that changes nothing.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            price: None,
            image: None,
            images: None,
            description: None,
            category: None,
            is_new: None,
            is_best_seller: None,
            on_sale: None,
            badge: None,
            colors: None,
            sizes: None,
            tags: None,
            hidden: None,
        }
    }

    /// Trim text fields and clean every list field.
    pub fn normalized(mut self) -> Self {
        self.id = self.id.trim().to_string();
        self.title = self.title.map(|t| t.trim().to_string());
        self.image = self.image.map(|i| i.trim().to_string());
        self.badge = self.badge.map(|b| b.trim().to_string());
        for list in [
            &mut self.images,
            &mut self.colors,
            &mut self.sizes,
            &mut self.tags,
        ] {
            if let Some(values) = list.take() {
                *list = Some(normalize_list(values));
            }
        }
        self
    }

    /// Check the fields this patch sets, without looking at any base record.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ValidationError::EmptyTitle);
        }
        if self.image.as_deref().is_some_and(|i| i.trim().is_empty()) {
            return Err(ValidationError::EmptyImage);
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    /// Overlay `other` onto this patch; fields set in `other` win.
    pub fn absorb(&mut self, other: ProductPatch) {
        self.title = other.title.or(self.title.take());
        self.price = other.price.or(self.price);
        self.image = other.image.or(self.image.take());
        self.images = other.images.or(self.images.take());
        self.description = other.description.or(self.description.take());
        self.category = other.category.or(self.category);
        self.is_new = other.is_new.or(self.is_new);
        self.is_best_seller = other.is_best_seller.or(self.is_best_seller);
        self.on_sale = other.on_sale.or(self.on_sale);
        self.badge = other.badge.or(self.badge.take());
        self.colors = other.colors.or(self.colors.take());
        self.sizes = other.sizes.or(self.sizes.take());
        self.tags = other.tags.or(self.tags.take());
        self.hidden = other.hidden.or(self.hidden);
    }

    fn apply_to(&self, product: &mut Product) {
        if let Some(title) = &self.title {
            product.title = title.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = &self.image {
            product.image = image.clone();
        }
        if let Some(images) = &self.images {
            product.images = images.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(is_new) = self.is_new {
            product.is_new = is_new;
        }
        if let Some(is_best_seller) = self.is_best_seller {
            product.is_best_seller = is_best_seller;
        }
        if let Some(on_sale) = self.on_sale {
            product.on_sale = on_sale;
        }
        if let Some(badge) = &self.badge {
            // An empty badge clears the label.
            product.badge = Some(badge.clone()).filter(|b| !b.trim().is_empty());
        }
        if let Some(colors) = &self.colors {
            product.colors = colors.clone();
        }
        if let Some(sizes) = &self.sizes {
            product.sizes = sizes.clone();
        }
        if let Some(tags) = &self.tags {
            product.tags = tags.clone();
        }
        if let Some(hidden) = self.hidden {
            product.hidden = hidden;
        }
    }

    /// Start a product with no base record. Title, price and image must be set.
    fn skeleton(&self) -> Result<Product, ValidationError> {
        let missing = |field| ValidationError::Incomplete {
            id: self.id.clone(),
            field,
        };
        Ok(Product {
            id: self.id.clone(),
            title: self.title.clone().ok_or_else(|| missing("title"))?,
            price: self.price.ok_or_else(|| missing("price"))?,
            image: self.image.clone().ok_or_else(|| missing("image"))?,
            images: Vec::new(),
            description: String::new(),
            category: Category::default(),
            is_new: false,
            is_best_seller: false,
            on_sale: false,
            badge: None,
            colors: Vec::new(),
            sizes: Vec::new(),
            tags: Vec::new(),
            hidden: false,
        })
    }
}

impl From<Product> for ProductPatch {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            title: Some(p.title),
            price: Some(p.price),
            image: Some(p.image),
            images: Some(p.images),
            description: Some(p.description),
            category: Some(p.category),
            is_new: Some(p.is_new),
            is_best_seller: Some(p.is_best_seller),
            on_sale: Some(p.on_sale),
            badge: Some(p.badge.unwrap_or_default()),
            colors: Some(p.colors),
            sizes: Some(p.sizes),
            tags: Some(p.tags),
            hidden: Some(p.hidden),
        }
    }
}

/// Apply `patch` on top of `base`, field by field, and validate the result.
///
/// Without a base record the patch has to describe a complete product.
pub fn merge(base: Option<&Product>, patch: &ProductPatch) -> Result<Product, ValidationError> {
    let mut product = match base {
        Some(base) => base.clone(),
        None => patch.skeleton()?,
    };
    patch.apply_to(&mut product);
    product.validate()?;
    Ok(product)
}

/// One entry of the override table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredOverride", into = "StoredOverride")]
pub enum OverrideRecord {
    Patch(ProductPatch),
    /// The product is deleted from the catalog, even when a base record exists.
    Tombstone { id: String },
}

impl OverrideRecord {
    pub fn id(&self) -> &str {
        match self {
            Self::Patch(patch) => &patch.id,
            Self::Tombstone { id } => id,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone { .. })
    }

    pub fn as_patch(&self) -> Option<&ProductPatch> {
        match self {
            Self::Patch(patch) => Some(patch),
            Self::Tombstone { .. } => None,
        }
    }
}

/// Persisted form: the patch fields plus a `deleted` marker.
#[derive(Clone, Serialize, Deserialize)]
struct StoredOverride {
    #[serde(flatten)]
    patch: ProductPatch,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    deleted: bool,
}

impl From<StoredOverride> for OverrideRecord {
    fn from(stored: StoredOverride) -> Self {
        if stored.deleted {
            Self::Tombstone { id: stored.patch.id }
        } else {
            Self::Patch(stored.patch)
        }
    }
}

impl From<OverrideRecord> for StoredOverride {
    fn from(record: OverrideRecord) -> Self {
        match record {
            OverrideRecord::Patch(patch) => Self {
                patch,
                deleted: false,
            },
            OverrideRecord::Tombstone { id } => Self {
                patch: ProductPatch::new(id),
                deleted: true,
            },
        }
    }
}
