use serde::{Deserialize, Serialize};
use storefront_core::{Category, Product};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Case-insensitive title order.
    #[default]
    Name,
    /// Cheapest first.
    Price,
    /// Most recently listed first.
    Newest,
}

/// Admin-side product search: text filter, category filter, sort and paging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    /// Matched case-insensitively against title, description, tags and id.
    pub text: Option<String>,
    /// `None` means every category.
    pub category: Option<Category>,
    pub sort: SortBy,
    /// 1-based; out-of-range pages are clamped.
    pub page: usize,
    pub include_hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub items: Vec<Product>,
    /// Matches across all pages.
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

impl ProductQuery {
    pub fn matches(&self, product: &Product) -> bool {
        if self.category.is_some_and(|c| c != product.category) {
            return false;
        }
        let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let needle = text.to_lowercase();
        product.title.to_lowercase().contains(&needle)
            || product.description.to_lowercase().contains(&needle)
            || product.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            || product.id.to_lowercase().contains(&needle)
    }

    /// Filter, sort and cut one page out of `products`, which must be in
    /// listing order.
    pub fn run(&self, products: Vec<Product>, page_size: usize) -> ProductPage {
        let page_size = page_size.max(1);
        let mut matched: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        match self.sort {
            SortBy::Name => matched.sort_by_cached_key(|p| p.title.to_lowercase()),
            SortBy::Price => matched.sort_by(|a, b| a.price.total_cmp(&b.price)),
            SortBy::Newest => matched.reverse(),
        }

        let total = matched.len();
        let total_pages = total.div_ceil(page_size);
        let page = self.page.clamp(1, total_pages.max(1));
        let items = matched
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();
        ProductPage {
            items,
            total,
            page,
            total_pages,
        }
    }
}
