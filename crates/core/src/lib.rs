pub mod error;
pub mod list;
pub mod patch;
pub mod product;
pub mod slug;

pub use error::ValidationError;
pub use list::{normalize_list, parse_list};
pub use patch::{OverrideRecord, ProductPatch, merge};
pub use product::{Category, Product};
pub use slug::slugify_id;
