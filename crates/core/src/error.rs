use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("main image URL must not be empty")]
    EmptyImage,

    #[error("price must be a finite number >= 0, got {0}")]
    InvalidPrice(f64),

    #[error("cannot derive an id from an empty title")]
    EmptySlug,

    #[error("product id must not be empty")]
    EmptyId,

    #[error("duplicate product id: {0}")]
    DuplicateId(String),

    #[error("new product {id} is missing required field {field}")]
    Incomplete { id: String, field: &'static str },

    #[error("stock for {id} must be >= 0, got {value}")]
    NegativeStock { id: String, value: i64 },

    #[error("stock for {id} must be a non-negative integer")]
    InvalidStock { id: String },

    #[error("document must be a JSON object keyed by id, got {0}")]
    InvalidDocument(&'static str),

    #[error("record {key} is not a valid override: {reason}")]
    InvalidRecord { key: String, reason: String },

    #[error("record {0} has no id")]
    MissingId(String),

    #[error("record stored under {key} carries id {id}")]
    IdMismatch { key: String, id: String },
}
