use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const DEFAULT_OVERRIDES_KEY: &str = "catalog_overrides";
pub const DEFAULT_INVENTORY_KEY: &str = "inventory";
pub const DEFAULT_CONTENT_KEY: &str = "site_content";
pub const DEFAULT_PAGE_SIZE: usize = 16;

/// Storage keys and presentation knobs for a [`crate::Catalog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub overrides_key: String,
    pub inventory_key: String,
    pub content_key: String,
    /// Indent exported documents.
    pub pretty_exports: bool,
    pub page_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            overrides_key: DEFAULT_OVERRIDES_KEY.to_string(),
            inventory_key: DEFAULT_INVENTORY_KEY.to_string(),
            content_key: DEFAULT_CONTENT_KEY.to_string(),
            pretty_exports: true,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, EngineError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let keys = [&self.overrides_key, &self.inventory_key, &self.content_key];
        if keys.iter().any(|k| k.trim().is_empty()) {
            return Err(EngineError::Config("storage keys must not be empty".into()));
        }
        if self.overrides_key == self.inventory_key
            || self.overrides_key == self.content_key
            || self.inventory_key == self.content_key
        {
            return Err(EngineError::Config("storage keys must be distinct".into()));
        }
        if self.page_size == 0 {
            return Err(EngineError::Config("page_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() -> Result<(), EngineError> {
        let config = CatalogConfig::from_toml("page_size = 24\npretty_exports = false\n")?;
        assert_eq!(config.page_size, 24);
        assert!(!config.pretty_exports);
        assert_eq!(config.overrides_key, DEFAULT_OVERRIDES_KEY);
        Ok(())
    }

    #[test]
    fn toml_round_trip() -> Result<(), EngineError> {
        let config = CatalogConfig {
            content_key: "cms".into(),
            ..CatalogConfig::default()
        };
        assert_eq!(CatalogConfig::from_toml(&config.to_toml()?)?, config);
        Ok(())
    }

    #[test]
    fn rejects_clashing_or_empty_keys() {
        let clash = "overrides_key = \"inventory\"";
        assert!(matches!(CatalogConfig::from_toml(clash), Err(EngineError::Config(_))));
        let empty = "content_key = \"\"";
        assert!(matches!(CatalogConfig::from_toml(empty), Err(EngineError::Config(_))));
        assert!(matches!(CatalogConfig::from_toml("page_size = 0"), Err(EngineError::Config(_))));
        assert!(matches!(CatalogConfig::from_toml("page_size = \"x\""), Err(EngineError::Config(_))));
    }
}
