//! Rice Catalog
//!
//! The fixed list of rice dishes that can be pre-ordered with a booking.
//! Matching free text against it is the dialogue crate's job; this module
//! only holds the data.

use booking_agent_core::{PriceEntry, RiceOption};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ConfigError;

/// One pre-orderable rice dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiceDish {
    /// Stable key stored in the draft (e.g. "arroz_negro")
    pub key: String,
    /// Name shown to the user (e.g. "Arroz negro")
    pub display_name: String,
    /// Alternative spellings or names accepted as exact matches
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub price_per_serving: Option<f64>,
}

/// Rice catalog loaded from the restaurant YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiceCatalog {
    #[serde(default)]
    pub dishes: Vec<RiceDish>,
}

impl RiceCatalog {
    pub fn get(&self, key: &str) -> Option<&RiceDish> {
        self.dishes.iter().find(|d| d.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Display name for a key, falling back to the key itself
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map(|d| d.display_name.as_str()).unwrap_or(key)
    }

    /// Every dish as a user-facing option, in catalog order
    pub fn options(&self) -> Vec<RiceOption> {
        self.dishes
            .iter()
            .map(|d| RiceOption {
                key: d.key.clone(),
                display_name: d.display_name.clone(),
            })
            .collect()
    }

    /// Display names, in catalog order
    pub fn display_names(&self) -> Vec<String> {
        self.dishes.iter().map(|d| d.display_name.clone()).collect()
    }

    /// Per-serving prices for the price sheet
    pub fn price_entries(&self) -> Vec<PriceEntry> {
        self.dishes
            .iter()
            .filter_map(|d| {
                d.price_per_serving.map(|price| PriceEntry {
                    item: d.display_name.clone(),
                    price_eur: price,
                    unit: Some("ración".to_string()),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.dishes.is_empty() {
            return Err(ConfigError::MissingField("rice_catalog.dishes".to_string()));
        }

        let mut seen = HashSet::new();
        for dish in &self.dishes {
            if dish.key.trim().is_empty() || dish.display_name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "rice_catalog.dishes".to_string(),
                    message: "Dish key and display name must not be empty".to_string(),
                });
            }
            if !seen.insert(dish.key.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "rice_catalog.dishes".to_string(),
                    message: format!("Duplicate dish key '{}'", dish.key),
                });
            }
            if let Some(price) = dish.price_per_serving {
                if price < 0.0 {
                    return Err(ConfigError::InvalidValue {
                        field: format!("rice_catalog.{}.price_per_serving", dish.key),
                        message: format!("Must not be negative, got {}", price),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> RiceCatalog {
        serde_yaml::from_str(
            r#"
dishes:
  - key: arroz_negro
    display_name: "Arroz negro"
    price_per_serving: 16.5
  - key: arroz_a_banda
    display_name: "Arroz a banda"
    aliases: ["a banda"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_and_options() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("arroz_negro"));
        assert_eq!(catalog.display_name("arroz_a_banda"), "Arroz a banda");
        assert_eq!(catalog.display_name("unknown"), "unknown");
        assert_eq!(catalog.options()[1].key, "arroz_a_banda");
    }

    #[test]
    fn test_price_entries_skip_unpriced() {
        let entries = catalog().price_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item, "Arroz negro");
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let mut catalog = catalog();
        catalog.dishes[1].key = "arroz_negro".to_string();
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(RiceCatalog::default().validate().is_err());
    }
}
