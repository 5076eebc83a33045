//! Policy Store
//!
//! Read-only bundle of the restaurant policy and the rice catalog. Loaded
//! once and shared between conversations behind an `Arc`.
//!
//! ```text
//! config/restaurant.yaml
//!   ├── restaurant:    RestaurantPolicy (hours, contact, rules)
//!   └── rice_catalog:  RiceCatalog (dishes + aliases)
//! ```

use booking_agent_core::{InformationalData, InformationalTopic};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::RiceCatalog;
use crate::policy::RestaurantPolicy;
use crate::ConfigError;

const BUILTIN_RESTAURANT: &str = include_str!("../../../config/restaurant.yaml");

/// Restaurant policy and rice catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyStore {
    pub restaurant: RestaurantPolicy,
    pub rice_catalog: RiceCatalog,
}

impl PolicyStore {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::FileNotFound(format!("{}: {}", path.as_ref().display(), e))
        })?;

        let store = Self::from_yaml(&content)?;
        tracing::info!(
            path = %path.as_ref().display(),
            dishes = store.rice_catalog.len(),
            "Loaded restaurant policy"
        );
        Ok(store)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let store: Self =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        store.validate()?;
        Ok(store)
    }

    /// The bundled restaurant configuration
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml(BUILTIN_RESTAURANT)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.restaurant.validate()?;
        self.rice_catalog.validate()?;
        Ok(())
    }

    /// Answer payload for an informational topic
    pub fn answer(&self, topic: InformationalTopic) -> InformationalData {
        let restaurant = &self.restaurant;
        match topic {
            InformationalTopic::Hours => InformationalData::OpeningHours {
                days: restaurant.hours.clone(),
            },
            InformationalTopic::Location => InformationalData::Location {
                name: restaurant.name.clone(),
                address: restaurant.address.clone(),
                maps_url: restaurant.maps_url.clone(),
            },
            InformationalTopic::Phone => InformationalData::Contact {
                phone: restaurant.phone.clone(),
            },
            InformationalTopic::Parking => InformationalData::Parking {
                details: restaurant.parking.clone(),
            },
            InformationalTopic::Prices => {
                let mut entries = restaurant.prices.clone();
                entries.extend(self.rice_catalog.price_entries());
                InformationalData::Prices { entries }
            },
            InformationalTopic::GroupPolicy => InformationalData::GroupPolicy {
                max_party_size: restaurant.group.max_party_size_online,
                phone: restaurant.phone.clone(),
            },
            InformationalTopic::Equipment => InformationalData::Equipment {
                high_chairs_available: restaurant.equipment.high_chairs_available,
                strollers_allowed: restaurant.equipment.strollers_allowed,
            },
            InformationalTopic::Menu => InformationalData::Menu {
                notes: restaurant.menu_notes.clone(),
                rice: self.rice_catalog.options(),
            },
            InformationalTopic::RiceMenu => InformationalData::RiceMenu {
                options: self.rice_catalog.options(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_store_is_valid() {
        let store = PolicyStore::builtin().unwrap();
        assert!(!store.rice_catalog.is_empty());
        assert!(store.rice_catalog.contains("arroz_negro"));
        assert_eq!(store.restaurant.group.max_party_size_online, 10);
        assert_eq!(store.restaurant.rice_rules.max_rice_types, 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUILTIN_RESTAURANT.as_bytes()).unwrap();

        let store = PolicyStore::load(file.path()).unwrap();
        assert_eq!(store.restaurant.phone, "+34 961 234 567");
    }

    #[test]
    fn test_missing_file() {
        let err = PolicyStore::load("/nonexistent/restaurant.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = PolicyStore::from_yaml("restaurant: [").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_answers() {
        let store = PolicyStore::builtin().unwrap();

        match store.answer(InformationalTopic::RiceMenu) {
            InformationalData::RiceMenu { options } => {
                assert_eq!(options.len(), store.rice_catalog.len());
            },
            other => panic!("unexpected answer: {:?}", other),
        }

        match store.answer(InformationalTopic::GroupPolicy) {
            InformationalData::GroupPolicy { max_party_size, phone } => {
                assert_eq!(max_party_size, 10);
                assert_eq!(phone, store.restaurant.phone);
            },
            other => panic!("unexpected answer: {:?}", other),
        }

        match store.answer(InformationalTopic::Prices) {
            InformationalData::Prices { entries } => {
                assert!(entries.iter().any(|e| e.item == "Arroz negro"));
            },
            other => panic!("unexpected answer: {:?}", other),
        }
    }
}
