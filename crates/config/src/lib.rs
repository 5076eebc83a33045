//! Configuration management for the booking agent
//!
//! Supports loading configuration from:
//! - the restaurant YAML (policy + rice catalog), see [`PolicyStore`]
//! - layered settings files and environment variables (BOOKING_AGENT__ prefix),
//!   see [`load_settings`]
//!
//! # Restaurant configuration
//!
//! `config/restaurant.yaml` holds everything the dialogue engine validates
//! against:
//! - opening hours by weekday
//! - address, phone, parking, price sheet
//! - group size limit, rice rules, equipment limits
//! - the rice catalog with aliases

pub mod catalog;
pub mod logging;
pub mod policy;
pub mod settings;
pub mod store;

pub use catalog::{RiceCatalog, RiceDish};
pub use logging::init_tracing;
pub use policy::{weekday_label, EquipmentPolicy, GroupPolicy, RestaurantPolicy, RiceRules};
pub use settings::{
    load_settings, load_settings_from, LoggingSettings, RuntimeEnvironment, SessionSettings,
    Settings,
};
pub use store::PolicyStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
