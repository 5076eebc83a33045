//! Restaurant Policy
//!
//! Opening hours, contact details, the price sheet and the business rules
//! the merge engine enforces (group size, rice rules, equipment limits).

use booking_agent_core::{DayHours, PriceEntry, ServiceWindow};
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Group size policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupPolicy {
    /// Largest party that can be booked through the assistant
    #[serde(default = "default_max_party_size")]
    pub max_party_size_online: u32,
}

fn default_max_party_size() -> u32 {
    10
}

impl Default for GroupPolicy {
    fn default() -> Self {
        Self {
            max_party_size_online: default_max_party_size(),
        }
    }
}

/// Rice pre-order rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiceRules {
    /// Distinct rice dishes per booking
    #[serde(default = "default_max_rice_types")]
    pub max_rice_types: usize,
    /// Minimum servings per dish
    #[serde(default = "default_min_servings")]
    pub min_servings: u32,
}

fn default_max_rice_types() -> usize {
    1
}

fn default_min_servings() -> u32 {
    2
}

impl Default for RiceRules {
    fn default() -> Self {
        Self {
            max_rice_types: default_max_rice_types(),
            min_servings: default_min_servings(),
        }
    }
}

/// Equipment availability and per-booking maxima
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentPolicy {
    #[serde(default = "default_true")]
    pub high_chairs_available: bool,
    #[serde(default = "default_true")]
    pub strollers_allowed: bool,
    #[serde(default = "default_max_high_chairs")]
    pub max_high_chairs: u32,
    #[serde(default = "default_max_strollers")]
    pub max_strollers: u32,
}

fn default_true() -> bool {
    true
}

fn default_max_high_chairs() -> u32 {
    3
}

fn default_max_strollers() -> u32 {
    2
}

impl Default for EquipmentPolicy {
    fn default() -> Self {
        Self {
            high_chairs_available: true,
            strollers_allowed: true,
            max_high_chairs: default_max_high_chairs(),
            max_strollers: default_max_strollers(),
        }
    }
}

/// Restaurant facts and rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantPolicy {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub maps_url: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub parking: String,
    /// Weekdays missing from the list are closed
    #[serde(default)]
    pub hours: Vec<DayHours>,
    #[serde(default)]
    pub group: GroupPolicy,
    #[serde(default)]
    pub rice_rules: RiceRules,
    #[serde(default)]
    pub equipment: EquipmentPolicy,
    #[serde(default)]
    pub prices: Vec<PriceEntry>,
    #[serde(default)]
    pub menu_notes: Vec<String>,
}

impl RestaurantPolicy {
    /// Service windows on a weekday (empty when closed)
    pub fn windows_for(&self, weekday: Weekday) -> &[ServiceWindow] {
        self.hours
            .iter()
            .find(|d| d.weekday == weekday)
            .map(|d| d.windows.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_open_on(&self, weekday: Weekday) -> bool {
        !self.windows_for(weekday).is_empty()
    }

    /// Whether a table can be booked for this time on this weekday
    pub fn accepts_time(&self, weekday: Weekday, time: NaiveTime) -> bool {
        self.windows_for(weekday).iter().any(|w| w.contains(time))
    }

    /// Open weekdays, Monday first
    pub fn open_weekdays(&self) -> Vec<Weekday> {
        WEEK.iter().copied().filter(|d| self.is_open_on(*d)).collect()
    }

    /// Union of all service windows, for messages not tied to a day
    pub fn all_windows(&self) -> Vec<ServiceWindow> {
        let mut windows: Vec<ServiceWindow> = Vec::new();
        for day in &self.hours {
            for window in &day.windows {
                if !windows.contains(window) {
                    windows.push(*window);
                }
            }
        }
        windows.sort_by_key(|w| w.open);
        windows
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.phone.trim().is_empty() {
            return Err(ConfigError::MissingField("restaurant.phone".to_string()));
        }

        if self.group.max_party_size_online == 0 {
            return Err(ConfigError::InvalidValue {
                field: "restaurant.group.max_party_size_online".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.rice_rules.max_rice_types == 0 {
            return Err(ConfigError::InvalidValue {
                field: "restaurant.rice_rules.max_rice_types".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.rice_rules.min_servings == 0 {
            return Err(ConfigError::InvalidValue {
                field: "restaurant.rice_rules.min_servings".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.open_weekdays().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "restaurant.hours".to_string(),
                message: "Restaurant is never open".to_string(),
            });
        }

        for day in &self.hours {
            for window in &day.windows {
                if window.open > window.last_booking {
                    return Err(ConfigError::InvalidValue {
                        field: format!("restaurant.hours.{}", day.weekday),
                        message: format!("Window {} ends before it opens", window),
                    });
                }
            }
        }

        Ok(())
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Spanish weekday name used in rejection options
pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RestaurantPolicy {
        serde_yaml::from_str(
            r#"
name: "Test"
address: "Calle 1"
phone: "+34 600 000 000"
hours:
  - weekday: Mon
    windows: []
  - weekday: Sat
    windows:
      - { open: "13:00", last_booking: "15:30" }
      - { open: "20:30", last_booking: "22:30" }
  - weekday: Sun
    windows:
      - { open: "13:00", last_booking: "16:00" }
"#,
        )
        .unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let policy = policy();
        assert_eq!(policy.group.max_party_size_online, 10);
        assert_eq!(policy.rice_rules.max_rice_types, 1);
        assert_eq!(policy.rice_rules.min_servings, 2);
        assert!(policy.equipment.high_chairs_available);
    }

    #[test]
    fn test_opening_days() {
        let policy = policy();
        assert!(!policy.is_open_on(Weekday::Mon));
        assert!(!policy.is_open_on(Weekday::Tue));
        assert!(policy.is_open_on(Weekday::Sat));
        assert_eq!(policy.open_weekdays(), vec![Weekday::Sat, Weekday::Sun]);
    }

    #[test]
    fn test_accepts_time() {
        let policy = policy();
        assert!(policy.accepts_time(Weekday::Sat, hm(14, 0)));
        assert!(policy.accepts_time(Weekday::Sat, hm(22, 30)));
        assert!(!policy.accepts_time(Weekday::Sat, hm(17, 0)));
        assert!(!policy.accepts_time(Weekday::Mon, hm(14, 0)));
    }

    #[test]
    fn test_all_windows_deduplicated() {
        let windows = policy().all_windows();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].open, hm(13, 0));
    }

    #[test]
    fn test_validation() {
        let mut policy = policy();
        assert!(policy.validate().is_ok());

        policy.rice_rules.min_servings = 0;
        assert!(policy.validate().is_err());
    }
}
