//! Informational topics and the policy data answering them

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topics a user can ask about without touching the booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InformationalTopic {
    Hours,
    Location,
    Phone,
    Parking,
    Prices,
    GroupPolicy,
    Equipment,
    /// General menu question
    Menu,
    /// Listing of the rice dishes that can be pre-ordered
    RiceMenu,
}

impl InformationalTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Location => "location",
            Self::Phone => "phone",
            Self::Parking => "parking",
            Self::Prices => "prices",
            Self::GroupPolicy => "group_policy",
            Self::Equipment => "equipment",
            Self::Menu => "menu",
            Self::RiceMenu => "rice_menu",
        }
    }
}

impl fmt::Display for InformationalTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One opening window within a day, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceWindow {
    #[serde(with = "hhmm")]
    pub open: NaiveTime,
    /// Last time a table can be booked for
    #[serde(with = "hhmm")]
    pub last_booking: NaiveTime,
}

impl ServiceWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.open && time <= self.last_booking
    }
}

impl fmt::Display for ServiceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.open.format("%H:%M"),
            self.last_booking.format("%H:%M")
        )
    }
}

/// Service windows for one weekday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub weekday: Weekday,
    #[serde(default)]
    pub windows: Vec<ServiceWindow>,
}

/// A catalog dish as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiceOption {
    pub key: String,
    pub display_name: String,
}

/// Price sheet line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub item: String,
    pub price_eur: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Answer payload for an informational query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InformationalData {
    OpeningHours { days: Vec<DayHours> },
    Location { name: String, address: String, maps_url: Option<String> },
    Contact { phone: String },
    Parking { details: String },
    Prices { entries: Vec<PriceEntry> },
    GroupPolicy { max_party_size: u32, phone: String },
    Equipment { high_chairs_available: bool, strollers_allowed: bool },
    Menu { notes: Vec<String>, rice: Vec<RiceOption> },
    RiceMenu { options: Vec<RiceOption> },
}

/// `HH:MM` serde format for service times
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_window_bounds() {
        let window = ServiceWindow {
            open: NaiveTime::from_hms_opt(13, 30, 0).unwrap(),
            last_booking: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
        };
        assert!(window.contains(NaiveTime::from_hms_opt(13, 30, 0).unwrap()));
        assert!(window.contains(NaiveTime::from_hms_opt(15, 30, 0).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(15, 31, 0).unwrap()));
        assert_eq!(window.to_string(), "13:30-15:30");
    }

    #[test]
    fn test_window_hhmm_round_trip() {
        let json = r#"{"open":"13:00","last_booking":"15:45"}"#;
        let window: ServiceWindow = serde_json::from_str(json).unwrap();
        assert_eq!(window.last_booking, NaiveTime::from_hms_opt(15, 45, 0).unwrap());
        assert_eq!(serde_json::to_string(&window).unwrap(), json);
    }

    #[test]
    fn test_data_is_tagged() {
        let data = InformationalData::Contact {
            phone: "+34 600 000 000".to_string(),
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["kind"], "contact");
    }
}
