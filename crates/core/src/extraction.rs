//! Structured extraction results
//!
//! The entity extraction port turns an utterance into these candidates. The
//! engine never sees free text: every field here is already classified, and
//! a missing or malformed field simply means "no candidate for that slot".

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::booking::{ConversationId, DraftSnapshot, DraftStatus, EquipmentKind, SlotName};
use crate::error::ExtractionError;
use crate::info::InformationalTopic;

/// Date as expressed by the user, before anchoring to the reference clock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateCandidate {
    /// Fully specified date ("25/12/2026")
    Absolute { date: NaiveDate },
    /// Day and month without year ("el 25/12")
    DayMonth { day: u32, month: u32 },
    /// Named weekday ("el sábado")
    Weekday { weekday: Weekday },
    /// Offset from today ("hoy" = 0, "mañana" = 1, "ayer" = -1)
    RelativeDays { days: i64 },
    /// Expression that names no single day ("este fin de semana")
    Ambiguous {
        expression: String,
        #[serde(default)]
        weekdays: Vec<Weekday>,
    },
}

/// Time as extracted; may be structurally invalid ("25:00")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeCandidate {
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
}

impl TimeCandidate {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }
}

/// Party size mention, possibly split in sub-groups ("6 adultos y 2 niños")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySizeCandidate {
    pub groups: Vec<u32>,
    /// Phrased as an increment ("y mi cuñado también")
    #[serde(default)]
    pub additive: bool,
}

impl PartySizeCandidate {
    pub fn total(count: u32) -> Self {
        Self {
            groups: vec![count],
            additive: false,
        }
    }

    pub fn groups(groups: Vec<u32>) -> Self {
        Self {
            groups,
            additive: false,
        }
    }

    pub fn additional(count: u32) -> Self {
        Self {
            groups: vec![count],
            additive: true,
        }
    }

    /// Total of all groups, or None when the counts overflow
    pub fn sum(&self) -> Option<u32> {
        self.groups.iter().try_fold(0u32, |acc, n| acc.checked_add(*n))
    }
}

/// Rice dish named by the user, not yet checked against the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiceCandidate {
    pub name: String,
    #[serde(default)]
    pub servings: Option<u32>,
}

impl RiceCandidate {
    pub fn new(name: impl Into<String>, servings: Option<u32>) -> Self {
        Self {
            name: name.into(),
            servings,
        }
    }
}

/// Explicit equipment request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentRequest {
    pub kind: EquipmentKind,
    pub count: u32,
    /// Restates the total instead of asking for more ("0 tronas", "al final son 2")
    #[serde(default)]
    pub restatement: bool,
}

/// Which confirmed booking a cancellation refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CancellationTarget {
    Reference { reference: String },
    Date { date: DateCandidate },
}

/// Classification of yes/no language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationPolarity {
    /// Explicit confirmation ("sí, confirmo")
    StrongYes,
    /// Explicit refusal ("no")
    StrongNo,
    /// Approval that is not a confirmation ("vale", "perfecto", "genial")
    WeakYes,
    #[default]
    None,
}

/// Everything the extraction port found in one utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionResult {
    /// The user wants to book ("quiero reservar")
    pub booking_intent: bool,
    pub date: Option<DateCandidate>,
    pub time: Option<TimeCandidate>,
    pub party_size: Option<PartySizeCandidate>,
    pub rice: Vec<RiceCandidate>,
    /// Servings stated without a dish ("3 raciones")
    pub servings: Option<u32>,
    pub rice_declined: bool,
    pub equipment: Vec<EquipmentRequest>,
    pub cancellation_intent: bool,
    pub cancellation_target: Option<CancellationTarget>,
    pub confirmation: ConfirmationPolarity,
    /// Slot a "no" refers to ("no, sin arroz no")
    pub negated_slot: Option<SlotName>,
    pub informational_topic: Option<InformationalTopic>,
    /// Raw matched text, kept for audit only
    pub matched_span: Option<String>,
}

impl ExtractionResult {
    /// Parse a JSON payload produced by a language model
    pub fn from_json(payload: &str) -> Result<Self, ExtractionError> {
        let trimmed = payload.trim();
        // Models like to wrap JSON in markdown fences
        let body = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|rest| rest.strip_suffix("```"))
            .unwrap_or(trimmed);

        serde_json::from_str(body.trim()).map_err(|e| {
            tracing::debug!(error = %e, "Extraction payload did not parse");
            ExtractionError::Malformed(e.to_string())
        })
    }

    /// Any candidate that would change a draft
    pub fn has_slot_candidates(&self) -> bool {
        self.date.is_some()
            || self.time.is_some()
            || self.party_size.is_some()
            || !self.rice.is_empty()
            || self.servings.is_some()
            || self.rice_declined
            || !self.equipment.is_empty()
    }

    /// Anything beyond an informational question
    pub fn has_booking_content(&self) -> bool {
        self.booking_intent
            || self.has_slot_candidates()
            || self.cancellation_intent
            || self.cancellation_target.is_some()
            || self.negated_slot.is_some()
            || matches!(
                self.confirmation,
                ConfirmationPolarity::StrongYes | ConfirmationPolarity::StrongNo
            )
    }

    // ====== Builders ======

    pub fn with_booking_intent(mut self) -> Self {
        self.booking_intent = true;
        self
    }

    pub fn with_date(mut self, date: DateCandidate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_time(mut self, hour: u32, minute: u32) -> Self {
        self.time = Some(TimeCandidate::new(hour, minute));
        self
    }

    pub fn with_party(mut self, party: PartySizeCandidate) -> Self {
        self.party_size = Some(party);
        self
    }

    pub fn with_rice(mut self, name: impl Into<String>, servings: Option<u32>) -> Self {
        self.rice.push(RiceCandidate::new(name, servings));
        self
    }

    pub fn with_servings(mut self, servings: u32) -> Self {
        self.servings = Some(servings);
        self
    }

    pub fn declining_rice(mut self) -> Self {
        self.rice_declined = true;
        self
    }

    pub fn with_equipment(mut self, kind: EquipmentKind, count: u32, restatement: bool) -> Self {
        self.equipment.push(EquipmentRequest {
            kind,
            count,
            restatement,
        });
        self
    }

    pub fn with_confirmation(mut self, polarity: ConfirmationPolarity) -> Self {
        self.confirmation = polarity;
        self
    }

    pub fn negating(mut self, slot: SlotName) -> Self {
        self.confirmation = ConfirmationPolarity::StrongNo;
        self.negated_slot = Some(slot);
        self
    }

    pub fn cancelling(mut self, target: Option<CancellationTarget>) -> Self {
        self.cancellation_intent = true;
        self.cancellation_target = target;
        self
    }

    pub fn asking(mut self, topic: InformationalTopic) -> Self {
        self.informational_topic = Some(topic);
        self
    }
}

/// Context handed to the extraction port alongside the utterance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionContext {
    pub conversation_id: ConversationId,
    pub draft: Option<DraftSnapshot>,
    pub status: Option<DraftStatus>,
    /// Slot the last question asked for
    pub awaiting: Option<SlotName>,
    pub reference_time: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_sum() {
        let party = PartySizeCandidate::groups(vec![6, 2]);
        assert_eq!(party.sum(), Some(8));
        assert_eq!(PartySizeCandidate::groups(vec![u32::MAX, 5]).sum(), None);
        assert!(!party.additive);
        assert!(PartySizeCandidate::additional(1).additive);
    }

    #[test]
    fn test_from_json_partial_payload() {
        let payload = r#"{"party_size": {"groups": [4]}, "time": {"hour": 14}}"#;
        let result = ExtractionResult::from_json(payload).unwrap();
        assert_eq!(result.party_size.unwrap().sum(), Some(4));
        assert_eq!(result.time, Some(TimeCandidate::new(14, 0)));
        assert_eq!(result.confirmation, ConfirmationPolarity::None);
        assert!(result.rice.is_empty());
    }

    #[test]
    fn test_from_json_fenced() {
        let payload = "```json\n{\"confirmation\": \"strong_yes\"}\n```";
        let result = ExtractionResult::from_json(payload).unwrap();
        assert_eq!(result.confirmation, ConfirmationPolarity::StrongYes);
    }

    #[test]
    fn test_from_json_tagged_date() {
        let payload = r#"{"date": {"kind": "weekday", "weekday": "Sat"}}"#;
        let result = ExtractionResult::from_json(payload).unwrap();
        assert_eq!(
            result.date,
            Some(DateCandidate::Weekday {
                weekday: Weekday::Sat
            })
        );
    }

    #[test]
    fn test_from_json_malformed() {
        let err = ExtractionResult::from_json("Lo siento, no entiendo").unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed(_)));
    }

    #[test]
    fn test_booking_content_classification() {
        let question = ExtractionResult::default().asking(InformationalTopic::Hours);
        assert!(!question.has_booking_content());

        let weak = question.clone().with_confirmation(ConfirmationPolarity::WeakYes);
        assert!(!weak.has_booking_content());

        let with_slot = question.with_time(14, 0);
        assert!(with_slot.has_booking_content());
    }
}
