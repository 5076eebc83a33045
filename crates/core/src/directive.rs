//! Response directives
//!
//! One directive is produced per turn. Directives are structured: rendering
//! them into prose is the caller's job.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::booking::{BookingRef, DraftSnapshot, SlotName};
use crate::info::{InformationalData, InformationalTopic};

/// Why a candidate value was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Rice name matches nothing in the catalog
    NotInCatalog,
    /// Rice name matches several catalog dishes
    AmbiguousMatch,
    /// More distinct rice dishes than one booking may carry
    TooManyRiceTypes,
    BelowMinimumServings,
    PastDate,
    ClosedDay,
    OutsideOpeningHours,
    /// Group too large to book through the assistant
    LargeGroup,
    EquipmentUnavailable,
    EquipmentLimit,
}

impl RejectionReason {
    /// Catalog rejections are reported separately from business-rule ones
    pub fn is_catalog(&self) -> bool {
        matches!(
            self,
            RejectionReason::NotInCatalog
                | RejectionReason::AmbiguousMatch
                | RejectionReason::TooManyRiceTypes
        )
    }
}

/// A confirmed booking offered as a cancellation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingOption {
    pub reference: BookingRef,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub party_size: Option<u32>,
}

impl BookingOption {
    pub fn new(reference: BookingRef, snapshot: &DraftSnapshot) -> Self {
        Self {
            reference,
            date: snapshot.date,
            time: snapshot.time,
            party_size: snapshot.party_size,
        }
    }
}

/// What the caller should say next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseDirective {
    /// Ask for a missing fact
    AskForSlot { slot: SlotName },
    /// Refuse a value and list what is acceptable
    RejectValue {
        slot: SlotName,
        reason: RejectionReason,
        valid_options: Vec<String>,
    },
    /// The date expression could mean several days
    DisambiguateDate { candidates: Vec<NaiveDate> },
    /// Several confirmed bookings could be meant
    DisambiguateBooking { options: Vec<BookingOption> },
    /// Show the full booking and ask for an explicit yes
    PresentSummary { draft: DraftSnapshot },
    ConfirmedBooking { draft: DraftSnapshot },
    /// Show the booking about to be cancelled and ask for an explicit yes
    RequestCancellationConfirmation { draft: DraftSnapshot },
    CancelledBooking { reference: BookingRef },
    /// The user kept the booking after asking to cancel it
    CancellationWithdrawn { reference: BookingRef },
    /// An unconfirmed draft was dropped at the user's request
    DraftAbandoned,
    /// A "no" that names nothing to correct
    RequestClarification,
    InformationalAnswer {
        topic: InformationalTopic,
        data: InformationalData,
    },
    /// Nothing to do beyond acknowledging the user
    Acknowledge,
}

impl ResponseDirective {
    pub fn ask(slot: SlotName) -> Self {
        Self::AskForSlot { slot }
    }

    pub fn reject(slot: SlotName, reason: RejectionReason, valid_options: Vec<String>) -> Self {
        Self::RejectValue {
            slot,
            reason,
            valid_options,
        }
    }

    /// Slot the user is expected to answer next, if any
    pub fn awaited_slot(&self) -> Option<SlotName> {
        match self {
            Self::AskForSlot { slot } | Self::RejectValue { slot, .. } => Some(*slot),
            Self::DisambiguateDate { .. } => Some(SlotName::Date),
            _ => None,
        }
    }

    /// Directives that leave a question open for the next turn
    pub fn is_question(&self) -> bool {
        matches!(
            self,
            Self::AskForSlot { .. }
                | Self::RejectValue { .. }
                | Self::DisambiguateDate { .. }
                | Self::DisambiguateBooking { .. }
                | Self::PresentSummary { .. }
                | Self::RequestCancellationConfirmation { .. }
                | Self::RequestClarification
        )
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AskForSlot { .. } => "ask_for_slot",
            Self::RejectValue { .. } => "reject_value",
            Self::DisambiguateDate { .. } => "disambiguate_date",
            Self::DisambiguateBooking { .. } => "disambiguate_booking",
            Self::PresentSummary { .. } => "present_summary",
            Self::ConfirmedBooking { .. } => "confirmed_booking",
            Self::RequestCancellationConfirmation { .. } => "request_cancellation_confirmation",
            Self::CancelledBooking { .. } => "cancelled_booking",
            Self::CancellationWithdrawn { .. } => "cancellation_withdrawn",
            Self::DraftAbandoned => "draft_abandoned",
            Self::RequestClarification => "request_clarification",
            Self::InformationalAnswer { .. } => "informational_answer",
            Self::Acknowledge => "acknowledge",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_awaited_slot() {
        assert_eq!(ResponseDirective::ask(SlotName::Time).awaited_slot(), Some(SlotName::Time));
        let rejection = ResponseDirective::reject(
            SlotName::RiceType,
            RejectionReason::NotInCatalog,
            vec!["Arroz negro".to_string()],
        );
        assert_eq!(rejection.awaited_slot(), Some(SlotName::RiceType));
        assert_eq!(ResponseDirective::Acknowledge.awaited_slot(), None);
    }

    #[test]
    fn test_directive_serialization_tag() {
        let value = serde_json::to_value(ResponseDirective::ask(SlotName::PartySize)).unwrap();
        assert_eq!(value["type"], "ask_for_slot");
        assert_eq!(value["slot"], "party_size");
    }

    #[test]
    fn test_catalog_reasons() {
        assert!(RejectionReason::NotInCatalog.is_catalog());
        assert!(!RejectionReason::PastDate.is_catalog());
    }
}
