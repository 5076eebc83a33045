//! Turn notices
//!
//! Conditions recorded on a turn outcome. None of them escapes as an error:
//! every turn still produces a directive.

use booking_agent_core::{RejectionReason, SlotName};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnNotice {
    /// The extraction port failed; the draft is unchanged
    #[error("Extraction unavailable: {message}")]
    ExtractionUnavailable { message: String },

    #[error("Invalid catalog value for {slot}: {reason:?}")]
    InvalidCatalogValue { slot: SlotName, reason: RejectionReason },

    #[error("Date expression matches several days")]
    AmbiguousDate,

    #[error("Cancellation matches several bookings")]
    AmbiguousCancellationTarget,

    /// Strong yes with no summary on the table
    #[error("Confirmation without a presented summary")]
    ConfirmationWithoutSummary,

    /// Strong yes against a summary that no longer matches the draft
    #[error("Confirmation of a stale summary")]
    StaleConfirmation,

    #[error("Business rule violation for {slot}: {reason:?}")]
    RuleViolation { slot: SlotName, reason: RejectionReason },
}

impl TurnNotice {
    /// Notice for a refused candidate value
    pub fn rejection(slot: SlotName, reason: RejectionReason) -> Self {
        if reason.is_catalog() {
            TurnNotice::InvalidCatalogValue { slot, reason }
        } else {
            TurnNotice::RuleViolation { slot, reason }
        }
    }
}
