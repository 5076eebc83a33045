//! Confirmation Gate
//!
//! Only an explicit yes, given right after a summary of exactly the current
//! content, confirms a booking. The same rule applies to cancellations.
//!
//! ```text
//! PendingConfirmation
//!   content changed          ──► Stale (strong yes) / Changed
//!   strong yes + same hash   ──► Confirm
//!   strong no + slot         ──► Reopen(slot)
//!   strong no                ──► Clarify
//!   weak yes / nothing       ──► Represent
//! ```

use booking_agent_core::{BookingDraft, ConfirmationPolarity, DraftStatus, ExtractionResult, SlotName};

/// Gate verdict for a draft awaiting confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// No summary is pending
    NotApplicable,
    Confirm,
    /// Strong yes, but the content changed after the summary
    Stale,
    /// Content changed without a confirmation attempt
    Changed,
    /// Show the same summary again
    Represent,
    /// The user rejected this slot
    Reopen(SlotName),
    /// A "no" that names nothing
    Clarify,
}

/// Gate verdict for a booking awaiting cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationDecision {
    Cancel,
    Withdraw,
    Represent,
}

pub struct ConfirmationGate;

impl ConfirmationGate {
    /// Evaluate a turn against the draft as it was when the summary was shown
    ///
    /// `content_changed` is whether this turn's merge altered the booking.
    pub fn evaluate(
        summarized: &BookingDraft,
        content_changed: bool,
        extraction: &ExtractionResult,
    ) -> GateDecision {
        if summarized.status != DraftStatus::PendingConfirmation {
            return GateDecision::NotApplicable;
        }

        let strong_yes = extraction.confirmation == ConfirmationPolarity::StrongYes;
        if content_changed {
            return if strong_yes {
                GateDecision::Stale
            } else {
                GateDecision::Changed
            };
        }

        match extraction.confirmation {
            ConfirmationPolarity::StrongYes if summarized.summary_is_current() => GateDecision::Confirm,
            ConfirmationPolarity::StrongYes => GateDecision::Stale,
            ConfirmationPolarity::StrongNo => match extraction.negated_slot {
                Some(slot) => GateDecision::Reopen(slot),
                None => GateDecision::Clarify,
            },
            ConfirmationPolarity::WeakYes | ConfirmationPolarity::None => GateDecision::Represent,
        }
    }

    pub fn evaluate_cancellation(extraction: &ExtractionResult) -> CancellationDecision {
        match extraction.confirmation {
            ConfirmationPolarity::StrongYes => CancellationDecision::Cancel,
            ConfirmationPolarity::StrongNo => CancellationDecision::Withdraw,
            ConfirmationPolarity::WeakYes | ConfirmationPolarity::None => CancellationDecision::Represent,
        }
    }
}
