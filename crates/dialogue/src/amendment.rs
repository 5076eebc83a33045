//! Modification Handler
//!
//! Changes to a confirmed booking. An amendment is all or nothing: if any
//! value in it is refused, the confirmed booking stays exactly as it was.
//! An accepted amendment reopens the booking, which then needs a fresh
//! summary and an explicit yes; the booking reference is kept.

use booking_agent_core::{BookingDraft, DraftStatus, ExtractionResult};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::merge::{ChangeSource, Rejection, SlotMergeEngine, StateChange};

/// Result of applying an amendment
#[derive(Debug, Clone)]
pub enum AmendmentOutcome {
    /// Draft reopened with the change; summary or next question still to issue
    Applied {
        draft: BookingDraft,
        changes: Vec<StateChange>,
    },
    Rejected(Rejection),
    AmbiguousDate(Vec<NaiveDate>),
    /// Nothing in the utterance changes the booking
    Unchanged,
}

pub struct ModificationHandler {
    merge: Arc<SlotMergeEngine>,
}

impl ModificationHandler {
    pub fn new(merge: Arc<SlotMergeEngine>) -> Self {
        Self { merge }
    }

    pub fn amend(
        &self,
        confirmed: &BookingDraft,
        extraction: &ExtractionResult,
        today: NaiveDate,
        turn_index: usize,
    ) -> AmendmentOutcome {
        let outcome = self
            .merge
            .merge(confirmed, extraction, today, turn_index, ChangeSource::Amendment);

        if let Some(rejection) = outcome.rejections.into_iter().next() {
            tracing::debug!(
                reference = ?confirmed.reference,
                slot = rejection.slot.as_str(),
                "Amendment rejected"
            );
            return AmendmentOutcome::Rejected(rejection);
        }

        if let Some(dates) = outcome.date_ambiguity {
            return AmendmentOutcome::AmbiguousDate(dates);
        }

        if !outcome.changed {
            return AmendmentOutcome::Unchanged;
        }

        let mut draft = outcome.draft;
        draft.status = DraftStatus::Collecting;
        draft.last_summary_hash = None;

        tracing::info!(
            reference = ?draft.reference,
            changes = outcome.changes.len(),
            "Confirmed booking amended, awaiting re-confirmation"
        );

        AmendmentOutcome::Applied {
            draft,
            changes: outcome.changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_agent_config::PolicyStore;
    use booking_agent_core::{BookingRef, EquipmentKind, PartySizeCandidate, RejectionReason};
    use chrono::NaiveTime;

    fn handler() -> ModificationHandler {
        let store = Arc::new(PolicyStore::builtin().unwrap());
        ModificationHandler::new(Arc::new(SlotMergeEngine::new(store)))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn confirmed() -> BookingDraft {
        let mut draft = BookingDraft {
            date: NaiveDate::from_ymd_opt(2026, 10, 17),
            party_size: Some(4),
            time: NaiveTime::from_hms_opt(14, 0, 0),
            rice_declined: true,
            reference: Some(BookingRef::new("RES-0000AAAA")),
            ..Default::default()
        };
        draft.mark_summarized();
        draft.status = DraftStatus::Confirmed;
        draft.confirmed = Some(draft.snapshot());
        draft
    }

    #[test]
    fn test_accepted_change_reopens() {
        let extraction = ExtractionResult::default().with_equipment(EquipmentKind::HighChair, 1, false);
        match handler().amend(&confirmed(), &extraction, today(), 7) {
            AmendmentOutcome::Applied { draft, changes } => {
                assert_eq!(draft.status, DraftStatus::Collecting);
                assert_eq!(draft.equipment.high_chairs, 1);
                assert_eq!(draft.reference, Some(BookingRef::new("RES-0000AAAA")));
                assert_eq!(changes[0].source, ChangeSource::Amendment);
            },
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_value_rejects_whole_amendment() {
        let extraction = ExtractionResult::default()
            .with_party(PartySizeCandidate::total(6))
            .with_rice("arroz de pollo", None);
        match handler().amend(&confirmed(), &extraction, today(), 7) {
            AmendmentOutcome::Rejected(rejection) => {
                assert_eq!(rejection.reason, RejectionReason::NotInCatalog);
            },
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_restating_confirmed_values_is_unchanged() {
        let extraction = ExtractionResult::default().with_party(PartySizeCandidate::total(4));
        assert!(matches!(
            handler().amend(&confirmed(), &extraction, today(), 7),
            AmendmentOutcome::Unchanged
        ));
    }
}
