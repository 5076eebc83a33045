//! Missing-Slot Resolver
//!
//! Picks the next fact to ask for, in fixed precedence:
//! `date → party_size → time → rice decision → servings → summary`.

use booking_agent_core::{BookingDraft, SlotName};

/// What the draft needs next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Ask(SlotName),
    ReadyForSummary,
}

/// Stateless precedence walk over a draft
pub struct MissingSlotResolver;

impl MissingSlotResolver {
    pub fn next(draft: &BookingDraft) -> Resolution {
        Self::missing(draft)
            .first()
            .map(|slot| Resolution::Ask(*slot))
            .unwrap_or(Resolution::ReadyForSummary)
    }

    /// Every missing mandatory slot, in asking order
    pub fn missing(draft: &BookingDraft) -> Vec<SlotName> {
        SlotName::PRECEDENCE
            .iter()
            .copied()
            .filter(|slot| match slot {
                SlotName::Date => draft.date.is_none(),
                SlotName::PartySize => draft.party_size.is_none(),
                SlotName::Time => draft.time.is_none(),
                SlotName::RiceType => !draft.rice_declined && draft.rice_orders.is_empty(),
                SlotName::Servings => draft.rice_orders.iter().any(|o| o.servings.is_none()),
                _ => false,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_agent_core::RiceOrder;
    use chrono::{NaiveDate, NaiveTime};
    use proptest::prelude::*;

    #[test]
    fn test_empty_draft_asks_date() {
        assert_eq!(MissingSlotResolver::next(&BookingDraft::new()), Resolution::Ask(SlotName::Date));
    }

    #[test]
    fn test_declined_rice_skips_servings() {
        let draft = BookingDraft {
            date: NaiveDate::from_ymd_opt(2026, 10, 17),
            party_size: Some(4),
            time: NaiveTime::from_hms_opt(14, 0, 0),
            rice_declined: true,
            ..Default::default()
        };
        assert_eq!(MissingSlotResolver::next(&draft), Resolution::ReadyForSummary);
    }

    #[test]
    fn test_rice_without_servings() {
        let draft = BookingDraft {
            date: NaiveDate::from_ymd_opt(2026, 10, 17),
            party_size: Some(4),
            time: NaiveTime::from_hms_opt(14, 0, 0),
            rice_orders: vec![RiceOrder::new("arroz_negro", None)],
            ..Default::default()
        };
        assert_eq!(MissingSlotResolver::next(&draft), Resolution::Ask(SlotName::Servings));
    }

    /// 0 = undecided, 1 = declined, 2 = dish without servings, 3 = dish with servings
    fn draft_from(date: bool, party: bool, time: bool, rice: u8) -> BookingDraft {
        BookingDraft {
            date: date.then(|| NaiveDate::from_ymd_opt(2026, 10, 17)).flatten(),
            party_size: party.then_some(4),
            time: time.then(|| NaiveTime::from_hms_opt(14, 0, 0)).flatten(),
            rice_declined: rice == 1,
            rice_orders: match rice {
                2 => vec![RiceOrder::new("arroz_negro", None)],
                3 => vec![RiceOrder::new("arroz_negro", Some(3))],
                _ => Vec::new(),
            },
            ..Default::default()
        }
    }

    proptest! {
        #[test]
        fn test_asks_first_missing_in_precedence(
            date in any::<bool>(),
            party in any::<bool>(),
            time in any::<bool>(),
            rice in 0u8..4,
        ) {
            let draft = draft_from(date, party, time, rice);
            let expected = if !date {
                Resolution::Ask(SlotName::Date)
            } else if !party {
                Resolution::Ask(SlotName::PartySize)
            } else if !time {
                Resolution::Ask(SlotName::Time)
            } else if rice == 0 {
                Resolution::Ask(SlotName::RiceType)
            } else if rice == 2 {
                Resolution::Ask(SlotName::Servings)
            } else {
                Resolution::ReadyForSummary
            };
            prop_assert_eq!(MissingSlotResolver::next(&draft), expected);

            // Never asks for a fact that is present
            if let Resolution::Ask(slot) = MissingSlotResolver::next(&draft) {
                prop_assert!(!draft.has_slot(slot));
            }
            prop_assert_eq!(
                MissingSlotResolver::next(&draft) == Resolution::ReadyForSummary,
                draft.is_complete()
            );
        }
    }
}
