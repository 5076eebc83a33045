//! Slot Merge Engine
//!
//! Folds one extraction result into a booking draft and returns the next
//! draft version. The engine never fails: candidates that break a business
//! rule are reported as rejections and left out of the draft, malformed
//! candidates are ignored.
//!
//! ```text
//! ExtractionResult ──► party ─► date ─► time ─► rice ─► servings ─► equipment
//!                        │        │       │       │         │           │
//!                        └────────┴───────┴───┬───┴─────────┴───────────┘
//!                                             ▼
//!                  MergeOutcome { draft, changed, rejections, date_ambiguity, changes }
//! ```
//!
//! Date is merged before time so a time is always checked against the day
//! it will be served on.

use booking_agent_config::{weekday_label, PolicyStore};
use booking_agent_core::{
    BookingDraft, DateCandidate, EquipmentKind, ExtractionResult, PartySizeCandidate,
    RejectionReason, RiceCandidate, RiceOrder, SlotName,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::calendar::{resolve_date, resolve_time, DateResolution};
use crate::rice::{RiceMatch, RiceValidator};

// =============================================================================
// Change log
// =============================================================================

/// Source of a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    /// First value extracted from a user utterance
    UserUtterance,
    /// A later value replacing an earlier one
    Correction,
    /// Change to a confirmed booking
    Amendment,
    /// Cleared after the user rejected it or the engine invalidated it
    System,
}

/// Record of a state change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChange {
    pub timestamp: DateTime<Utc>,
    pub slot: SlotName,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub source: ChangeSource,
    pub turn_index: usize,
}

// =============================================================================
// Merge outcome
// =============================================================================

/// A candidate value refused by a catalog or business rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub slot: SlotName,
    pub reason: RejectionReason,
    pub valid_options: Vec<String>,
}

impl Rejection {
    fn new(slot: SlotName, reason: RejectionReason, valid_options: Vec<String>) -> Self {
        Self {
            slot,
            reason,
            valid_options,
        }
    }
}

/// Result of folding one extraction into a draft
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Next draft version
    pub draft: BookingDraft,
    /// Booking content differs from the input draft
    pub changed: bool,
    /// A mandatory slot (date, party, time, rice, servings) changed
    pub mandatory_changed: bool,
    /// Refused candidates, in slot precedence order
    pub rejections: Vec<Rejection>,
    /// Possible dates for an ambiguous date expression
    pub date_ambiguity: Option<Vec<NaiveDate>>,
    pub changes: Vec<StateChange>,
}

impl MergeOutcome {
    pub fn first_rejection(&self) -> Option<&Rejection> {
        self.rejections.first()
    }
}

// =============================================================================
// SlotMergeEngine
// =============================================================================

/// Folds extraction results into drafts under the restaurant's rules
pub struct SlotMergeEngine {
    store: Arc<PolicyStore>,
    rice: RiceValidator,
}

impl SlotMergeEngine {
    pub fn new(store: Arc<PolicyStore>) -> Self {
        let rice = RiceValidator::new(&store.rice_catalog);
        Self { store, rice }
    }

    pub fn rice_validator(&self) -> &RiceValidator {
        &self.rice
    }

    /// Merge an extraction into `current`
    ///
    /// `source` is recorded on every change; `UserUtterance` is upgraded to
    /// `Correction` when a slot already held a value.
    pub fn merge(
        &self,
        current: &BookingDraft,
        extraction: &ExtractionResult,
        today: NaiveDate,
        turn_index: usize,
        source: ChangeSource,
    ) -> MergeOutcome {
        let mut draft = current.clone();
        let mut rejections = Vec::new();
        let mut date_ambiguity = None;

        if let Some(party) = &extraction.party_size {
            self.merge_party(&mut draft, party, &mut rejections);
        }

        let date_before = draft.date;
        if let Some(candidate) = &extraction.date {
            date_ambiguity = self.merge_date(&mut draft, candidate, today, &mut rejections);
        }

        if let Some(candidate) = &extraction.time {
            match resolve_time(candidate) {
                Some(time) => match self.time_rejection(draft.date, time) {
                    Some(rejection) => rejections.push(rejection),
                    None => draft.time = Some(time),
                },
                None => {
                    tracing::debug!(hour = candidate.hour, minute = candidate.minute, "Ignoring malformed time");
                },
            }
        }

        // A new day can invalidate a time accepted earlier
        if draft.date != date_before {
            if let Some(time) = draft.time {
                if let Some(rejection) = self.time_rejection(draft.date, time) {
                    draft.time = None;
                    if !rejections.iter().any(|r| r.slot == SlotName::Time) {
                        rejections.push(rejection);
                    }
                }
            }
        }

        if !extraction.rice.is_empty() {
            self.merge_rice(&mut draft, &extraction.rice, &mut rejections);
        } else if extraction.rice_declined && (!draft.rice_declined || !draft.rice_orders.is_empty()) {
            draft.rice_orders.clear();
            draft.rice_declined = true;
        }

        if let Some(servings) = extraction.servings {
            self.merge_servings(&mut draft, servings, &mut rejections);
        }

        for request in &extraction.equipment {
            self.merge_equipment(&mut draft, request.kind, request.count, request.restatement, &mut rejections);
        }

        rejections.sort_by_key(|r| r.slot.precedence());

        let changes = diff(current, &draft, turn_index, source);
        let changed = draft.snapshot() != current.snapshot();
        let mandatory_changed = changes.iter().any(|c| c.slot.is_mandatory());
        if changed {
            draft.version = current.version + 1;
        }

        for change in &changes {
            tracing::debug!(
                slot = change.slot.as_str(),
                old_value = ?change.old_value,
                new_value = ?change.new_value,
                source = ?change.source,
                "Slot updated"
            );
        }
        for rejection in &rejections {
            tracing::debug!(
                slot = rejection.slot.as_str(),
                reason = ?rejection.reason,
                "Candidate rejected"
            );
        }

        MergeOutcome {
            draft,
            changed,
            mandatory_changed,
            rejections,
            date_ambiguity,
            changes,
        }
    }

    fn merge_party(&self, draft: &mut BookingDraft, party: &PartySizeCandidate, rejections: &mut Vec<Rejection>) {
        let Some(stated) = party.sum() else {
            tracing::debug!(groups = ?party.groups, "Ignoring party size that overflows");
            return;
        };
        if stated == 0 {
            return;
        }

        // A saturated total is still over any limit
        let total = if party.additive {
            draft.party_size.unwrap_or(0).saturating_add(stated)
        } else {
            stated
        };

        let limit = self.store.restaurant.group.max_party_size_online;
        if total > limit {
            rejections.push(Rejection::new(
                SlotName::PartySize,
                RejectionReason::LargeGroup,
                vec![self.store.restaurant.phone.clone()],
            ));
            return;
        }

        draft.party_size = Some(total);
    }

    fn merge_date(
        &self,
        draft: &mut BookingDraft,
        candidate: &DateCandidate,
        today: NaiveDate,
        rejections: &mut Vec<Rejection>,
    ) -> Option<Vec<NaiveDate>> {
        match resolve_date(candidate, today) {
            DateResolution::Resolved(date) => {
                match self.date_rejection(date, today) {
                    Some(rejection) => rejections.push(rejection),
                    None => draft.date = Some(date),
                }
                None
            },
            DateResolution::Ambiguous(dates) => {
                if dates.is_empty() {
                    return Some(dates);
                }
                let bookable: Vec<NaiveDate> = dates
                    .into_iter()
                    .filter(|d| self.date_rejection(*d, today).is_none())
                    .collect();
                if bookable.is_empty() {
                    rejections.push(self.closed_day_rejection());
                    return None;
                }
                Some(bookable)
            },
            DateResolution::Invalid => {
                tracing::debug!(candidate = ?candidate, "Ignoring impossible date");
                None
            },
        }
    }

    fn date_rejection(&self, date: NaiveDate, today: NaiveDate) -> Option<Rejection> {
        if date < today {
            return Some(Rejection::new(SlotName::Date, RejectionReason::PastDate, Vec::new()));
        }
        if !self.store.restaurant.is_open_on(date.weekday()) {
            return Some(self.closed_day_rejection());
        }
        None
    }

    fn closed_day_rejection(&self) -> Rejection {
        let open_days = self
            .store
            .restaurant
            .open_weekdays()
            .into_iter()
            .map(|d| weekday_label(d).to_string())
            .collect();
        Rejection::new(SlotName::Date, RejectionReason::ClosedDay, open_days)
    }

    /// Check a time against the day's windows, or any window when the day is unknown
    fn time_rejection(&self, date: Option<NaiveDate>, time: chrono::NaiveTime) -> Option<Rejection> {
        let restaurant = &self.store.restaurant;
        let windows = match date {
            Some(date) => restaurant.windows_for(date.weekday()).to_vec(),
            None => restaurant.all_windows(),
        };

        if windows.iter().any(|w| w.contains(time)) {
            return None;
        }

        Some(Rejection::new(
            SlotName::Time,
            RejectionReason::OutsideOpeningHours,
            windows.iter().map(|w| w.to_string()).collect(),
        ))
    }

    fn merge_rice(&self, draft: &mut BookingDraft, candidates: &[RiceCandidate], rejections: &mut Vec<Rejection>) {
        let mut matched: Vec<(String, Option<u32>)> = Vec::new();

        for candidate in candidates {
            match self.rice.validate(&candidate.name) {
                RiceMatch::Matched(key) => {
                    match matched.iter_mut().find(|(k, _)| *k == key) {
                        Some(entry) => entry.1 = candidate.servings.or(entry.1),
                        None => matched.push((key, candidate.servings)),
                    }
                },
                RiceMatch::Ambiguous(options) => {
                    rejections.push(Rejection::new(SlotName::RiceType, RejectionReason::AmbiguousMatch, options));
                    return;
                },
                RiceMatch::Rejected(options) => {
                    rejections.push(Rejection::new(SlotName::RiceType, RejectionReason::NotInCatalog, options));
                    return;
                },
            }
        }

        let rules = &self.store.restaurant.rice_rules;
        if matched.len() > rules.max_rice_types {
            let options = matched
                .iter()
                .map(|(key, _)| self.rice.display_name(key).to_string())
                .collect();
            rejections.push(Rejection::new(SlotName::RiceType, RejectionReason::TooManyRiceTypes, options));
            return;
        }

        let mut orders = Vec::with_capacity(matched.len());
        for (key, servings) in matched {
            // Restating a dish keeps the servings already given for it
            let known = draft
                .rice_orders
                .iter()
                .find(|o| o.rice_type == key)
                .and_then(|o| o.servings);

            let servings = match servings {
                Some(s) if s < rules.min_servings => {
                    rejections.push(self.servings_rejection());
                    None
                },
                Some(s) => Some(s),
                None => known,
            };
            orders.push(RiceOrder::new(key, servings));
        }

        draft.rice_orders = orders;
        draft.rice_declined = false;
    }

    /// Servings stated without a dish go to the order still missing them
    fn merge_servings(&self, draft: &mut BookingDraft, servings: u32, rejections: &mut Vec<Rejection>) {
        let target = match draft.rice_orders.iter().position(|o| o.servings.is_none()) {
            Some(index) => index,
            None if draft.rice_orders.len() == 1 => 0,
            None => return,
        };

        if servings < self.store.restaurant.rice_rules.min_servings {
            rejections.push(self.servings_rejection());
            return;
        }

        draft.rice_orders[target].servings = Some(servings);
    }

    fn servings_rejection(&self) -> Rejection {
        Rejection::new(
            SlotName::Servings,
            RejectionReason::BelowMinimumServings,
            vec![self.store.restaurant.rice_rules.min_servings.to_string()],
        )
    }

    fn merge_equipment(
        &self,
        draft: &mut BookingDraft,
        kind: EquipmentKind,
        count: u32,
        restatement: bool,
        rejections: &mut Vec<Rejection>,
    ) {
        if count == 0 && !restatement {
            return;
        }

        let policy = &self.store.restaurant.equipment;
        let (available, max) = match kind {
            EquipmentKind::HighChair => (policy.high_chairs_available, policy.max_high_chairs),
            EquipmentKind::Stroller => (policy.strollers_allowed, policy.max_strollers),
        };

        let total = if restatement {
            count
        } else {
            draft.equipment.count(kind).saturating_add(count)
        };

        if total > 0 && !available {
            rejections.push(Rejection::new(kind.slot(), RejectionReason::EquipmentUnavailable, Vec::new()));
            return;
        }

        if total > max {
            rejections.push(Rejection::new(kind.slot(), RejectionReason::EquipmentLimit, vec![max.to_string()]));
            return;
        }

        draft.equipment.set(kind, total);
    }
}

// =============================================================================
// Diff
// =============================================================================

pub(crate) fn diff(before: &BookingDraft, after: &BookingDraft, turn_index: usize, source: ChangeSource) -> Vec<StateChange> {
    let mut changes = Vec::new();
    let mut push = |slot: SlotName, old: Option<String>, new: Option<String>| {
        if old != new {
            let source = match source {
                ChangeSource::UserUtterance if old.is_some() => ChangeSource::Correction,
                other => other,
            };
            changes.push(StateChange {
                timestamp: Utc::now(),
                slot,
                old_value: old,
                new_value: new,
                source,
                turn_index,
            });
        }
    };

    push(SlotName::Date, before.date.map(|d| d.to_string()), after.date.map(|d| d.to_string()));
    push(
        SlotName::PartySize,
        before.party_size.map(|p| p.to_string()),
        after.party_size.map(|p| p.to_string()),
    );
    push(
        SlotName::Time,
        before.time.map(|t| t.format("%H:%M").to_string()),
        after.time.map(|t| t.format("%H:%M").to_string()),
    );
    push(SlotName::RiceType, describe_rice(before), describe_rice(after));
    push(SlotName::Servings, describe_servings(before), describe_servings(after));
    push(
        SlotName::HighChairs,
        nonzero(before.equipment.high_chairs),
        nonzero(after.equipment.high_chairs),
    );
    push(SlotName::Strollers, nonzero(before.equipment.strollers), nonzero(after.equipment.strollers));

    changes
}

fn describe_rice(draft: &BookingDraft) -> Option<String> {
    if draft.rice_declined {
        return Some("none".to_string());
    }
    if draft.rice_orders.is_empty() {
        return None;
    }
    Some(
        draft
            .rice_orders
            .iter()
            .map(|o| o.rice_type.as_str())
            .collect::<Vec<_>>()
            .join(","),
    )
}

fn describe_servings(draft: &BookingDraft) -> Option<String> {
    let servings: Vec<String> = draft
        .rice_orders
        .iter()
        .filter_map(|o| o.servings.map(|s| s.to_string()))
        .collect();
    if servings.is_empty() {
        None
    } else {
        Some(servings.join(","))
    }
}

fn nonzero(count: u32) -> Option<String> {
    (count > 0).then(|| count.to_string())
}
