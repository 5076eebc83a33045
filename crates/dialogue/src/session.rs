//! Conversation sessions
//!
//! A session owns every booking of one conversation: at most one open draft
//! plus any number of confirmed or cancelled bookings. Sessions are plain
//! serde values so callers can persist them between turns.
//!
//! The registry hands out one async mutex per conversation. The orchestrator
//! holds it for the whole turn, extraction call included, which keeps turns
//! of one conversation strictly sequential while different conversations run
//! in parallel.

use booking_agent_core::{
    BookingDraft, BookingRef, CancellationTarget, ConversationId, DraftStatus, ExtractionContext,
    ResponseDirective, SlotName,
};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::calendar::{resolve_date, DateResolution};
use crate::merge::StateChange;

/// State of one conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub conversation_id: ConversationId,
    /// Every booking of the conversation, oldest first
    pub drafts: Vec<BookingDraft>,
    /// Index of the booking the conversation is about
    pub focus: Option<usize>,
    /// Bookings offered by an open cancellation disambiguation
    #[serde(default)]
    pub pending_choice: Option<Vec<BookingRef>>,
    /// Last question asked, re-presented when a turn cannot be understood
    #[serde(default)]
    pub outstanding: Option<ResponseDirective>,
    #[serde(default)]
    pub history: Vec<StateChange>,
    #[serde(default)]
    pub turn_count: usize,
}

impl ConversationSession {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            drafts: Vec::new(),
            focus: None,
            pending_choice: None,
            outstanding: None,
            history: Vec::new(),
            turn_count: 0,
        }
    }

    pub fn focused(&self) -> Option<&BookingDraft> {
        self.focus.and_then(|i| self.drafts.get(i))
    }

    pub fn focused_mut(&mut self) -> Option<&mut BookingDraft> {
        self.focus.and_then(move |i| self.drafts.get_mut(i))
    }

    pub fn focused_status(&self) -> Option<DraftStatus> {
        self.focused().map(|d| d.status)
    }

    /// The draft still being negotiated, if any
    pub fn open_draft_index(&self) -> Option<usize> {
        self.drafts.iter().position(|d| d.status.is_open())
    }

    /// Focus the open draft, creating one if none exists
    pub fn start_draft(&mut self) -> usize {
        let index = match self.open_draft_index() {
            Some(index) => index,
            None => {
                self.drafts.push(BookingDraft::new());
                self.drafts.len() - 1
            },
        };
        self.focus = Some(index);
        index
    }

    /// Replace the focused draft with its next version
    pub fn replace_focused(&mut self, draft: BookingDraft) {
        if let Some(slot) = self.focused_mut() {
            *slot = draft;
        }
    }

    /// Destroy the focused draft
    pub fn discard_focused(&mut self) -> Option<BookingDraft> {
        let index = self.focus.take()?;
        if index >= self.drafts.len() {
            return None;
        }
        let removed = self.drafts.remove(index);
        self.refocus();
        Some(removed)
    }

    /// Move focus to the open draft, if one exists
    pub fn refocus(&mut self) {
        if let Some(index) = self.open_draft_index() {
            self.focus = Some(index);
        }
    }

    /// Slot the outstanding question asks for
    pub fn awaiting(&self) -> Option<SlotName> {
        self.outstanding.as_ref().and_then(|d| d.awaited_slot())
    }

    pub fn index_of(&self, reference: &BookingRef) -> Option<usize> {
        self.drafts.iter().position(|d| d.reference.as_ref() == Some(reference))
    }

    /// Bookings that can still be cancelled, optionally narrowed by a target
    pub fn cancellable(&self, target: Option<&CancellationTarget>, today: NaiveDate) -> Vec<usize> {
        self.drafts
            .iter()
            .enumerate()
            .filter(|(_, d)| {
                d.reference.is_some()
                    && !matches!(d.status, DraftStatus::Cancelled | DraftStatus::PendingCancellation)
            })
            .filter(|(_, d)| match target {
                None => true,
                Some(CancellationTarget::Reference { reference }) => {
                    d.reference.as_ref().is_some_and(|r| r.matches(reference))
                },
                Some(CancellationTarget::Date { date }) => {
                    // Confirmed content counts, not an unconfirmed amendment
                    let booked = d.confirmed.as_ref().and_then(|c| c.date).or(d.date);
                    match resolve_date(date, today) {
                        DateResolution::Resolved(day) => booked == Some(day),
                        DateResolution::Ambiguous(days) => booked.is_some_and(|b| days.contains(&b)),
                        DateResolution::Invalid => true,
                    }
                },
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Append slot changes, keeping at most `limit` entries
    pub fn record(&mut self, changes: Vec<StateChange>, limit: usize) {
        self.history.extend(changes);
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }

    /// Context handed to the extraction port
    pub fn extraction_context(&self, reference_time: NaiveDateTime) -> ExtractionContext {
        ExtractionContext {
            conversation_id: self.conversation_id.clone(),
            draft: self.focused().map(|d| d.snapshot()),
            status: self.focused_status(),
            awaiting: self.awaiting(),
            reference_time,
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// In-memory session registry
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ConversationId, Arc<Mutex<ConversationSession>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a session, creating an empty one on first contact
    pub fn get_or_create(&self, id: &ConversationId) -> Arc<Mutex<ConversationSession>> {
        if let Some(session) = self.sessions.read().get(id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write();
        sessions
            .entry(id.clone())
            .or_insert_with(|| {
                tracing::debug!(conversation = %id, "Created session");
                Arc::new(Mutex::new(ConversationSession::new(id.clone())))
            })
            .clone()
    }

    pub fn get(&self, id: &ConversationId) -> Option<Arc<Mutex<ConversationSession>>> {
        self.sessions.read().get(id).cloned()
    }

    /// Insert or replace a session
    pub fn insert(&self, session: ConversationSession) {
        let id = session.conversation_id.clone();
        self.sessions.write().insert(id, Arc::new(Mutex::new(session)));
    }

    pub fn remove(&self, id: &ConversationId) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!(conversation = %id, "Removed session");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn list(&self) -> Vec<ConversationId> {
        self.sessions.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_agent_core::DateCandidate;
    use chrono::NaiveTime;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn confirmed(reference: &str, day: u32) -> BookingDraft {
        let mut draft = BookingDraft {
            date: NaiveDate::from_ymd_opt(2026, 10, day),
            party_size: Some(2),
            time: NaiveTime::from_hms_opt(14, 0, 0),
            rice_declined: true,
            reference: Some(BookingRef::new(reference)),
            status: DraftStatus::Confirmed,
            ..Default::default()
        };
        draft.confirmed = Some(draft.snapshot());
        draft
    }

    #[test]
    fn test_single_open_draft() {
        let mut session = ConversationSession::new("conv".into());
        let first = session.start_draft();
        let second = session.start_draft();
        assert_eq!(first, second);
        assert_eq!(session.drafts.len(), 1);
    }

    #[test]
    fn test_discard_refocuses() {
        let mut session = ConversationSession::new("conv".into());
        session.drafts.push(confirmed("RES-AAAA0001", 17));
        session.start_draft();
        assert_eq!(session.focus, Some(1));

        session.discard_focused();
        assert_eq!(session.drafts.len(), 1);
        assert_eq!(session.focus, None);
    }

    #[test]
    fn test_cancellable_filters() {
        let mut session = ConversationSession::new("conv".into());
        session.drafts.push(confirmed("RES-AAAA0001", 17));
        session.drafts.push(confirmed("RES-BBBB0002", 18));
        session.start_draft();

        assert_eq!(session.cancellable(None, today()), vec![0, 1]);

        let by_ref = CancellationTarget::Reference {
            reference: "res-bbbb0002".to_string(),
        };
        assert_eq!(session.cancellable(Some(&by_ref), today()), vec![1]);

        let by_date = CancellationTarget::Date {
            date: DateCandidate::Absolute {
                date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
            },
        };
        assert_eq!(session.cancellable(Some(&by_date), today()), vec![0]);

        session.drafts[0].status = DraftStatus::Cancelled;
        assert_eq!(session.cancellable(None, today()), vec![1]);
    }

    #[test]
    fn test_history_bounded() {
        let mut session = ConversationSession::new("conv".into());
        let change = |turn| StateChange {
            timestamp: chrono::Utc::now(),
            slot: SlotName::Date,
            old_value: None,
            new_value: Some("2026-10-17".to_string()),
            source: crate::merge::ChangeSource::UserUtterance,
            turn_index: turn,
        };
        session.record((0..5).map(change).collect(), 3);
        assert_eq!(session.history.len(), 3);
        assert_eq!(session.history[0].turn_index, 2);
    }

    #[test]
    fn test_registry() {
        let registry = SessionRegistry::new();
        let id = ConversationId::new("+34600000000");

        let a = registry.get_or_create(&id);
        let b = registry.get_or_create(&id);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.count(), 1);

        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.get(&id).is_none());
    }

    #[test]
    fn test_session_serde() {
        let mut session = ConversationSession::new("conv".into());
        session.drafts.push(confirmed("RES-AAAA0001", 17));
        session.focus = Some(0);
        session.outstanding = Some(ResponseDirective::ask(SlotName::Time));

        let json = serde_json::to_string(&session).unwrap();
        let restored: ConversationSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.drafts, session.drafts);
        assert_eq!(restored.awaiting(), Some(SlotName::Time));
    }
}
