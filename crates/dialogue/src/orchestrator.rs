//! Dialogue Orchestrator
//!
//! Runs one turn: extraction, then routing on the focused booking's status.
//!
//! ```text
//! utterance
//!     │
//!     ▼
//! EntityExtractor ──(error)──► re-present outstanding question
//!     │
//!     ▼
//! InterruptionRouter ──(pure question)──► InformationalAnswer
//!     │
//!     ▼
//! pending booking choice? ──► cancellation target resolution
//!     │
//!     ▼
//! focused status
//!   none / cancelled      ──► start draft or cancellation
//!   collecting / pending  ──► merge ─► gate ─► resolver
//!   confirmed             ──► amendment or cancellation
//!   pending cancellation  ──► cancellation gate
//! ```
//!
//! Every turn yields exactly one directive. Failures never escape as
//! errors; they are reported as [`TurnNotice`]s on the [`TurnOutcome`].

use booking_agent_config::{PolicyStore, Settings};
use booking_agent_core::{
    BookingDraft, BookingOption, BookingRef, CancellationTarget, ConfirmationPolarity, ConversationId,
    DraftSnapshot, DraftStatus, EntityExtractor, ExtractionResult, ResponseDirective, SessionError,
    SlotName,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::amendment::{AmendmentOutcome, ModificationHandler};
use crate::confirmation::{CancellationDecision, ConfirmationGate, GateDecision};
use crate::interruption::InterruptionRouter;
use crate::merge::{diff, ChangeSource, SlotMergeEngine};
use crate::notice::TurnNotice;
use crate::resolver::{MissingSlotResolver, Resolution};
use crate::session::{ConversationSession, SessionRegistry};

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct DialogueConfig {
    /// Slot change entries kept per conversation
    pub history_limit: usize,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self { history_limit: 200 }
    }
}

impl DialogueConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            history_limit: settings.sessions.history_limit,
        }
    }
}

/// Everything a turn produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub directive: ResponseDirective,
    /// The booking the conversation is focused on after the turn
    pub draft: Option<DraftSnapshot>,
    pub status: Option<DraftStatus>,
    pub notices: Vec<TurnNotice>,
    pub turn_index: usize,
}

/// Drives booking conversations
pub struct DialogueOrchestrator {
    extractor: Arc<dyn EntityExtractor>,
    store: Arc<PolicyStore>,
    merge: Arc<SlotMergeEngine>,
    router: InterruptionRouter,
    amendments: ModificationHandler,
    sessions: SessionRegistry,
    config: DialogueConfig,
}

impl DialogueOrchestrator {
    pub fn new(extractor: Arc<dyn EntityExtractor>, store: Arc<PolicyStore>, config: DialogueConfig) -> Self {
        let merge = Arc::new(SlotMergeEngine::new(store.clone()));
        Self {
            extractor,
            router: InterruptionRouter::new(store.clone()),
            amendments: ModificationHandler::new(merge.clone()),
            merge,
            store,
            sessions: SessionRegistry::new(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Process one utterance and return the directive for the reply
    pub async fn process_turn(
        &self,
        conversation_id: &ConversationId,
        utterance: &str,
        reference_time: NaiveDateTime,
    ) -> ResponseDirective {
        self.handle_turn(conversation_id, utterance, reference_time)
            .await
            .directive
    }

    /// Process one utterance and return the full turn outcome
    ///
    /// The conversation's session stays locked for the whole turn, so turns
    /// of one conversation never interleave.
    pub async fn handle_turn(
        &self,
        conversation_id: &ConversationId,
        utterance: &str,
        reference_time: NaiveDateTime,
    ) -> TurnOutcome {
        let handle = self.sessions.get_or_create(conversation_id);
        let mut session = handle.lock().await;
        self.run_turn(&mut session, utterance, reference_time).await
    }

    /// Drop a conversation and everything in it
    pub fn end_conversation(&self, conversation_id: &ConversationId) -> bool {
        self.sessions.remove(conversation_id)
    }

    /// Copy of a conversation's state
    pub async fn session_snapshot(&self, conversation_id: &ConversationId) -> Option<ConversationSession> {
        let handle = self.sessions.get(conversation_id)?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Serialize a conversation to JSON
    pub async fn export_session(&self, conversation_id: &ConversationId) -> Result<String, SessionError> {
        let handle = self
            .sessions
            .get(conversation_id)
            .ok_or_else(|| SessionError::NotFound(conversation_id.to_string()))?;
        let session = handle.lock().await;
        Ok(serde_json::to_string(&*session)?)
    }

    /// Load a conversation exported with [`export_session`](Self::export_session)
    ///
    /// Replaces any live session with the same id.
    pub fn restore_session(&self, json: &str) -> Result<ConversationId, SessionError> {
        let mut session: ConversationSession = serde_json::from_str(json)?;
        if session.focus.is_some_and(|i| i >= session.drafts.len()) {
            tracing::warn!(conversation = %session.conversation_id, "Restored session focus out of range, cleared");
            session.focus = None;
            session.refocus();
        }
        let id = session.conversation_id.clone();
        tracing::info!(conversation = %id, drafts = session.drafts.len(), "Session restored");
        self.sessions.insert(session);
        Ok(id)
    }

    // =========================================================================
    // Turn handling
    // =========================================================================

    async fn run_turn(
        &self,
        session: &mut ConversationSession,
        utterance: &str,
        reference_time: NaiveDateTime,
    ) -> TurnOutcome {
        session.turn_count += 1;
        let turn = session.turn_count;
        let today = reference_time.date();
        let context = session.extraction_context(reference_time);

        let extraction = match self.extractor.extract(utterance, &context).await {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!(
                    conversation = %session.conversation_id,
                    extractor = self.extractor.name(),
                    error = %e,
                    "Extraction failed, draft unchanged"
                );
                let directive = session
                    .outstanding
                    .clone()
                    .unwrap_or(ResponseDirective::Acknowledge);
                let notices = vec![TurnNotice::ExtractionUnavailable { message: e.to_string() }];
                return Self::outcome(session, directive, notices, turn);
            },
        };

        // Informational answers leave the outstanding question in place
        if let Some(answer) = self.router.route(&extraction, session.awaiting()) {
            return Self::outcome(session, answer, Vec::new(), turn);
        }

        let mut notices = Vec::new();
        let directive = self.dispatch(session, &extraction, today, turn, &mut notices);
        session.outstanding = directive.is_question().then(|| directive.clone());

        tracing::debug!(
            conversation = %session.conversation_id,
            turn,
            directive = directive.kind(),
            status = ?session.focused_status(),
            notices = notices.len(),
            "Turn processed"
        );

        Self::outcome(session, directive, notices, turn)
    }

    fn outcome(
        session: &ConversationSession,
        directive: ResponseDirective,
        notices: Vec<TurnNotice>,
        turn_index: usize,
    ) -> TurnOutcome {
        TurnOutcome {
            directive,
            draft: session.focused().map(|d| d.snapshot()),
            status: session.focused_status(),
            notices,
            turn_index,
        }
    }

    fn dispatch(
        &self,
        session: &mut ConversationSession,
        extraction: &ExtractionResult,
        today: NaiveDate,
        turn: usize,
        notices: &mut Vec<TurnNotice>,
    ) -> ResponseDirective {
        if session.pending_choice.is_some() {
            if let Some(directive) = self.resolve_booking_choice(session, extraction, today, notices) {
                return directive;
            }
        }

        match session.focused_status() {
            None | Some(DraftStatus::Cancelled) => self.handle_idle(session, extraction, today, turn, notices),
            Some(DraftStatus::Collecting) | Some(DraftStatus::PendingConfirmation) => {
                self.handle_open(session, extraction, today, turn, notices)
            },
            Some(DraftStatus::Confirmed) => self.handle_confirmed(session, extraction, today, turn, notices),
            Some(DraftStatus::PendingCancellation) => self.handle_pending_cancellation(session, extraction),
        }
    }

    /// Nothing in progress: start a booking or a cancellation
    fn handle_idle(
        &self,
        session: &mut ConversationSession,
        extraction: &ExtractionResult,
        today: NaiveDate,
        turn: usize,
        notices: &mut Vec<TurnNotice>,
    ) -> ResponseDirective {
        if extraction.cancellation_intent || extraction.cancellation_target.is_some() {
            return self.start_cancellation(session, extraction.cancellation_target.as_ref(), today, notices);
        }

        if extraction.booking_intent || extraction.has_slot_candidates() {
            session.start_draft();
            return self.collect(session, extraction, today, turn, notices);
        }

        if extraction.confirmation == ConfirmationPolarity::StrongYes {
            notices.push(TurnNotice::ConfirmationWithoutSummary);
        }
        ResponseDirective::Acknowledge
    }

    /// A draft is being collected or awaits confirmation
    fn handle_open(
        &self,
        session: &mut ConversationSession,
        extraction: &ExtractionResult,
        today: NaiveDate,
        turn: usize,
        notices: &mut Vec<TurnNotice>,
    ) -> ResponseDirective {
        if extraction.cancellation_target.is_some() {
            return self.start_cancellation(session, extraction.cancellation_target.as_ref(), today, notices);
        }

        // An open draft carrying a reference is an unconfirmed amendment
        let amended = session
            .focus
            .filter(|_| session.focused().is_some_and(|d| d.reference.is_some()));

        if extraction.cancellation_intent {
            if let Some(index) = amended {
                return self.begin_cancellation(session, index);
            }

            if let Some(draft) = session.discard_focused() {
                tracing::info!(
                    conversation = %session.conversation_id,
                    version = draft.version,
                    "Draft abandoned"
                );
            }
            return ResponseDirective::DraftAbandoned;
        }

        // A new booking while amending: the booking keeps its confirmed content
        if let (true, Some(index)) = (extraction.booking_intent, amended) {
            if let Some(draft) = session.drafts.get_mut(index) {
                draft.restore_confirmed();
                tracing::info!(
                    conversation = %session.conversation_id,
                    reference = ?draft.reference,
                    "Unconfirmed amendment dropped for a new booking"
                );
            }
            session.start_draft();
        }

        self.collect(session, extraction, today, turn, notices)
    }

    /// Focused booking is confirmed: amend it, cancel it, or start another
    fn handle_confirmed(
        &self,
        session: &mut ConversationSession,
        extraction: &ExtractionResult,
        today: NaiveDate,
        turn: usize,
        notices: &mut Vec<TurnNotice>,
    ) -> ResponseDirective {
        if extraction.cancellation_intent || extraction.cancellation_target.is_some() {
            return self.start_cancellation(session, extraction.cancellation_target.as_ref(), today, notices);
        }

        if extraction.booking_intent {
            session.start_draft();
            return self.collect(session, extraction, today, turn, notices);
        }

        if extraction.has_slot_candidates() {
            return self.amend(session, extraction, today, turn, notices);
        }

        ResponseDirective::Acknowledge
    }

    fn handle_pending_cancellation(
        &self,
        session: &mut ConversationSession,
        extraction: &ExtractionResult,
    ) -> ResponseDirective {
        let decision = ConfirmationGate::evaluate_cancellation(extraction);
        let conversation = session.conversation_id.clone();

        let Some(draft) = session.focused_mut() else {
            return ResponseDirective::Acknowledge;
        };
        let Some(reference) = draft.reference.clone() else {
            return ResponseDirective::Acknowledge;
        };

        let directive = match decision {
            CancellationDecision::Cancel => {
                draft.status = DraftStatus::Cancelled;
                tracing::info!(conversation = %conversation, reference = %reference, "Booking cancelled");
                ResponseDirective::CancelledBooking { reference }
            },
            CancellationDecision::Withdraw => {
                draft.status = DraftStatus::Confirmed;
                tracing::info!(conversation = %conversation, reference = %reference, "Cancellation withdrawn");
                ResponseDirective::CancellationWithdrawn { reference }
            },
            CancellationDecision::Represent => {
                return ResponseDirective::RequestCancellationConfirmation { draft: draft.snapshot() };
            },
        };

        session.refocus();
        directive
    }

    // =========================================================================
    // Collection
    // =========================================================================

    fn collect(
        &self,
        session: &mut ConversationSession,
        extraction: &ExtractionResult,
        today: NaiveDate,
        turn: usize,
        notices: &mut Vec<TurnNotice>,
    ) -> ResponseDirective {
        let Some(current) = session.focused().cloned() else {
            return ResponseDirective::Acknowledge;
        };

        let outcome = self
            .merge
            .merge(&current, extraction, today, turn, ChangeSource::UserUtterance);
        session.record(outcome.changes, self.config.history_limit);

        let decision = ConfirmationGate::evaluate(&current, outcome.changed, extraction);
        let mut draft = outcome.draft;
        if outcome.changed {
            draft.invalidate_summary();
        }

        let directive = if let Some(rejection) = outcome.rejections.into_iter().next() {
            notices.push(TurnNotice::rejection(rejection.slot, rejection.reason));
            draft.invalidate_summary();
            ResponseDirective::reject(rejection.slot, rejection.reason, rejection.valid_options)
        } else if let Some(candidates) = outcome.date_ambiguity {
            notices.push(TurnNotice::AmbiguousDate);
            draft.invalidate_summary();
            Self::date_question(candidates)
        } else {
            match decision {
                GateDecision::NotApplicable => {
                    if extraction.confirmation == ConfirmationPolarity::StrongYes {
                        notices.push(TurnNotice::ConfirmationWithoutSummary);
                    }
                    Self::next_step(&mut draft)
                },
                GateDecision::Changed => Self::next_step(&mut draft),
                GateDecision::Stale => {
                    notices.push(TurnNotice::StaleConfirmation);
                    draft.invalidate_summary();
                    Self::next_step(&mut draft)
                },
                GateDecision::Confirm => Self::confirm(&session.conversation_id, &mut draft),
                GateDecision::Represent => ResponseDirective::PresentSummary { draft: draft.snapshot() },
                GateDecision::Reopen(slot) => {
                    let before = draft.clone();
                    draft.clear_slot(slot);
                    draft.invalidate_summary();
                    if before.has_slot(slot) {
                        draft.version += 1;
                        session.record(
                            diff(&before, &draft, turn, ChangeSource::System),
                            self.config.history_limit,
                        );
                    }
                    Self::next_step(&mut draft)
                },
                GateDecision::Clarify => {
                    draft.invalidate_summary();
                    ResponseDirective::RequestClarification
                },
            }
        };

        session.replace_focused(draft);
        directive
    }

    /// Ask for the next missing fact, or summarize a complete draft
    fn next_step(draft: &mut BookingDraft) -> ResponseDirective {
        match MissingSlotResolver::next(draft) {
            Resolution::Ask(slot) => ResponseDirective::ask(slot),
            Resolution::ReadyForSummary => {
                draft.mark_summarized();
                ResponseDirective::PresentSummary { draft: draft.snapshot() }
            },
        }
    }

    /// Offer the candidate days, or ask again when there is nothing to offer
    fn date_question(candidates: Vec<NaiveDate>) -> ResponseDirective {
        if candidates.is_empty() {
            ResponseDirective::ask(SlotName::Date)
        } else {
            ResponseDirective::DisambiguateDate { candidates }
        }
    }

    fn confirm(conversation: &ConversationId, draft: &mut BookingDraft) -> ResponseDirective {
        let reference = draft.reference.clone().unwrap_or_else(BookingRef::generate);
        draft.reference = Some(reference.clone());
        draft.status = DraftStatus::Confirmed;

        let snapshot = draft.snapshot();
        draft.confirmed = Some(snapshot.clone());

        tracing::info!(
            conversation = %conversation,
            reference = %reference,
            version = draft.version,
            "Booking confirmed"
        );
        ResponseDirective::ConfirmedBooking { draft: snapshot }
    }

    fn amend(
        &self,
        session: &mut ConversationSession,
        extraction: &ExtractionResult,
        today: NaiveDate,
        turn: usize,
        notices: &mut Vec<TurnNotice>,
    ) -> ResponseDirective {
        let Some(current) = session.focused().cloned() else {
            return ResponseDirective::Acknowledge;
        };

        match self.amendments.amend(&current, extraction, today, turn) {
            AmendmentOutcome::Applied { mut draft, changes } => {
                session.record(changes, self.config.history_limit);
                let directive = Self::next_step(&mut draft);
                session.replace_focused(draft);
                directive
            },
            AmendmentOutcome::Rejected(rejection) => {
                notices.push(TurnNotice::rejection(rejection.slot, rejection.reason));
                ResponseDirective::reject(rejection.slot, rejection.reason, rejection.valid_options)
            },
            AmendmentOutcome::AmbiguousDate(candidates) => {
                notices.push(TurnNotice::AmbiguousDate);
                Self::date_question(candidates)
            },
            AmendmentOutcome::Unchanged => ResponseDirective::Acknowledge,
        }
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    fn start_cancellation(
        &self,
        session: &mut ConversationSession,
        target: Option<&CancellationTarget>,
        today: NaiveDate,
        notices: &mut Vec<TurnNotice>,
    ) -> ResponseDirective {
        let candidates = session.cancellable(target, today);
        match candidates.as_slice() {
            [index] => self.begin_cancellation(session, *index),
            [] => {
                let all = session.cancellable(None, today);
                if all.is_empty() {
                    tracing::debug!(conversation = %session.conversation_id, "No booking to cancel");
                    return ResponseDirective::Acknowledge;
                }
                notices.push(TurnNotice::AmbiguousCancellationTarget);
                Self::offer_choice(session, &all)
            },
            _ => {
                notices.push(TurnNotice::AmbiguousCancellationTarget);
                Self::offer_choice(session, &candidates)
            },
        }
    }

    /// Narrow an open booking choice with this turn's target
    ///
    /// Returns `None` when the utterance names no target, which drops the
    /// choice and lets the turn be handled normally.
    fn resolve_booking_choice(
        &self,
        session: &mut ConversationSession,
        extraction: &ExtractionResult,
        today: NaiveDate,
        notices: &mut Vec<TurnNotice>,
    ) -> Option<ResponseDirective> {
        let choices = session.pending_choice.take()?;
        let target = extraction
            .cancellation_target
            .clone()
            .or_else(|| extraction.date.clone().map(|date| CancellationTarget::Date { date }))?;

        let matching: Vec<usize> = session
            .cancellable(Some(&target), today)
            .into_iter()
            .filter(|i| {
                session.drafts[*i]
                    .reference
                    .as_ref()
                    .is_some_and(|r| choices.contains(r))
            })
            .collect();

        let directive = match matching.as_slice() {
            [index] => self.begin_cancellation(session, *index),
            [] => {
                let offered: Vec<usize> = choices.iter().filter_map(|r| session.index_of(r)).collect();
                notices.push(TurnNotice::AmbiguousCancellationTarget);
                Self::offer_choice(session, &offered)
            },
            _ => {
                notices.push(TurnNotice::AmbiguousCancellationTarget);
                Self::offer_choice(session, &matching)
            },
        };
        Some(directive)
    }

    fn offer_choice(session: &mut ConversationSession, indices: &[usize]) -> ResponseDirective {
        let options: Vec<BookingOption> = indices
            .iter()
            .filter_map(|i| session.drafts.get(*i))
            .filter_map(|d| {
                let reference = d.reference.clone()?;
                let snapshot = d.confirmed.clone().unwrap_or_else(|| d.snapshot());
                Some(BookingOption::new(reference, &snapshot))
            })
            .collect();

        session.pending_choice = Some(options.iter().map(|o| o.reference.clone()).collect());
        ResponseDirective::DisambiguateBooking { options }
    }

    fn begin_cancellation(&self, session: &mut ConversationSession, index: usize) -> ResponseDirective {
        session.focus = Some(index);
        let conversation = session.conversation_id.clone();
        let Some(draft) = session.focused_mut() else {
            return ResponseDirective::Acknowledge;
        };

        // An unconfirmed amendment is dropped; the confirmed booking is what gets cancelled
        if draft.status.is_open() {
            draft.restore_confirmed();
        }
        draft.status = DraftStatus::PendingCancellation;

        tracing::info!(
            conversation = %conversation,
            reference = ?draft.reference,
            "Cancellation requested"
        );
        ResponseDirective::RequestCancellationConfirmation { draft: draft.snapshot() }
    }
}
