//! Shared fixtures for conversation tests

#![allow(dead_code)]

use async_trait::async_trait;
use booking_agent_config::PolicyStore;
use booking_agent_core::{
    ConversationId, EntityExtractor, ExtractionContext, ExtractionError, ExtractionResult,
};
use booking_agent_dialogue::{DialogueConfig, DialogueOrchestrator};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

type Scripted = Result<ExtractionResult, ExtractionError>;

/// Extractor replaying queued results per conversation
///
/// The utterance text is ignored; each call pops the next result queued for
/// the calling conversation. An empty queue yields an empty extraction.
#[derive(Default)]
pub struct ScriptedExtractor {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    seen: Mutex<Vec<(String, ExtractionContext)>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, conversation: &ConversationId, result: ExtractionResult) {
        self.push_result(conversation, Ok(result));
    }

    pub fn push_result(&self, conversation: &ConversationId, result: Scripted) {
        self.scripts
            .lock()
            .entry(conversation.as_str().to_string())
            .or_default()
            .push_back(result);
    }

    /// Utterances and contexts received so far
    pub fn seen(&self) -> Vec<(String, ExtractionContext)> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl EntityExtractor for ScriptedExtractor {
    async fn extract(&self, utterance: &str, context: &ExtractionContext) -> Result<ExtractionResult, ExtractionError> {
        self.seen.lock().push((utterance.to_string(), context.clone()));
        self.scripts
            .lock()
            .get_mut(context.conversation_id.as_str())
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Ok(ExtractionResult::default()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct Harness {
    pub extractor: Arc<ScriptedExtractor>,
    pub orchestrator: Arc<DialogueOrchestrator>,
}

impl Harness {
    pub fn new() -> Self {
        let extractor = Arc::new(ScriptedExtractor::new());
        let store = Arc::new(PolicyStore::builtin().unwrap());
        let orchestrator = Arc::new(DialogueOrchestrator::new(
            extractor.clone(),
            store,
            DialogueConfig::default(),
        ));
        Self { extractor, orchestrator }
    }
}

/// Wednesday 14 October 2026, 10:00
pub fn now() -> NaiveDateTime {
    today().and_hms_opt(10, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}
