//! Interruption Router
//!
//! Answers pure informational questions from the policy store. A question
//! mixed with booking content is not routed: one directive per turn, and the
//! booking content wins.

use booking_agent_config::PolicyStore;
use booking_agent_core::{ExtractionResult, InformationalTopic, ResponseDirective, SlotName};
use std::sync::Arc;

pub struct InterruptionRouter {
    store: Arc<PolicyStore>,
}

impl InterruptionRouter {
    pub fn new(store: Arc<PolicyStore>) -> Self {
        Self { store }
    }

    /// Answer if the utterance is a pure informational query
    ///
    /// `awaiting` is the slot the outstanding question asks for; a menu
    /// question while rice is awaited gets the rice listing.
    pub fn route(&self, extraction: &ExtractionResult, awaiting: Option<SlotName>) -> Option<ResponseDirective> {
        let topic = extraction.informational_topic?;
        if extraction.has_booking_content() {
            tracing::debug!(topic = %topic, "Informational topic mixed with booking content, not routed");
            return None;
        }

        let topic = match topic {
            InformationalTopic::Menu if awaiting == Some(SlotName::RiceType) => InformationalTopic::RiceMenu,
            other => other,
        };

        tracing::debug!(topic = %topic, "Answering informational query");
        Some(ResponseDirective::InformationalAnswer {
            topic,
            data: self.store.answer(topic),
        })
    }
}
