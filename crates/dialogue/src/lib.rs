//! Slot-filling dialogue engine for restaurant bookings
//!
//! Turns structured extraction results into booking state and one response
//! directive per turn.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    DialogueOrchestrator                      │
//! │                                                              │
//! │  EntityExtractor ─► InterruptionRouter ─► SlotMergeEngine    │
//! │                                             │  (calendar,    │
//! │                                             │   rice, rules) │
//! │                                             ▼                │
//! │  SessionRegistry ◄── ConfirmationGate ◄── MissingSlotResolver│
//! │                      ModificationHandler                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never renders prose: callers turn [`ResponseDirective`]s into
//! language.
//!
//! [`ResponseDirective`]: booking_agent_core::ResponseDirective

pub mod amendment;
pub mod calendar;
pub mod confirmation;
pub mod interruption;
pub mod merge;
pub mod notice;
pub mod orchestrator;
pub mod resolver;
pub mod rice;
pub mod session;

pub use amendment::{AmendmentOutcome, ModificationHandler};
pub use calendar::{resolve_date, resolve_time, DateResolution};
pub use confirmation::{CancellationDecision, ConfirmationGate, GateDecision};
pub use interruption::InterruptionRouter;
pub use merge::{ChangeSource, MergeOutcome, Rejection, SlotMergeEngine, StateChange};
pub use notice::TurnNotice;
pub use orchestrator::{DialogueConfig, DialogueOrchestrator, TurnOutcome};
pub use resolver::{MissingSlotResolver, Resolution};
pub use rice::{normalize, RiceMatch, RiceValidator};
pub use session::{ConversationSession, SessionRegistry};
