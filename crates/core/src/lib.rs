//! Core types for the booking agent
//!
//! This crate provides the foundational types used by the other crates:
//! - Booking draft model and slot names
//! - Structured extraction results and the extraction port
//! - Response directives
//! - Informational topics and their answer payloads
//! - Error types

pub mod booking;
pub mod directive;
pub mod error;
pub mod extraction;
pub mod info;
pub mod traits;

pub use booking::{
    BookingDraft, BookingRef, ConversationId, DraftSnapshot, DraftStatus, Equipment,
    EquipmentKind, RiceOrder, SlotName, SummaryHash,
};
pub use directive::{BookingOption, RejectionReason, ResponseDirective};
pub use error::{ExtractionError, SessionError};
pub use extraction::{
    CancellationTarget, ConfirmationPolarity, DateCandidate, EquipmentRequest,
    ExtractionContext, ExtractionResult, PartySizeCandidate, RiceCandidate, TimeCandidate,
};
pub use info::{
    DayHours, InformationalData, InformationalTopic, PriceEntry, RiceOption, ServiceWindow,
};
pub use traits::EntityExtractor;
