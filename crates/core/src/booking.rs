//! Booking draft data model
//!
//! The draft is a versioned value object: every turn produces a new version
//! that replaces the previous one wholesale. Summaries are fingerprinted with
//! a content hash so a confirmation can be checked against exactly the
//! summary the user saw.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// Identifiers
// =============================================================================

/// Conversation identifier supplied by the transport (phone number, chat id...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Booking reference handed out when a booking is first confirmed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingRef(String);

impl BookingRef {
    /// Generate a fresh reference (`RES-` followed by 8 hex digits)
    pub fn generate() -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("RES-{}", id[..8].to_uppercase()))
    }

    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against user-supplied text
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.eq_ignore_ascii_case(candidate.trim())
    }
}

impl fmt::Display for BookingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Slots
// =============================================================================

/// A single named fact the dialogue can ask for or reject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Date,
    PartySize,
    Time,
    RiceType,
    Servings,
    HighChairs,
    Strollers,
}

impl SlotName {
    /// Mandatory slots in the order they are asked for
    pub const PRECEDENCE: [SlotName; 5] = [
        SlotName::Date,
        SlotName::PartySize,
        SlotName::Time,
        SlotName::RiceType,
        SlotName::Servings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotName::Date => "date",
            SlotName::PartySize => "party_size",
            SlotName::Time => "time",
            SlotName::RiceType => "rice_type",
            SlotName::Servings => "servings",
            SlotName::HighChairs => "high_chairs",
            SlotName::Strollers => "strollers",
        }
    }

    /// Whether a change to this slot invalidates a pending summary on its own
    pub fn is_mandatory(&self) -> bool {
        Self::PRECEDENCE.contains(self)
    }

    /// Position in the asking order; optional slots sort last
    pub fn precedence(&self) -> usize {
        Self::PRECEDENCE
            .iter()
            .position(|s| s == self)
            .unwrap_or(Self::PRECEDENCE.len())
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rice dish in a booking
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RiceOrder {
    /// Catalog key, never a free-text name
    pub rice_type: String,
    pub servings: Option<u32>,
}

impl RiceOrder {
    pub fn new(rice_type: impl Into<String>, servings: Option<u32>) -> Self {
        Self {
            rice_type: rice_type.into(),
            servings,
        }
    }
}

/// Equipment kinds a table can be prepared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    HighChair,
    Stroller,
}

impl EquipmentKind {
    pub fn slot(&self) -> SlotName {
        match self {
            EquipmentKind::HighChair => SlotName::HighChairs,
            EquipmentKind::Stroller => SlotName::Strollers,
        }
    }
}

/// Requested equipment counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Equipment {
    pub high_chairs: u32,
    pub strollers: u32,
}

impl Equipment {
    pub fn count(&self, kind: EquipmentKind) -> u32 {
        match kind {
            EquipmentKind::HighChair => self.high_chairs,
            EquipmentKind::Stroller => self.strollers,
        }
    }

    pub fn set(&mut self, kind: EquipmentKind, count: u32) {
        match kind {
            EquipmentKind::HighChair => self.high_chairs = count,
            EquipmentKind::Stroller => self.strollers = count,
        }
    }
}

// =============================================================================
// Draft status
// =============================================================================

/// Lifecycle state of a booking draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    /// Gathering facts
    #[default]
    Collecting,
    /// Summary presented, waiting for an explicit yes
    PendingConfirmation,
    /// Booking created
    Confirmed,
    /// Cancellation requested, waiting for an explicit yes
    PendingCancellation,
    /// Booking cancelled (terminal)
    Cancelled,
}

impl DraftStatus {
    /// `Collecting` and `PendingConfirmation` drafts are still being negotiated
    pub fn is_open(&self) -> bool {
        matches!(self, DraftStatus::Collecting | DraftStatus::PendingConfirmation)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DraftStatus::Collecting => "Collecting",
            DraftStatus::PendingConfirmation => "Pending Confirmation",
            DraftStatus::Confirmed => "Confirmed",
            DraftStatus::PendingCancellation => "Pending Cancellation",
            DraftStatus::Cancelled => "Cancelled",
        }
    }
}

/// Fingerprint of a presented summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryHash(u64);

impl SummaryHash {
    pub fn value(&self) -> u64 {
        self.0
    }
}

// =============================================================================
// BookingDraft
// =============================================================================

/// In-progress representation of one reservation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    /// Revision counter, bumped on every content change
    pub version: u64,
    pub party_size: Option<u32>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub rice_orders: Vec<RiceOrder>,
    pub rice_declined: bool,
    pub equipment: Equipment,
    pub status: DraftStatus,
    pub last_summary_hash: Option<SummaryHash>,
    /// Assigned at first confirmation, kept across amendments
    pub reference: Option<BookingRef>,
    /// Last confirmed content, if the booking was ever confirmed
    pub confirmed: Option<DraftSnapshot>,
}

impl BookingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rice decision is resolved: declined, or every order has type and servings
    pub fn rice_resolved(&self) -> bool {
        self.rice_declined
            || (!self.rice_orders.is_empty()
                && self.rice_orders.iter().all(|o| o.servings.is_some()))
    }

    /// All mandatory facts present
    pub fn is_complete(&self) -> bool {
        self.date.is_some() && self.party_size.is_some() && self.time.is_some() && self.rice_resolved()
    }

    /// Immutable copy of the booking content
    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            reference: self.reference.clone(),
            date: self.date,
            time: self.time,
            party_size: self.party_size,
            rice_orders: self.rice_orders.clone(),
            rice_declined: self.rice_declined,
            equipment: self.equipment,
        }
    }

    /// Hash of the booking content (reference and status excluded)
    pub fn content_hash(&self) -> SummaryHash {
        self.snapshot().content_hash()
    }

    /// Whether the last presented summary still describes this draft
    pub fn summary_is_current(&self) -> bool {
        self.last_summary_hash == Some(self.content_hash())
    }

    /// Record that a summary of the current content was presented
    pub fn mark_summarized(&mut self) -> SummaryHash {
        let hash = self.content_hash();
        self.last_summary_hash = Some(hash);
        self.status = DraftStatus::PendingConfirmation;
        hash
    }

    /// Drop a pending summary after the content changed
    pub fn invalidate_summary(&mut self) {
        self.last_summary_hash = None;
        if self.status == DraftStatus::PendingConfirmation {
            self.status = DraftStatus::Collecting;
        }
    }

    /// Roll back to the last confirmed content, dropping an unconfirmed amendment
    ///
    /// Returns false when the draft was never confirmed.
    pub fn restore_confirmed(&mut self) -> bool {
        let Some(confirmed) = self.confirmed.clone() else {
            return false;
        };
        self.date = confirmed.date;
        self.time = confirmed.time;
        self.party_size = confirmed.party_size;
        self.rice_orders = confirmed.rice_orders;
        self.rice_declined = confirmed.rice_declined;
        self.equipment = confirmed.equipment;
        self.last_summary_hash = Some(self.content_hash());
        self.status = DraftStatus::Confirmed;
        self.version += 1;
        true
    }

    /// Forget a slot so it is asked for again
    pub fn clear_slot(&mut self, slot: SlotName) {
        match slot {
            SlotName::Date => self.date = None,
            SlotName::PartySize => self.party_size = None,
            SlotName::Time => self.time = None,
            SlotName::RiceType => {
                self.rice_orders.clear();
                self.rice_declined = false;
            },
            SlotName::Servings => {
                for order in &mut self.rice_orders {
                    order.servings = None;
                }
            },
            SlotName::HighChairs => self.equipment.high_chairs = 0,
            SlotName::Strollers => self.equipment.strollers = 0,
        }
    }

    /// Whether a slot currently holds a value
    pub fn has_slot(&self, slot: SlotName) -> bool {
        match slot {
            SlotName::Date => self.date.is_some(),
            SlotName::PartySize => self.party_size.is_some(),
            SlotName::Time => self.time.is_some(),
            SlotName::RiceType => self.rice_declined || !self.rice_orders.is_empty(),
            SlotName::Servings => {
                !self.rice_orders.is_empty() && self.rice_orders.iter().all(|o| o.servings.is_some())
            },
            SlotName::HighChairs => self.equipment.high_chairs > 0,
            SlotName::Strollers => self.equipment.strollers > 0,
        }
    }
}

/// Read-only view of a draft's booking content, carried by directives
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub reference: Option<BookingRef>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub party_size: Option<u32>,
    pub rice_orders: Vec<RiceOrder>,
    pub rice_declined: bool,
    pub equipment: Equipment,
}

impl DraftSnapshot {
    pub fn content_hash(&self) -> SummaryHash {
        // DefaultHasher::new() uses fixed keys, so the value is stable for a process
        let mut hasher = DefaultHasher::new();
        self.date.hash(&mut hasher);
        self.time.hash(&mut hasher);
        self.party_size.hash(&mut hasher);
        self.rice_orders.hash(&mut hasher);
        self.rice_declined.hash(&mut hasher);
        self.equipment.hash(&mut hasher);
        SummaryHash(hasher.finish())
    }
}
