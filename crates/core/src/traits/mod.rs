//! Core traits for the booking agent
//!
//! ```text
//! Extraction:
//!   - EntityExtractor: utterance → ExtractionResult (LLM or rule based)
//! ```

mod extraction;

pub use extraction::EntityExtractor;
