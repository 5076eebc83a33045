//! Entity extraction port

use async_trait::async_trait;

use crate::error::ExtractionError;
use crate::extraction::{ExtractionContext, ExtractionResult};

/// Turns one user utterance into structured slot candidates
///
/// Implementations:
/// - an LLM-backed extractor returning JSON parsed with
///   [`ExtractionResult::from_json`]
/// - rule-based or scripted extractors for tests
///
/// # Example
///
/// ```ignore
/// let extractor: Arc<dyn EntityExtractor> = Arc::new(LlmExtractor::new(client));
/// let result = extractor.extract("somos 4 el sábado", &context).await?;
/// assert_eq!(result.party_size.and_then(|p| p.sum()), Some(4));
/// ```
#[async_trait]
pub trait EntityExtractor: Send + Sync + 'static {
    /// Extract candidates from an utterance
    ///
    /// # Arguments
    /// * `utterance` - Raw user text
    /// * `context` - Current draft, awaited slot and reference clock
    async fn extract(
        &self,
        utterance: &str,
        context: &ExtractionContext,
    ) -> Result<ExtractionResult, ExtractionError>;

    /// Extractor name for logging
    fn name(&self) -> &str {
        "extractor"
    }
}
