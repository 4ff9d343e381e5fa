use std::sync::Arc;

use tracing::warn;

use crate::advice::{Advice, AdviceProvider, AnalysisError};

pub const FALLBACK_MESSAGE: &str = "I'm having trouble connecting to the market analysis server. Please check your API key configuration.";
pub const EMPTY_ANSWER_MESSAGE: &str = "I couldn't analyze that right now.";

/// Front door to an [`AdviceProvider`] that never lets provider failures escape.
#[derive(Clone)]
pub struct Analyst {
    provider: Arc<dyn AdviceProvider>,
}

impl Analyst {
    pub fn new(provider: Arc<dyn AdviceProvider>) -> Self {
        Self { provider }
    }

    /// Returns the provider's advice, or a fallback advisory when the provider
    /// fails. Only a blank query is reported as an error.
    pub async fn advise(&self, query: &str, context: &str) -> Result<Advice, AnalysisError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AnalysisError::EmptyQuery);
        }

        let advice = match self.provider.advise(query, context).await {
            Ok(advice) if advice.text.trim().is_empty() => {
                Advice::new(EMPTY_ANSWER_MESSAGE, advice.sources)
            }
            Ok(advice) => advice,
            Err(err) => {
                warn!(%err, "advice provider unavailable, answering with fallback");
                Advice::new(FALLBACK_MESSAGE, Vec::new())
            }
        };

        Ok(advice)
    }
}
