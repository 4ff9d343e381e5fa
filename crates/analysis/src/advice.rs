use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub text: String,
    pub sources: Vec<Citation>,
}

impl Advice {
    pub fn new(text: impl Into<String>, sources: Vec<Citation>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }
}

/// Failures of the analysis layer. Every provider-side variant means
/// analysis is unavailable for this request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("query must not be blank")]
    EmptyQuery,

    #[error("advice provider is not configured: {0}")]
    Unconfigured(&'static str),

    #[error("advice provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("advice provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("advice provider is unavailable: {0}")]
    Unavailable(String),
}

/// Free-text market advice from an external collaborator.
#[async_trait]
pub trait AdviceProvider: Send + Sync {
    async fn advise(&self, query: &str, context: &str) -> Result<Advice, AnalysisError>;
}
