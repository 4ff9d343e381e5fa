pub mod advice;
pub mod analyst;
pub mod context;
pub mod gemini;

pub use advice::{Advice, AdviceProvider, AnalysisError, Citation};
pub use analyst::{Analyst, EMPTY_ANSWER_MESSAGE, FALLBACK_MESSAGE};
pub use context::{market_context, select_instrument};
pub use gemini::{GeminiAdvisor, GeminiConfig};
