pub mod combiner;
pub mod engine;
pub mod explain;
pub mod extractor;
pub mod reranker;
pub mod signals;

pub use engine::{EngineConfig, RecommendationEngine, Recommendations};
pub use extractor::{HttpPreferenceExtractor, PreferenceExtractor};
