pub mod analysis;
pub mod relevance_filter;

pub use analysis::{aggregate_reviews, AggregatedPlace, PlaceInsights, ReviewAnalyser};
pub use relevance_filter::{LlmRelevanceFilter, RelevanceFilter};
