// Core pipeline exports
pub mod intent;
pub mod quiz;
pub mod ranker;
pub mod recommender;
pub mod scoring;
pub mod topics;
pub mod variety;

pub use intent::{fallback_intent, legacy_intent, normalize, parse_price_band, IntentBuilder};
pub use quiz::QuestionPlanner;
pub use ranker::Ranker;
pub use recommender::{Recommendation, RecommendOptions, Recommender};
pub use scoring::score_product;
pub use topics::{Topic, TopicLexicon};
pub use variety::{ClockVariety, FixedVariety, VarietySource, NEAR_TIE_THRESHOLD};
