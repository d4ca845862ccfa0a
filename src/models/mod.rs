// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Answer, AnswerPayload, CatalogProduct, Intent, LegacyAgeRange, LegacyBudgetBand, LegacyGoal,
    LegacyQuizAnswers, LegacyUrgency, LegacyUsage, ProductImage, ProductTerm, RankedProduct,
    RankingWeights, StockStatus,
};
pub use requests::{NextQuestionRequest, RecommendRequest, MAX_QUIZ_ANSWERS};
pub use responses::{
    ErrorResponse, HealthResponse, PriceRange, QuestionStep, RecommendMeta, RecommendResponse,
};
