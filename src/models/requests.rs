use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{Answer, AnswerPayload};

/// Upper bound on quiz answers accepted per request
pub const MAX_QUIZ_ANSWERS: usize = 32;

/// Request for quiz-driven recommendations
///
/// `answers` accepts either the dynamic question/answer list or the legacy
/// fixed-schema object; a payload matching neither is a 400.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub answers: AnswerPayload,
}

/// Request for the next quiz question
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NextQuestionRequest {
    #[serde(default)]
    #[validate(length(max = 32))]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub context: Option<String>,
}
