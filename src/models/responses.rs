use serde::{Deserialize, Serialize};

use crate::models::domain::RankedProduct;

/// Response for the recommend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub rationale: String,
    pub recommendations: Vec<RankedProduct>,
    pub meta: RecommendMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendMeta {
    pub total_found: usize,
    pub searched_terms: Vec<String>,
    pub price_range: PriceRange,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// One step of the progressive quiz
///
/// Doubles as the wire shape the question LLM is instructed to emit, so the
/// mined JSON span deserializes straight into it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionStep {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(rename = "isComplete", default)]
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
