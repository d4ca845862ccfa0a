use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{QuestionPlanner, Recommender};
use crate::models::{
    ErrorResponse, HealthResponse, NextQuestionRequest, PriceRange, RecommendMeta,
    RecommendRequest, RecommendResponse, MAX_QUIZ_ANSWERS,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub planner: Arc<QuestionPlanner>,
}

/// Configure all recommendation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/recommend", web::post().to(recommend))
        .route("/next-question", web::post().to(next_question));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Recommendation endpoint
///
/// POST /api/v1/recommend
///
/// Request body, dynamic form:
/// ```json
/// { "answers": [{ "question": "Fascia d'età?", "answer": "6-10 anni" }] }
/// ```
/// or the legacy fixed-schema object in place of the array.
async fn recommend(
    state: web::Data<AppState>,
    req: web::Json<RecommendRequest>,
) -> impl Responder {
    let request_id = uuid::Uuid::new_v4();
    let answer_count = req.answers.answers().len();

    if answer_count > MAX_QUIZ_ANSWERS {
        tracing::info!(
            "[{}] Rejected payload with {} answers",
            request_id,
            answer_count
        );
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Too many answers".to_string(),
            message: format!("A quiz carries at most {} answers", MAX_QUIZ_ANSWERS),
            status_code: 400,
        });
    }

    tracing::info!(
        "[{}] Building recommendations from {} answers",
        request_id,
        answer_count
    );

    let outcome = state.recommender.recommend(&req.answers).await;

    tracing::info!(
        "[{}] Returning {} recommendations from a pool of {}",
        request_id,
        outcome.recommendations.len(),
        outcome.total_found
    );

    HttpResponse::Ok().json(RecommendResponse {
        rationale: outcome.rationale,
        recommendations: outcome.recommendations,
        meta: RecommendMeta {
            total_found: outcome.total_found,
            searched_terms: outcome.searched_terms,
            price_range: PriceRange {
                min: outcome.price_range.0,
                max: outcome.price_range.1,
            },
        },
    })
}

/// Next quiz question endpoint
///
/// POST /api/v1/next-question
///
/// Request body:
/// ```json
/// { "answers": [{ "question": "string", "answer": "string" }], "context": "string" }
/// ```
async fn next_question(
    state: web::Data<AppState>,
    req: web::Json<NextQuestionRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for next_question request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let step = state
        .planner
        .next(&req.answers, req.context.as_deref())
        .await;

    HttpResponse::Ok().json(step)
}
