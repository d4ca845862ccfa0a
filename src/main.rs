use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use meeple_reco::config::Settings;
use meeple_reco::core::{ClockVariety, IntentBuilder, QuestionPlanner, Ranker, Recommender};
use meeple_reco::routes;
use meeple_reco::routes::recommend::AppState;
use meeple_reco::services::{CatalogSearch, OpenAiClient, TextGenerator, WooClient};
use std::sync::Arc;
use tracing::{info, warn};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration first so the logging section can take effect
    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    // Initialize logging; LOG_LEVEL/LOG_FORMAT override the config section
    let log_level =
        std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format =
        std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Meeple recommendation service...");
    info!("Configuration loaded successfully");

    // Resolve the storefront base before the Woo settings are moved below
    let public_base = settings.woo.public_base().to_string();

    if settings.openai.api_key.is_none() {
        warn!("No OpenAI API key configured, using rule-based intents and the fixed question tree");
    }

    // Initialize the OpenAI client (shared by intent, quiz and rationale)
    let generator: Arc<dyn TextGenerator> = Arc::new(OpenAiClient::new(
        settings.openai.base_url,
        settings.openai.api_key,
        settings.openai.model,
        settings.openai.timeout_secs,
    ));

    // Initialize the WooCommerce catalog client
    let catalog: Arc<dyn CatalogSearch> = Arc::new(WooClient::new(
        settings.woo.base_url,
        settings.woo.consumer_key,
        settings.woo.consumer_secret,
        settings.woo.timeout_secs,
    ));

    info!("Catalog client initialized");

    // Initialize the ranking pipeline with configured weights
    let weights = settings.scoring.weights.to_weights();
    let ranker = Ranker::new(weights, Arc::new(ClockVariety::new()), public_base);

    info!("Ranker initialized with weights: {:?}", weights);

    let intent_builder = IntentBuilder::new(generator.clone());
    let recommender = Recommender::new(
        catalog,
        generator.clone(),
        intent_builder,
        ranker,
        settings.recommend.to_options(),
    );
    let planner = QuestionPlanner::new(generator);

    // Build application state
    let app_state = AppState {
        recommender: Arc::new(recommender),
        planner: Arc::new(planner),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
