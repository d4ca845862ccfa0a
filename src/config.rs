use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::RecommendOptions;
use crate::models::RankingWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub woo: WooSettings,
    #[serde(default)]
    pub openai: OpenAiSettings,
    #[serde(default)]
    pub recommend: RecommendSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// WooCommerce store connection
#[derive(Debug, Clone, Deserialize)]
pub struct WooSettings {
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    /// Storefront URL used for add-to-cart links, defaults to base_url
    pub public_base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl WooSettings {
    pub fn public_base(&self) -> &str {
        self.public_base_url.as_deref().unwrap_or(&self.base_url)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: default_openai_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_base_url() -> String { "https://api.openai.com".to_string() }
fn default_timeout_secs() -> u64 { 30 }

/// Candidate pool sizing for the recommendation pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendSettings {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_pool_page")]
    pub pool_page: usize,
    #[serde(default = "default_pool_target")]
    pub pool_target: usize,
    #[serde(default = "default_pool_floor")]
    pub pool_floor: usize,
}

impl RecommendSettings {
    pub fn to_options(&self) -> RecommendOptions {
        RecommendOptions {
            top_n: self.top_n,
            pool_page: self.pool_page,
            pool_target: self.pool_target,
            pool_floor: self.pool_floor,
        }
    }
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            pool_page: default_pool_page(),
            pool_target: default_pool_target(),
            pool_floor: default_pool_floor(),
        }
    }
}

fn default_top_n() -> usize { 3 }
fn default_pool_page() -> usize { 30 }
fn default_pool_target() -> usize { 20 }
fn default_pool_floor() -> usize { 15 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_name_match_weight")]
    pub name_match: f64,
    #[serde(default = "default_description_match_weight")]
    pub description_match: f64,
    #[serde(default = "default_budget_weight")]
    pub budget: f64,
    #[serde(default = "default_stock_weight")]
    pub stock: f64,
    #[serde(default = "default_featured_weight")]
    pub featured: f64,
    #[serde(default = "default_tag_match_weight")]
    pub tag_match: f64,
}

impl WeightsConfig {
    pub fn to_weights(&self) -> RankingWeights {
        RankingWeights {
            name_match: self.name_match,
            description_match: self.description_match,
            budget: self.budget,
            stock: self.stock,
            featured: self.featured,
            tag_match: self.tag_match,
        }
    }
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            name_match: default_name_match_weight(),
            description_match: default_description_match_weight(),
            budget: default_budget_weight(),
            stock: default_stock_weight(),
            featured: default_featured_weight(),
            tag_match: default_tag_match_weight(),
        }
    }
}

fn default_name_match_weight() -> f64 { 1.5 }
fn default_description_match_weight() -> f64 { 1.0 }
fn default_budget_weight() -> f64 { 2.0 }
fn default_stock_weight() -> f64 { 1.5 }
fn default_featured_weight() -> f64 { 1.0 }
fn default_tag_match_weight() -> f64 { 3.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with MEEPLE_)
    /// 4. Conventional environment variables (WOO_BASE_URL, OPENAI_API_KEY, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with MEEPLE_)
            // e.g., MEEPLE_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("MEEPLE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Overlay the conventional variable names used by the shop deployment
        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MEEPLE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Overlay short environment variable names on the loaded configuration
/// so deployments can set WOO_CONSUMER_KEY instead of MEEPLE_WOO__CONSUMER_KEY
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let woo_base_url = env::var("WOO_BASE_URL").ok();
    let woo_consumer_key = env::var("WOO_CONSUMER_KEY").ok();
    let woo_consumer_secret = env::var("WOO_CONSUMER_SECRET").ok();
    let public_base_url = env::var("PUBLIC_BASE_URL").ok();
    let openai_api_key = env::var("OPENAI_API_KEY").ok();
    let openai_model = env::var("OPENAI_MODEL").ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(base_url) = woo_base_url {
        builder = builder.set_override("woo.base_url", base_url)?;
    }
    if let Some(consumer_key) = woo_consumer_key {
        builder = builder.set_override("woo.consumer_key", consumer_key)?;
    }
    if let Some(consumer_secret) = woo_consumer_secret {
        builder = builder.set_override("woo.consumer_secret", consumer_secret)?;
    }
    if let Some(public_base) = public_base_url {
        builder = builder.set_override("woo.public_base_url", public_base)?;
    }
    if let Some(api_key) = openai_api_key {
        builder = builder.set_override("openai.api_key", api_key)?;
    }
    if let Some(model) = openai_model {
        builder = builder.set_override("openai.model", model)?;
    }

    builder.build()
}
