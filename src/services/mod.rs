// Service exports
pub mod openai;
pub mod woo;

pub use openai::{extract_json_span, GenerationParams, OpenAiClient, OpenAiError, TextGenerator};
pub use woo::{CatalogSearch, WooClient, WooError};
