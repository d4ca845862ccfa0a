use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling the text-generation service
#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("OpenAI API key is not configured")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format")]
    InvalidResponse,
}

/// Sampling parameters for one generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Low temperature for structured extraction
    pub fn intent() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 400,
        }
    }

    /// Higher temperature for conversational text
    pub fn creative() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 400,
        }
    }
}

/// Capability interface over the text-generation service
///
/// The pipeline only ever sends a prompt and reads back free-form text;
/// tests substitute deterministic stubs to drive the fallback paths.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, params: GenerationParams)
        -> Result<String, OpenAiError>;
}

/// OpenAI-compatible chat completions client
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl OpenAiClient {
    pub fn new(base_url: String, api_key: Option<String>, model: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            model,
            client,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, OpenAiError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(OpenAiError::MissingApiKey)?;

        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });

        tracing::debug!("Chat completion with model {}", self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Chat completion failed: {} - {}", status, body);
            return Err(OpenAiError::ApiError(format!(
                "Chat completion failed: {}",
                status
            )));
        }

        let json: Value = response.json().await?;
        let content = json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or(OpenAiError::InvalidResponse)?;

        Ok(content.to_string())
    }
}

/// Substring from the first `{` to the last `}` of the response
///
/// The generation service wraps JSON in prose at will, so span mining is the
/// contract rather than strict parsing.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_generator(base_url: String, api_key: Option<&str>) -> OpenAiClient {
        OpenAiClient::new(
            base_url,
            api_key.map(|k| k.to_string()),
            "gpt-4o-mini".to_string(),
            5,
        )
    }

    #[test]
    fn test_extract_json_span_plain() {
        assert_eq!(extract_json_span(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_json_span_wrapped_in_prose() {
        let wrapped = r#"Certo! Ecco il JSON richiesto: {"a": {"b": 2}} spero sia utile."#;
        assert_eq!(extract_json_span(wrapped), Some(r#"{"a": {"b": 2}}"#));
    }

    #[test]
    fn test_extract_json_span_rejects_garbage() {
        assert_eq!(extract_json_span("nessun oggetto"), None);
        assert_eq!(extract_json_span("} al contrario {"), None);
    }

    #[tokio::test]
    async fn test_generate_without_key_fails_fast() {
        let generator = test_generator("http://localhost:1".to_string(), None);
        let result = generator.generate("ciao", GenerationParams::intent()).await;
        assert!(matches!(result, Err(OpenAiError::MissingApiKey)));

        let blank = test_generator("http://localhost:1".to_string(), Some("  "));
        let result = blank.generate("ciao", GenerationParams::intent()).await;
        assert!(matches!(result, Err(OpenAiError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_generate_reads_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "Ciao dal modello"}}]}"#,
            )
            .create_async()
            .await;

        let generator = test_generator(server.url(), Some("sk-test"));
        let text = generator
            .generate("saluta", GenerationParams::creative())
            .await
            .unwrap();

        assert_eq!(text, "Ciao dal modello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_maps_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error": {"message": "rate limited"}}"#)
            .create_async()
            .await;

        let generator = test_generator(server.url(), Some("sk-test"));
        let result = generator.generate("ciao", GenerationParams::intent()).await;

        assert!(matches!(result, Err(OpenAiError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_generate_rejects_unexpected_shape() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let generator = test_generator(server.url(), Some("sk-test"));
        let result = generator.generate("ciao", GenerationParams::intent()).await;

        assert!(matches!(result, Err(OpenAiError::InvalidResponse)));
    }
}
