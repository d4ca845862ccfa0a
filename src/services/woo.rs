use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::CatalogProduct;

/// Errors that can occur when talking to the WooCommerce store
#[derive(Debug, Error)]
pub enum WooError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Read access to the product catalog
///
/// Implementations degrade query precision before returning an empty result:
/// whenever the catalog has products, `search_candidates` finds some.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search_candidates(
        &self,
        terms: &[String],
        min_price: Option<f64>,
        max_price: Option<f64>,
        limit: usize,
    ) -> Vec<CatalogProduct>;
}

/// Ordered query ladder: each rung broadens or reshuffles the search until
/// one returns products
const LADDER: [SearchStrategy; 5] = [
    SearchStrategy::Recent,
    SearchStrategy::Popular,
    SearchStrategy::Random,
    SearchStrategy::TopRated,
    SearchStrategy::Fallback,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchStrategy {
    Recent,
    Popular,
    Random,
    TopRated,
    Fallback,
}

impl SearchStrategy {
    fn ordering(&self) -> Option<(&'static str, Option<&'static str>)> {
        match self {
            SearchStrategy::Recent => Some(("date", Some("desc"))),
            SearchStrategy::Popular => Some(("popularity", Some("desc"))),
            SearchStrategy::Random => Some(("rand", None)),
            SearchStrategy::TopRated => Some(("rating", Some("desc"))),
            SearchStrategy::Fallback => None,
        }
    }

    fn uses_terms(&self) -> bool {
        !matches!(self, SearchStrategy::Fallback)
    }

    fn page_size(&self, limit: usize) -> usize {
        match self {
            SearchStrategy::TopRated => limit.min(30),
            SearchStrategy::Fallback => 20,
            _ => limit,
        }
    }
}

/// WooCommerce REST API client
///
/// Wraps the store's product listing endpoint. Credentials travel as query
/// parameters, the form Woo expects for server-to-server calls, so request
/// URLs are never logged.
pub struct WooClient {
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
    client: Client,
}

impl WooClient {
    pub fn new(
        base_url: String,
        consumer_key: String,
        consumer_secret: String,
        timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            consumer_key,
            consumer_secret,
            client,
        }
    }

    async fn fetch_products(
        &self,
        search: &str,
        strategy: SearchStrategy,
        limit: usize,
    ) -> Result<Vec<CatalogProduct>, WooError> {
        let mut url = format!(
            "{}/wp-json/wc/v3/products?consumer_key={}&consumer_secret={}&status=publish&per_page={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.consumer_key),
            urlencoding::encode(&self.consumer_secret),
            strategy.page_size(limit),
        );
        if strategy.uses_terms() && !search.is_empty() {
            url.push_str("&search=");
            url.push_str(&urlencoding::encode(search));
        }
        if let Some((orderby, order)) = strategy.ordering() {
            url.push_str("&orderby=");
            url.push_str(orderby);
            if let Some(order) = order {
                url.push_str("&order=");
                url.push_str(order);
            }
        }

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(WooError::ApiError(format!(
                "Product listing failed: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        let items = json
            .as_array()
            .ok_or_else(|| WooError::InvalidResponse("Expected a product array".into()))?;

        // Records with unexpected field shapes are skipped, not fatal.
        let products = items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect();

        Ok(products)
    }
}

#[async_trait]
impl CatalogSearch for WooClient {
    async fn search_candidates(
        &self,
        terms: &[String],
        min_price: Option<f64>,
        max_price: Option<f64>,
        limit: usize,
    ) -> Vec<CatalogProduct> {
        let search_text = terms.join(" ");

        for strategy in LADDER {
            match self.fetch_products(&search_text, strategy, limit).await {
                Ok(products) if !products.is_empty() => {
                    tracing::debug!(
                        "Strategy {:?} returned {} products for \"{}\"",
                        strategy,
                        products.len(),
                        search_text
                    );
                    return filter_by_price(products, min_price, max_price);
                }
                Ok(_) => {
                    tracing::debug!("Strategy {:?} returned nothing", strategy);
                }
                Err(err) => {
                    tracing::warn!("Strategy {:?} failed: {}", strategy, err);
                }
            }
        }

        tracing::warn!("Every strategy came back empty for \"{}\"", search_text);
        vec![]
    }
}

/// Price filter with the availability guarantee: when the bounds would empty
/// a non-empty fetch, the first 10 unfiltered products win over nothing.
/// Products without a readable price fail the filter whenever a bound is set.
pub fn filter_by_price(
    mut products: Vec<CatalogProduct>,
    min_price: Option<f64>,
    max_price: Option<f64>,
) -> Vec<CatalogProduct> {
    if min_price.is_none() && max_price.is_none() {
        return products;
    }

    let in_bounds = |p: &CatalogProduct| match p.effective_price() {
        Some(price) => {
            min_price.map_or(true, |m| price >= m) && max_price.map_or(true, |m| price <= m)
        }
        None => false,
    };

    if !products.iter().any(|p| in_bounds(p)) {
        products.truncate(10);
        return products;
    }

    products.retain(|p| in_bounds(p));
    products
}
