//! Meeple Reco - Quiz-driven product recommendation service for the Meeple shop
//!
//! This library powers the product finder quiz on the Meeple storefront.
//! Quiz answers are turned into a search intent, candidate products are
//! pulled from the WooCommerce catalog, and a scoring pipeline ranks them
//! into a short list with Italian-language explanations.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Ranker, Recommender, IntentBuilder, QuestionPlanner, score_product};
pub use models::{Answer, AnswerPayload, CatalogProduct, Intent, RankedProduct, RankingWeights};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let weights = RankingWeights::default();
        let intent = Intent::default();
        let product = CatalogProduct {
            id: 1,
            name: "Gioco di prova".to_string(),
            permalink: "https://shop.example/p/1".to_string(),
            short_description: None,
            description: None,
            price: Some("19.90".to_string()),
            regular_price: None,
            sale_price: None,
            stock_status: None,
            featured: false,
            images: vec![],
            categories: vec![],
            tags: vec![],
        };
        let (score, reasons) = score_product(&product, &intent, &weights);
        assert!(score.is_finite());
        assert!(!reasons.is_empty());
    }
}
