use std::sync::Arc;

use url::Url;

use crate::core::scoring::score_product;
use crate::core::variety::{perturbation, tie_break, VarietySource, NEAR_TIE_THRESHOLD};
use crate::models::{CatalogProduct, Intent, RankedProduct, RankingWeights};

/// Orders catalog candidates for presentation
///
/// # Pipeline stages
/// 1. Per-candidate signal scoring (`core::scoring`)
/// 2. Bounded variety perturbation, stable within one time bucket
/// 3. Strict descending sort
/// 4. One adjacent pass that may swap near-tied neighbours
///
/// Output is descending by score except for those bounded swaps: any adjacent
/// inversion is smaller than [`NEAR_TIE_THRESHOLD`].
pub struct Ranker {
    weights: RankingWeights,
    variety: Arc<dyn VarietySource>,
    public_base: String,
}

impl Ranker {
    pub fn new(
        weights: RankingWeights,
        variety: Arc<dyn VarietySource>,
        public_base: impl Into<String>,
    ) -> Self {
        Self {
            weights,
            variety,
            public_base: into_trimmed_base(public_base),
        }
    }

    pub fn with_default_weights(
        variety: Arc<dyn VarietySource>,
        public_base: impl Into<String>,
    ) -> Self {
        Self::new(RankingWeights::default(), variety, public_base)
    }

    pub fn rank(&self, candidates: Vec<CatalogProduct>, intent: &Intent) -> Vec<RankedProduct> {
        let bucket = self.variety.bucket();

        let mut ranked: Vec<RankedProduct> = candidates
            .into_iter()
            .map(|product| {
                let id = product.id;
                let (base, reasons) = score_product(&product, intent, &self.weights);
                let price = product.effective_price();
                let image = first_valid_image(&product);

                RankedProduct {
                    id,
                    name: product.name,
                    price,
                    image,
                    permalink: product.permalink,
                    add_to_cart_url: format!("{}/?add-to-cart={}", self.public_base, id),
                    score: base + perturbation(bucket, id),
                    reasons,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        soft_tie_pass(&mut ranked, bucket);
        ranked
    }
}

/// Re-examines adjacent pairs closer than the near-tie threshold; the pair's
/// seeded draw may outweigh the gap and swap them. Swaps are the only source
/// of inversions, so every inversion stays under the threshold.
fn soft_tie_pass(ranked: &mut [RankedProduct], bucket: u64) {
    if ranked.len() < 2 {
        return;
    }
    for i in 0..ranked.len() - 1 {
        let gap = ranked[i].score - ranked[i + 1].score;
        if gap.abs() < NEAR_TIE_THRESHOLD {
            let draw = tie_break(bucket, ranked[i].id, ranked[i + 1].id);
            if gap + draw < 0.0 {
                ranked.swap(i, i + 1);
            }
        }
    }
}

/// First listed image, kept only when it parses as an absolute http(s) URL
fn first_valid_image(product: &CatalogProduct) -> Option<String> {
    let src = product.images.first()?.src.trim();
    let parsed = Url::parse(src).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(src.to_string()),
        _ => None,
    }
}

fn into_trimmed_base(base: impl Into<String>) -> String {
    let base = base.into();
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::variety::FixedVariety;
    use crate::models::{ProductImage, ProductTerm, StockStatus};

    const BASE: &str = "https://shop.example";

    fn create_test_product(id: u64, name: &str, price: &str) -> CatalogProduct {
        CatalogProduct {
            id,
            name: name.to_string(),
            permalink: format!("{}/p/{}", BASE, id),
            short_description: None,
            description: None,
            price: Some(price.to_string()),
            regular_price: None,
            sale_price: None,
            stock_status: Some(StockStatus::InStock),
            featured: false,
            images: vec![],
            categories: vec![],
            tags: vec![],
        }
    }

    fn create_test_intent() -> Intent {
        Intent {
            search_terms: vec!["pokemon".to_string(), "carte".to_string()],
            tags: vec!["tcg".to_string()],
            min_price: Some(10.0),
            max_price: Some(40.0),
            rationale: "test".to_string(),
        }
    }

    fn test_ranker(bucket: u64) -> Ranker {
        Ranker::with_default_weights(Arc::new(FixedVariety(bucket)), BASE)
    }

    #[test]
    fn test_rank_empty_candidates() {
        let ranker = test_ranker(1);
        assert!(ranker.rank(vec![], &create_test_intent()).is_empty());
    }

    #[test]
    fn test_adjacent_inversions_bounded() {
        let ranker = test_ranker(5);
        let candidates: Vec<CatalogProduct> = (1..=30)
            .map(|i| create_test_product(i, &format!("Prodotto {}", i), "25.00"))
            .collect();

        let ranked = ranker.rank(candidates, &create_test_intent());

        assert_eq!(ranked.len(), 30);
        for pair in ranked.windows(2) {
            assert!(
                pair[0].score - pair[1].score > -NEAR_TIE_THRESHOLD,
                "inversion {} -> {} exceeds the near-tie threshold",
                pair[0].score,
                pair[1].score
            );
        }
    }

    #[test]
    fn test_same_bucket_same_order() {
        let candidates: Vec<CatalogProduct> = (1..=20)
            .map(|i| create_test_product(i, &format!("Prodotto {}", i), "25.00"))
            .collect();
        let intent = create_test_intent();

        let first: Vec<u64> = test_ranker(9)
            .rank(candidates.clone(), &intent)
            .iter()
            .map(|r| r.id)
            .collect();
        let second: Vec<u64> = test_ranker(9)
            .rank(candidates, &intent)
            .iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_clearly_better_candidate_stays_on_top() {
        let ranker = test_ranker(3);
        let intent = create_test_intent();

        let mut strong = create_test_product(1, "Pokemon carte starter", "19.99");
        strong.featured = true;
        strong.categories = vec![ProductTerm {
            id: 4,
            name: "TCG".to_string(),
            slug: Some("tcg".to_string()),
        }];
        let weak = create_test_product(2, "Case collezionisti", "450.00");

        let ranked = ranker.rank(vec![weak, strong], &intent);
        assert_eq!(ranked[0].id, 1);
    }

    #[test]
    fn test_image_url_validated() {
        let ranker = test_ranker(1);
        let intent = create_test_intent();

        let mut with_image = create_test_product(1, "Puzzle", "20.00");
        with_image.images = vec![ProductImage {
            src: "https://cdn.example/p.jpg".to_string(),
            alt: None,
        }];
        let mut broken_image = create_test_product(2, "Puzzle", "20.00");
        broken_image.images = vec![ProductImage {
            src: "nota url valida".to_string(),
            alt: None,
        }];
        let mut wrong_scheme = create_test_product(3, "Puzzle", "20.00");
        wrong_scheme.images = vec![ProductImage {
            src: "ftp://cdn.example/p.jpg".to_string(),
            alt: None,
        }];

        let ranked = ranker.rank(vec![with_image, broken_image, wrong_scheme], &intent);

        let by_id = |id: u64| ranked.iter().find(|r| r.id == id).map(|r| r.image.clone());
        assert_eq!(by_id(1), Some(Some("https://cdn.example/p.jpg".to_string())));
        assert_eq!(by_id(2), Some(None));
        assert_eq!(by_id(3), Some(None));
    }

    #[test]
    fn test_add_to_cart_url() {
        let ranker = Ranker::with_default_weights(Arc::new(FixedVariety(1)), "https://shop.example/");
        let ranked = ranker.rank(
            vec![create_test_product(7, "Puzzle", "20.00")],
            &create_test_intent(),
        );
        assert_eq!(ranked[0].add_to_cart_url, "https://shop.example/?add-to-cart=7");
    }
}
