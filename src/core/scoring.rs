use crate::models::{CatalogProduct, Intent, RankingWeights};

/// Maximum number of reasons attached to a single product
const MAX_REASONS: usize = 3;

/// Score a catalog product against a shopper intent
///
/// Additive signal model:
///     name hits        * 1.5, capped at 3
///     description hits * 1.0, capped at 2
///     within budget    + 2.0
///     in stock         + 1.5
///     featured         + 1.0
///     tag overlap      + 3.0
/// plus price-band adjustments that favour mid-range family products and
/// hold back collector-grade sealed items.
///
/// Returns the raw score together with up to three Italian-language reasons
/// the shopper sees next to the product. The list is never empty.
pub fn score_product(
    product: &CatalogProduct,
    intent: &Intent,
    weights: &RankingWeights,
) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    let name_lower = product.name.to_lowercase();
    // Terms may sit in either description field, so both are searched.
    let desc_source = format!(
        "{} {}",
        product.short_description.as_deref().unwrap_or(""),
        product.description.as_deref().unwrap_or("")
    );
    let desc_lower = strip_html(&desc_source).to_lowercase();
    let text = format!("{} {}", name_lower, desc_lower);

    // Text relevance against the search terms
    let name_hits = count_term_hits(&name_lower, &intent.search_terms);
    score += (name_hits as f64 * weights.name_match).min(3.0);

    let desc_hits = count_term_hits(&desc_lower, &intent.search_terms);
    score += (desc_hits as f64 * weights.description_match).min(2.0);

    // Budget fit on the effective price; intents without bounds get no bonus
    let price = product.effective_price();
    if let Some(p) = price {
        if intent.has_price_bounds() && intent.contains_price(p) {
            score += weights.budget;
            reasons.push(format!("Perfetto per il tuo budget ({:.2}€)", p));
        }
    }

    if product.in_stock() {
        score += weights.stock;
        reasons.push("Disponibile per spedizione immediata".to_string());
    }

    // Tag and category overlap is the strongest single signal
    if tags_overlap(product, &intent.tags) {
        score += weights.tag_match;
        reasons.push("Corrisponde esattamente alle tue preferenze".to_string());
    }

    if name_hits >= 1 {
        reasons.push("Match perfetto con le tue ricerche".to_string());
    }

    if product.featured {
        score += weights.featured;
        reasons.push("Prodotto consigliato dal negozio".to_string());
    }

    // Price-magnitude adjustments; a missing price counts as zero here,
    // skipping every penalty and the family-band bonuses.
    let p = price.unwrap_or(0.0);

    if p > 50.0 {
        score -= 2.0;
    }
    if p > 100.0 {
        score -= 5.0;
    }
    if p > 200.0 {
        score -= 10.0;
    }
    if p > 500.0 {
        score -= 15.0;
    }
    if p > 1000.0 {
        score -= 20.0;
    }

    // Sweet spot for family purchases
    if (5.0..=30.0).contains(&p) {
        score += 5.0;
    }
    if (10.0..=20.0).contains(&p) {
        score += 3.0;
    }

    // Entry-level products, only meaningful below collector prices; an
    // unknown price keeps these gates closed.
    if price.is_some() && p < 80.0 {
        if text.contains("starter") {
            score += 4.0;
            reasons.push("Ideale per iniziare".to_string());
        }
        if text.contains("principianti") || text.contains("beginner") {
            score += 3.0;
            if !reasons.iter().any(|r| r == "Ideale per iniziare") {
                reasons.push("Ideale per iniziare".to_string());
            }
        }
        if text.contains("deck") && p < 30.0 {
            score += 3.0;
        }
        if text.contains("base") || text.contains("basic") {
            score += 2.0;
        }
        if text.contains("pokemon") {
            score += 2.0;
        }
        if text.contains("lego") {
            score += 2.0;
        }
        if text.contains("magic") || text.contains("yugioh") {
            score += 1.0;
        }
        if text.contains("puzzle") {
            score += 1.0;
        }
        if text.contains("gioco") || text.contains("tavolo") {
            score += 1.0;
        }
    }

    // Collector-grade sealed items are the wrong default suggestion
    if text.contains("case") || text.contains("master set") {
        score -= 15.0;
    }
    if text.contains("display") && p > 80.0 {
        score -= 8.0;
    }
    if text.contains("booster box") && p > 60.0 {
        score -= 5.0;
    }

    if (text.contains("booster") || text.contains("espansione"))
        && !reasons.iter().any(|r| r == "Perfetto per espandere la collezione")
    {
        reasons.push("Perfetto per espandere la collezione".to_string());
    }

    if reasons.is_empty() {
        reasons.push("Prodotto di qualità selezionato per te".to_string());
        if p > 0.0 && p < 20.0 {
            reasons.push("Ottimo rapporto qualità-prezzo".to_string());
        } else if p > 50.0 {
            reasons.push("Prodotto premium di alta qualità".to_string());
        }
    }

    reasons.truncate(MAX_REASONS);
    (score, reasons)
}

/// Drop HTML tags, keeping the text between them
#[inline]
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Count how many search terms appear in the (lowercased) haystack
#[inline]
fn count_term_hits(haystack: &str, terms: &[String]) -> usize {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && haystack.contains(t.as_str()))
        .count()
}

/// Substring overlap in either direction between intent tags and the
/// product's category and tag names
#[inline]
fn tags_overlap(product: &CatalogProduct, intent_tags: &[String]) -> bool {
    if intent_tags.is_empty() {
        return false;
    }

    let mut product_terms: Vec<String> = Vec::new();
    for term in product.categories.iter().chain(product.tags.iter()) {
        product_terms.push(term.name.to_lowercase());
        if let Some(slug) = term.slug.as_deref() {
            product_terms.push(slug.to_lowercase());
        }
    }

    intent_tags.iter().any(|it| {
        let it = it.trim().to_lowercase();
        !it.is_empty()
            && product_terms
                .iter()
                .any(|pt| pt.contains(&it) || it.contains(pt.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductTerm;

    fn create_test_product(name: &str, price: &str) -> CatalogProduct {
        CatalogProduct {
            id: 1,
            name: name.to_string(),
            permalink: "https://shop.example/p/1".to_string(),
            short_description: None,
            description: None,
            price: Some(price.to_string()),
            regular_price: None,
            sale_price: None,
            stock_status: Some(crate::models::StockStatus::InStock),
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

    #[test]
    fn test_budget_fit_beats_out_of_budget() {
        let intent = create_test_intent();
        let weights = RankingWeights::default();

        let in_budget = create_test_product("Set da gioco", "25.00");
        let over_budget = create_test_product("Set da gioco", "45.00");

        let (hit, reasons) = score_product(&in_budget, &intent, &weights);
        let (miss, _) = score_product(&over_budget, &intent, &weights);

        assert!(hit > miss);
        assert!(reasons.iter().any(|r| r.contains("25.00€")));
    }

    #[test]
    fn test_name_hits_capped() {
        let weights = RankingWeights::default();
        let mut intent = create_test_intent();
        intent.search_terms = vec![
            "pokemon".to_string(),
            "carte".to_string(),
            "set".to_string(),
            "gioco".to_string(),
        ];
        intent.tags.clear();

        let loaded = create_test_product("Pokemon carte set gioco", "25.00");
        let single = create_test_product("Pokemon avventura", "25.00");

        let (many, _) = score_product(&loaded, &intent, &weights);
        let (one, _) = score_product(&single, &intent, &weights);

        // Four name hits are capped at 3.0; the gap to a single hit (1.5)
        // can be at most 1.5 plus description differences (none here).
        // "gioco" also triggers the entry-level text bonus on the loaded name.
        assert!(many > one);
        assert!(many - one <= 3.0 + f64::EPSILON);
    }

    #[test]
    fn test_tag_overlap_strong_signal() {
        let intent = create_test_intent();
        let weights = RankingWeights::default();

        let mut tagged = create_test_product("Scatola misteriosa", "25.00");
        tagged.categories = vec![ProductTerm {
            id: 9,
            name: "TCG".to_string(),
            slug: Some("tcg".to_string()),
        }];
        let plain = create_test_product("Scatola misteriosa", "25.00");

        let (with_tag, reasons) = score_product(&tagged, &intent, &weights);
        let (without, _) = score_product(&plain, &intent, &weights);

        assert!((with_tag - without - 3.0).abs() < 1e-9);
        assert!(reasons
            .iter()
            .any(|r| r == "Corrisponde esattamente alle tue preferenze"));
    }

    #[test]
    fn test_collector_items_penalized() {
        let intent = create_test_intent();
        let weights = RankingWeights::default();

        let booster_box = create_test_product("Pokemon Booster Box", "120.00");
        let single_pack = create_test_product("Pokemon busta singola", "5.00");

        let (collector, _) = score_product(&booster_box, &intent, &weights);
        let (budget, _) = score_product(&single_pack, &intent, &weights);

        assert!(budget > collector);
    }

    #[test]
    fn test_case_penalty_applies_at_any_price() {
        let intent = create_test_intent();
        let weights = RankingWeights::default();

        let case = create_test_product("Case sigillato", "30.00");
        let plain = create_test_product("Mazzo sigillato", "30.00");

        let (case_score, _) = score_product(&case, &intent, &weights);
        let (plain_score, _) = score_product(&plain, &intent, &weights);

        assert!((plain_score - case_score - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_starter_bonus_gated_by_price() {
        let intent = create_test_intent();
        let weights = RankingWeights::default();

        let cheap_starter = create_test_product("Starter deck principianti", "19.99");
        let pricey_starter = create_test_product("Starter deck principianti", "199.99");

        let (cheap, reasons) = score_product(&cheap_starter, &intent, &weights);
        let (pricey, pricey_reasons) = score_product(&pricey_starter, &intent, &weights);

        assert!(cheap > pricey);
        assert!(reasons.iter().any(|r| r == "Ideale per iniziare"));
        assert!(!pricey_reasons.iter().any(|r| r == "Ideale per iniziare"));
    }

    #[test]
    fn test_reasons_never_empty_and_capped() {
        let weights = RankingWeights::default();
        let intent = Intent {
            search_terms: vec![],
            tags: vec![],
            min_price: None,
            max_price: None,
            rationale: String::new(),
        };

        let mut bare = create_test_product("Oggetto qualunque", "15.00");
        bare.stock_status = Some(crate::models::StockStatus::OutOfStock);

        let (_, reasons) = score_product(&bare, &intent, &weights);
        assert!(!reasons.is_empty());
        assert!(reasons.len() <= MAX_REASONS);
        assert_eq!(reasons[0], "Prodotto di qualità selezionato per te");
        assert_eq!(reasons[1], "Ottimo rapporto qualità-prezzo");
    }

    #[test]
    fn test_description_hits_use_stripped_html() {
        let weights = RankingWeights::default();
        let mut intent = create_test_intent();
        intent.tags.clear();

        let mut product = create_test_product("Scatola", "25.00");
        product.short_description = Some("<p>Carte <b>pokemon</b> rare</p>".to_string());
        let plain = create_test_product("Scatola", "25.00");

        let (with_desc, _) = score_product(&product, &intent, &weights);
        let (without, _) = score_product(&plain, &intent, &weights);

        assert!(with_desc > without);
    }

    #[test]
    fn test_long_description_counts_when_short_present() {
        let weights = RankingWeights::default();
        let mut intent = create_test_intent();
        intent.tags.clear();

        let mut both = create_test_product("Scatola", "25.00");
        both.short_description = Some("<p>Edizione limitata</p>".to_string());
        both.description = Some("<p>Carte <b>pokemon</b> rare</p>".to_string());

        let mut long_only = create_test_product("Scatola", "25.00");
        long_only.description = Some("<p>Carte <b>pokemon</b> rare</p>".to_string());

        // A short description without the terms must not hide the hits
        // sitting in the long one.
        let (with_short, _) = score_product(&both, &intent, &weights);
        let (without_short, _) = score_product(&long_only, &intent, &weights);
        assert_eq!(with_short, without_short);
    }

    #[test]
    fn test_single_name_hit_adds_search_reason() {
        let intent = create_test_intent();
        let weights = RankingWeights::default();

        let product = create_test_product("Pokemon avventura", "25.00");
        let (_, reasons) = score_product(&product, &intent, &weights);

        assert!(reasons
            .iter()
            .any(|r| r == "Match perfetto con le tue ricerche"));
    }

    #[test]
    fn test_entry_level_bonuses_require_known_price() {
        let weights = RankingWeights::default();
        let intent = Intent::default();

        let mut unknown = create_test_product("Pokemon starter deck", "");
        unknown.price = None;

        let (score, reasons) = score_product(&unknown, &intent, &weights);

        // In stock only: no starter, deck, base or brand bonus without a price.
        assert!((score - weights.stock).abs() < 1e-9);
        assert!(!reasons.iter().any(|r| r == "Ideale per iniziare"));
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>ciao <b>mondo</b></p>"), "ciao mondo");
        assert_eq!(strip_html("senza tag"), "senza tag");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_missing_price_skips_budget_and_penalties() {
        let intent = create_test_intent();
        let weights = RankingWeights::default();

        let mut product = create_test_product("Gadget", "");
        product.price = None;

        let (score, reasons) = score_product(&product, &intent, &weights);
        // In stock only: no budget bonus, no family-band bonus, no penalty.
        assert!((score - weights.stock).abs() < 1e-9);
        assert!(!reasons.iter().any(|r| r.contains("budget")));
    }
}
