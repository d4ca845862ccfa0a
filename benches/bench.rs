// Criterion benchmarks for the Meeple recommendation core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use meeple_reco::core::intent::{fallback_intent, normalize};
use meeple_reco::core::scoring::strip_html;
use meeple_reco::core::topics::TopicLexicon;
use meeple_reco::core::variety::FixedVariety;
use meeple_reco::core::Ranker;
use meeple_reco::models::{
    Answer, CatalogProduct, Intent, ProductTerm, RankingWeights, StockStatus,
};
use meeple_reco::score_product;

fn create_candidate(id: u64) -> CatalogProduct {
    CatalogProduct {
        id,
        name: match id % 4 {
            0 => format!("Pokemon Starter Deck {}", id),
            1 => format!("Gioco da tavolo Famiglia {}", id),
            2 => format!("Puzzle Ravensburger {}", id),
            _ => format!("Booster Box Edizione {}", id),
        },
        permalink: format!("https://shop.example/p/{}", id),
        short_description: Some(
            "<p>Carte <b>collezionabili</b> per tutta la famiglia</p>".to_string(),
        ),
        description: None,
        price: Some(format!("{}.90", 10 + (id % 12) * 10)),
        regular_price: None,
        sale_price: None,
        stock_status: Some(if id % 5 == 0 {
            StockStatus::OutOfStock
        } else {
            StockStatus::InStock
        }),
        featured: id % 7 == 0,
        images: vec![],
        categories: vec![ProductTerm {
            id: id % 3,
            name: if id % 3 == 0 { "TCG" } else { "Tavolo" }.to_string(),
            slug: None,
        }],
        tags: vec![],
    }
}

fn create_intent() -> Intent {
    Intent {
        search_terms: vec![
            "pokemon".to_string(),
            "carte".to_string(),
            "starter".to_string(),
        ],
        tags: vec!["tcg".to_string(), "famiglia".to_string()],
        min_price: Some(10.0),
        max_price: Some(60.0),
        rationale: "bench".to_string(),
    }
}

fn create_quiz_answers() -> Vec<Answer> {
    vec![
        Answer::new("Per chi è il regalo? Qual è la fascia d'età?", "7-10 anni"),
        Answer::new("Che tipo di gioco ti interessa?", "Carte collezionabili"),
        Answer::new("Quale marca di carte preferisci?", "Pokémon"),
        Answer::new("Quanto vorresti spendere?", "20-40€"),
    ]
}

fn bench_score_product(c: &mut Criterion) {
    let product = create_candidate(3);
    let intent = create_intent();
    let weights = RankingWeights::default();

    c.bench_function("score_product", |b| {
        b.iter(|| score_product(black_box(&product), black_box(&intent), black_box(&weights)));
    });
}

fn bench_strip_html(c: &mut Criterion) {
    let html =
        "<div><p>Carte <b>Pokemon</b> rare</p><span>per collezionisti</span></div>".repeat(20);

    c.bench_function("strip_html", |b| {
        b.iter(|| strip_html(black_box(&html)));
    });
}

fn bench_ranking(c: &mut Criterion) {
    let ranker = Ranker::with_default_weights(Arc::new(FixedVariety(7)), "https://shop.example");
    let intent = create_intent();

    let mut group = c.benchmark_group("ranking");

    for candidate_count in [10u64, 50, 100, 500, 1000].iter() {
        let candidates: Vec<CatalogProduct> =
            (0..*candidate_count).map(create_candidate).collect();

        group.bench_with_input(
            BenchmarkId::new("rank", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| ranker.rank(black_box(candidates.clone()), black_box(&intent)));
            },
        );
    }

    group.finish();
}

fn bench_fallback_intent(c: &mut Criterion) {
    let lexicon = TopicLexicon::italian();
    let answers = create_quiz_answers();

    c.bench_function("fallback_intent", |b| {
        b.iter(|| normalize(fallback_intent(black_box(&lexicon), black_box(&answers))));
    });
}

criterion_group!(
    benches,
    bench_score_product,
    bench_strip_html,
    bench_ranking,
    bench_fallback_intent
);

criterion_main!(benches);
