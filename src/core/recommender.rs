use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::intent::{transcript, IntentBuilder, GENERIC_SEARCH_TERMS};
use crate::core::ranker::Ranker;
use crate::core::topics::{Topic, TopicLexicon};
use crate::models::{AnswerPayload, CatalogProduct, Intent, RankedProduct};
use crate::services::openai::{GenerationParams, OpenAiError, TextGenerator};
use crate::services::woo::CatalogSearch;

/// Tuning for one orchestration pass
#[derive(Debug, Clone, Copy)]
pub struct RecommendOptions {
    /// Recommendations returned to the shopper
    pub top_n: usize,
    /// Page size for the term-based candidate fetches
    pub pool_page: usize,
    /// Below this pool size a second, broader fetch runs
    pub pool_target: usize,
    /// Below this pool size the termless fetch runs
    pub pool_floor: usize,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            top_n: 3,
            pool_page: 30,
            pool_target: 20,
            pool_floor: 15,
        }
    }
}

/// Outcome of one recommendation pass
#[derive(Debug)]
pub struct Recommendation {
    pub rationale: String,
    pub recommendations: Vec<RankedProduct>,
    pub total_found: usize,
    pub searched_terms: Vec<String>,
    pub price_range: (Option<f64>, Option<f64>),
}

/// Sequences the full pipeline: intent, candidate pools, ranking, rationale
///
/// Infallible toward the caller. Each stage degrades on its own: intent falls
/// back to rules, the catalog gateway to broader queries, the closing
/// rationale to a template.
pub struct Recommender {
    catalog: Arc<dyn CatalogSearch>,
    generator: Arc<dyn TextGenerator>,
    intent_builder: IntentBuilder,
    ranker: Ranker,
    options: RecommendOptions,
}

impl Recommender {
    pub fn new(
        catalog: Arc<dyn CatalogSearch>,
        generator: Arc<dyn TextGenerator>,
        intent_builder: IntentBuilder,
        ranker: Ranker,
        options: RecommendOptions,
    ) -> Self {
        Self {
            catalog,
            generator,
            intent_builder,
            ranker,
            options,
        }
    }

    pub async fn recommend(&self, payload: &AnswerPayload) -> Recommendation {
        let intent = self.intent_builder.build(payload).await;
        let pool = self.gather_candidates(&intent).await;
        let total_found = pool.len();
        debug!(
            "Candidate pool of {} for {} search terms",
            total_found,
            intent.search_terms.len()
        );

        let mut ranked = self.ranker.rank(pool, &intent);
        ranked.truncate(self.options.top_n);

        let rationale = self.final_rationale(payload, &intent, &ranked).await;

        Recommendation {
            rationale,
            recommendations: ranked,
            total_found,
            searched_terms: intent.search_terms.clone(),
            price_range: (intent.min_price, intent.max_price),
        }
    }

    /// Candidate pool in up to three fetches: the intent's own terms, then the
    /// single most salient term when under target, then a termless page when
    /// under the floor. Merging keeps only previously-unseen ids.
    async fn gather_candidates(&self, intent: &Intent) -> Vec<CatalogProduct> {
        let mut pool = self
            .catalog
            .search_candidates(
                &intent.search_terms,
                intent.min_price,
                intent.max_price,
                self.options.pool_page,
            )
            .await;
        let mut seen: HashSet<u64> = pool.iter().map(|p| p.id).collect();

        if pool.len() < self.options.pool_target {
            let salient: Vec<String> = match intent.search_terms.first() {
                Some(term) => vec![term.clone()],
                None => GENERIC_SEARCH_TERMS[..3].iter().map(|s| s.to_string()).collect(),
            };
            debug!("Pool under target, second fetch with {:?}", salient);
            let extra = self
                .catalog
                .search_candidates(
                    &salient,
                    intent.min_price,
                    intent.max_price,
                    self.options.pool_page,
                )
                .await;
            merge_unseen(&mut pool, &mut seen, extra);
        }

        if pool.len() < self.options.pool_floor {
            debug!("Pool under floor, termless fetch");
            let extra = self.catalog.search_candidates(&[], None, None, 20).await;
            merge_unseen(&mut pool, &mut seen, extra);
        }

        pool
    }

    async fn final_rationale(
        &self,
        payload: &AnswerPayload,
        intent: &Intent,
        picks: &[RankedProduct],
    ) -> String {
        if picks.is_empty() {
            return intent.rationale.clone();
        }
        match self.generated_rationale(payload, picks).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => template_rationale(payload, intent),
            Err(err) => {
                warn!("Model rationale failed, using the template: {}", err);
                template_rationale(payload, intent)
            }
        }
    }

    async fn generated_rationale(
        &self,
        payload: &AnswerPayload,
        picks: &[RankedProduct],
    ) -> Result<String, OpenAiError> {
        let lines: Vec<String> = picks
            .iter()
            .map(|p| match p.price {
                Some(price) => format!("- {} ({:.2}€): {}", p.name, price, p.reasons.join(", ")),
                None => format!("- {}: {}", p.name, p.reasons.join(", ")),
            })
            .collect();

        let prompt = format!(
            "Sei il commesso di Meeple, negozio italiano di giochi e carte collezionabili.\n\
             Risposte del quiz del cliente:\n{}\n\n\
             Prodotti scelti per il cliente:\n{}\n\n\
             Scrivi 2-3 frasi in italiano, con tono amichevole, che spiegano perché questi \
             prodotti sono adatti. Niente elenchi puntati, niente prezzi inventati.",
            transcript(payload.answers()),
            lines.join("\n")
        );
        self.generator
            .generate(&prompt, GenerationParams::creative())
            .await
    }
}

fn merge_unseen(
    pool: &mut Vec<CatalogProduct>,
    seen: &mut HashSet<u64>,
    extra: Vec<CatalogProduct>,
) {
    for product in extra {
        if seen.insert(product.id) {
            pool.push(product);
        }
    }
}

/// Closing text assembled from the age/category/budget answers; the intent's
/// own rationale when none of those topics were answered
fn template_rationale(payload: &AnswerPayload, intent: &Intent) -> String {
    let lexicon = TopicLexicon::italian();
    let mut age = None;
    let mut category = None;
    let mut budget = None;

    for answer in payload.answers() {
        match lexicon.classify(&answer.question) {
            Topic::Age if age.is_none() => age = Some(answer.answer.as_str()),
            Topic::Category if category.is_none() => category = Some(answer.answer.as_str()),
            Topic::Budget if budget.is_none() => budget = Some(answer.answer.as_str()),
            _ => {}
        }
    }

    let mut parts = Vec::new();
    if let Some(c) = category {
        parts.push(format!("per chi ama {}", c.to_lowercase()));
    }
    if let Some(a) = age {
        parts.push(format!("adatti alla fascia {}", a));
    }
    if let Some(b) = budget {
        parts.push(format!("nel budget {}", b));
    }

    if parts.is_empty() {
        intent.rationale.clone()
    } else {
        format!(
            "Ecco i prodotti che ho scelto {}. Ogni articolo è selezionato in base alle tue risposte al quiz.",
            parts.join(", ")
        )
    }
}
