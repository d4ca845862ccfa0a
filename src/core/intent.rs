use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::topics::{Topic, TopicLexicon};
use crate::models::{Answer, AnswerPayload, Intent, LegacyQuizAnswers};
use crate::services::openai::{extract_json_span, GenerationParams, OpenAiError, TextGenerator};

const MAX_SEARCH_TERMS: usize = 10;
const MAX_TAGS: usize = 8;

/// Seed terms used whenever no topic-specific term was collected, so the
/// catalog query is never empty
pub const GENERIC_SEARCH_TERMS: &[&str] = &["giochi", "carte", "tcg", "puzzle", "tavolo", "educativi"];

const GENERIC_TAGS: &[&str] = &["giochi", "divertimento", "qualità"];

const FALLBACK_RATIONALE: &str = "Selezione basata sulle tue risposte al quiz";

/// Turns quiz answers into a structured search intent
///
/// The language-model path is primary for the dynamic quiz; any failure in it
/// (missing credentials, network, unparseable response) degrades to the
/// deterministic rule path, so `build` never fails the caller. The legacy
/// fixed-schema quiz maps straight to bounds and terms without the model.
pub struct IntentBuilder {
    generator: Arc<dyn TextGenerator>,
    lexicon: TopicLexicon,
}

impl IntentBuilder {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            lexicon: TopicLexicon::italian(),
        }
    }

    pub async fn build(&self, payload: &AnswerPayload) -> Intent {
        let intent = match payload {
            AnswerPayload::Legacy(legacy) => legacy_intent(legacy),
            AnswerPayload::Dynamic(answers) if answers.is_empty() => {
                fallback_intent(&self.lexicon, answers)
            }
            AnswerPayload::Dynamic(answers) => match self.generated_intent(answers).await {
                Ok(intent) => {
                    debug!(
                        "Model intent: {} terms, {} tags",
                        intent.search_terms.len(),
                        intent.tags.len()
                    );
                    intent
                }
                Err(err) => {
                    warn!("Intent generation failed, falling back to rules: {}", err);
                    fallback_intent(&self.lexicon, answers)
                }
            },
        };
        normalize(intent)
    }

    async fn generated_intent(&self, answers: &[Answer]) -> Result<Intent, OpenAiError> {
        let prompt = intent_prompt(answers);
        let raw = self
            .generator
            .generate(&prompt, GenerationParams::intent())
            .await?;
        let span = extract_json_span(&raw).ok_or(OpenAiError::InvalidResponse)?;
        serde_json::from_str(span).map_err(|_| OpenAiError::InvalidResponse)
    }
}

/// Rule-based intent: the question text picks the topic, the answer text
/// picks the terms. Pure function of the answer contents.
pub fn fallback_intent(lexicon: &TopicLexicon, answers: &[Answer]) -> Intent {
    let mut terms: Vec<String> = Vec::new();
    let mut tags: Vec<String> = Vec::new();
    let mut min_price = None;
    let mut max_price = None;
    let mut focus: Vec<&'static str> = Vec::new();

    for answer in answers {
        let text = answer.answer.to_lowercase();
        match lexicon.classify(&answer.question) {
            Topic::Age => apply_age_rules(&text, &mut terms, &mut tags),
            Topic::Budget => {
                if let Some((lo, hi)) = parse_price_band(&text) {
                    min_price = lo;
                    max_price = hi;
                }
            }
            Topic::Category => apply_category_rules(answer, &text, &mut terms, &mut tags, &mut focus),
            Topic::Brand => apply_brand_rules(answer, &text, &mut terms, &mut tags, &mut focus),
            Topic::Level => apply_level_rules(&text, &mut terms, &mut tags),
            Topic::Style | Topic::Family | Topic::Occasion | Topic::Other => {
                apply_soft_rules(&text, &mut tags)
            }
        }
    }

    let rationale = if focus.is_empty() {
        FALLBACK_RATIONALE.to_string()
    } else {
        format!("Selezione di {} in base alle tue risposte", focus.join(" e "))
    };

    Intent {
        search_terms: terms,
        tags,
        min_price,
        max_price,
        rationale,
    }
}

fn apply_age_rules(text: &str, terms: &mut Vec<String>, tags: &mut Vec<String>) {
    if text.contains("0-3") || text.contains("prima infanzia") || text.contains("piccol") {
        push_all(terms, &["prima infanzia", "educativi"]);
        tags.push("bambini".to_string());
    } else if text.contains("3-5") || text.contains("3-6") || text.contains("bambin") {
        terms.push("giochi educativi".to_string());
        tags.push("bambini".to_string());
    } else if text.contains("6-10") || text.contains("7-10") {
        terms.push("giochi per ragazzi".to_string());
        tags.push("ragazzi".to_string());
    } else if text.contains("11-14") || text.contains("ragazz") {
        terms.push("strategia".to_string());
        tags.push("ragazzi".to_string());
    } else if text.contains("15") || text.contains("adult") {
        terms.push("giochi da tavolo".to_string());
        tags.push("adulti".to_string());
    }
}

fn apply_category_rules(
    answer: &Answer,
    text: &str,
    terms: &mut Vec<String>,
    tags: &mut Vec<String>,
    focus: &mut Vec<&'static str>,
) {
    if text.contains("carte") || text.contains("tcg") || text.contains("collezionabil") {
        push_all(terms, &["carte collezionabili", "tcg"]);
        push_all(tags, &["tcg", "carte"]);
        focus.push("carte collezionabili");
    } else if text.contains("tavolo") || text.contains("società") || text.contains("societa") {
        terms.push("giochi da tavolo".to_string());
        push_all(tags, &["tavolo", "famiglia"]);
        focus.push("giochi da tavolo");
    } else if text.contains("puzzle") {
        terms.push("puzzle".to_string());
        tags.push("puzzle".to_string());
        focus.push("puzzle");
    } else if text.contains("costruzioni") || text.contains("lego") || text.contains("mattoncin") {
        push_all(terms, &["costruzioni", "lego"]);
        tags.push("costruzioni".to_string());
        focus.push("costruzioni");
    } else if text.contains("action") || text.contains("personagg") || text.contains("figur") {
        push_all(terms, &["action figure", "personaggi"]);
        tags.push("action figure".to_string());
        focus.push("action figure");
    } else if !answer.answer.trim().is_empty() {
        // Unrecognized category answers are still worth searching verbatim.
        terms.push(answer.answer.trim().to_string());
    }
}

fn apply_brand_rules(
    answer: &Answer,
    text: &str,
    terms: &mut Vec<String>,
    tags: &mut Vec<String>,
    focus: &mut Vec<&'static str>,
) {
    if text.contains("pokemon") || text.contains("pokémon") {
        terms.push("pokemon".to_string());
        tags.push("pokemon".to_string());
        focus.push("pokemon");
    } else if text.contains("magic") {
        terms.push("magic the gathering".to_string());
        tags.push("magic".to_string());
        focus.push("magic");
    } else if text.contains("yugioh") || text.contains("yu-gi-oh") {
        terms.push("yugioh".to_string());
        tags.push("yugioh".to_string());
        focus.push("yugioh");
    } else if text.contains("one piece") {
        terms.push("one piece card game".to_string());
        tags.push("one piece".to_string());
    } else if text.contains("dragon ball") {
        terms.push("dragon ball super card game".to_string());
        tags.push("dragon ball".to_string());
    } else if text.contains("lego") {
        terms.push("lego".to_string());
        tags.push("lego".to_string());
        focus.push("lego");
    } else if !answer.answer.trim().is_empty() {
        terms.push(answer.answer.trim().to_string());
    }
}

fn apply_level_rules(text: &str, terms: &mut Vec<String>, tags: &mut Vec<String>) {
    if text.contains("principiante") || text.contains("iniziare") || text.contains("nuovo") {
        push_all(terms, &["starter", "base"]);
        tags.push("principianti".to_string());
    } else if text.contains("esperto") || text.contains("competitivo") || text.contains("avanzato") {
        terms.push("espansione".to_string());
        tags.push("competitivo".to_string());
    } else if text.contains("intermedio") {
        tags.push("intermedio".to_string());
    }
}

fn apply_soft_rules(text: &str, tags: &mut Vec<String>) {
    if text.contains("regalo") {
        tags.push("regalo".to_string());
    }
    if text.contains("famiglia") || text.contains("family") {
        tags.push("famiglia".to_string());
    }
    if text.contains("competitivo") {
        tags.push("competitivo".to_string());
    }
}

#[inline]
fn push_all(target: &mut Vec<String>, values: &[&str]) {
    target.extend(values.iter().map(|v| v.to_string()));
}

/// Deterministic mapping for the legacy fixed-schema quiz
pub fn legacy_intent(legacy: &LegacyQuizAnswers) -> Intent {
    let (min_price, max_price) = legacy.budget_band.bounds();

    let mut terms = vec![legacy.goal.as_term().to_string()];
    terms.extend(legacy.materials.iter().cloned());

    let tags = vec![
        legacy.goal.as_term().to_string(),
        legacy.usage.as_term().to_string(),
    ];

    Intent {
        search_terms: terms,
        tags,
        min_price,
        max_price,
        rationale: format!(
            "Selezione per la fascia {} con obiettivo {}",
            legacy.age_range.as_label(),
            legacy.goal.as_term()
        ),
    }
}

/// Parses an Italian budget answer into price bounds
///
/// Handles the quiz band labels ("fino a 15", "oltre 100"), the legacy
/// labels ("<20", "80+") and any free-form `N-M` range.
pub fn parse_price_band(text: &str) -> Option<(Option<f64>, Option<f64>)> {
    let t = text.to_lowercase();
    let numbers: Vec<f64> = t
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .filter(|n: &f64| n.is_finite())
        .collect();

    if numbers.len() >= 2 && t.contains('-') {
        return Some((Some(numbers[0]), Some(numbers[1])));
    }

    let single = *numbers.first()?;
    if t.contains('<') || t.contains("fino a") || t.contains("meno di") || t.contains("max") {
        return Some((None, Some(single)));
    }
    if t.contains('+')
        || t.contains("oltre")
        || t.contains("più di")
        || t.contains("piu di")
        || t.contains("almeno")
    {
        return Some((Some(single), None));
    }
    None
}

/// Enforces the intent invariants: ordered price bounds, bounded and
/// deduplicated term lists, never-empty search terms and rationale
pub fn normalize(mut intent: Intent) -> Intent {
    if intent.min_price.map_or(false, |p| p < 0.0) {
        intent.min_price = None;
    }
    if intent.max_price.map_or(false, |p| p < 0.0) {
        intent.max_price = None;
    }
    if let (Some(lo), Some(hi)) = (intent.min_price, intent.max_price) {
        if lo > hi {
            intent.min_price = Some(hi);
            intent.max_price = Some(lo);
        }
    }

    intent.search_terms = dedup_cap(intent.search_terms, MAX_SEARCH_TERMS);
    intent.tags = dedup_cap(intent.tags, MAX_TAGS);

    if intent.search_terms.is_empty() {
        intent.search_terms = GENERIC_SEARCH_TERMS.iter().map(|s| s.to_string()).collect();
    }
    if intent.tags.is_empty() {
        intent.tags = GENERIC_TAGS.iter().map(|s| s.to_string()).collect();
    }
    if intent.rationale.trim().is_empty() {
        intent.rationale = FALLBACK_RATIONALE.to_string();
    }

    intent
}

/// Keeps the first occurrence of each value (case-insensitive), up to `cap`
fn dedup_cap(values: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
            if out.len() == cap {
                break;
            }
        }
    }
    out
}

/// Quiz history as a question/answer transcript for the model prompts
pub fn transcript(answers: &[Answer]) -> String {
    answers
        .iter()
        .map(|a| format!("D: {}\nR: {}", a.question, a.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

fn intent_prompt(answers: &[Answer]) -> String {
    format!(
        "Sei l'assistente alle vendite di Meeple, un negozio italiano di giochi da tavolo, \
         carte collezionabili (Pokémon, Yu-Gi-Oh!, Magic, One Piece, Dragon Ball), puzzle, \
         LEGO, action figure e giochi educativi.\n\
         Fasce di prezzo tipiche: starter deck 15-25€, busta singola 3-5€, booster box \
         80-120€, giochi da tavolo 20-60€, LEGO 10-300€, action figure 10-50€, puzzle 8-40€.\n\n\
         Risposte del quiz del cliente:\n{}\n\n\
         Rispondi SOLO con un oggetto JSON in questa forma:\n\
         {{\"search_terms\": [\"termine\"], \"tags\": [\"tag\"], \"min_price\": numero o null, \
         \"max_price\": numero o null, \"rationale\": \"una frase in italiano\"}}\n\
         Massimo 10 search_terms e 8 tags, tutti in italiano e pertinenti al catalogo.",
        transcript(answers)
    )
}
