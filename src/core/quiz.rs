use std::sync::Arc;

use tracing::warn;

use crate::core::intent::transcript;
use crate::core::topics::{Topic, TopicLexicon};
use crate::models::{Answer, QuestionStep};
use crate::services::openai::{extract_json_span, GenerationParams, OpenAiError, TextGenerator};

/// Answers collected before the quiz closes
const MAX_STEPS: usize = 4;

const CLOSING_RATIONALE: &str =
    "Perfetto! Ho abbastanza informazioni per consigliarti i prodotti giusti.";

/// Picks the next quiz question
///
/// The model proposes a question given the history; when it is unavailable or
/// answers off-format, a fixed decision tree over the answered topics takes
/// over, so the quiz always advances. Topics are never asked twice.
pub struct QuestionPlanner {
    generator: Arc<dyn TextGenerator>,
    lexicon: TopicLexicon,
}

impl QuestionPlanner {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            lexicon: TopicLexicon::italian(),
        }
    }

    pub async fn next(&self, answers: &[Answer], context: Option<&str>) -> QuestionStep {
        if answers.len() >= MAX_STEPS {
            return QuestionStep {
                question: String::new(),
                options: vec![],
                is_complete: true,
                rationale: Some(CLOSING_RATIONALE.to_string()),
            };
        }

        match self.generated_step(answers, context).await {
            Ok(step) if step.is_complete || !step.question.trim().is_empty() => step,
            Ok(_) => self.heuristic_step(answers),
            Err(err) => {
                warn!("Question generation failed, using the fixed tree: {}", err);
                self.heuristic_step(answers)
            }
        }
    }

    async fn generated_step(
        &self,
        answers: &[Answer],
        context: Option<&str>,
    ) -> Result<QuestionStep, OpenAiError> {
        let context_line = context
            .map(|c| format!("Contesto aggiuntivo: {}\n", c))
            .unwrap_or_default();
        let prompt = format!(
            "Sei l'assistente quiz di Meeple, negozio italiano di giochi da tavolo, carte \
             collezionabili, puzzle e LEGO. Il quiz serve a capire cosa consigliare.\n\
             Domande già poste e risposte:\n{}\n{}\n\
             Genera la prossima domanda del quiz. Rispondi SOLO con un oggetto JSON:\n\
             {{\"question\": \"...\", \"options\": [\"3-5 opzioni brevi\"], \
             \"isComplete\": false, \"rationale\": null}}\n\
             Non ripetere argomenti già chiesti. Domande brevi, in italiano.",
            transcript(answers),
            context_line
        );
        let raw = self
            .generator
            .generate(&prompt, GenerationParams::creative())
            .await?;
        let span = extract_json_span(&raw).ok_or(OpenAiError::InvalidResponse)?;
        serde_json::from_str(span).map_err(|_| OpenAiError::InvalidResponse)
    }

    /// Fixed decision tree: età, categoria, budget, then a category-specific
    /// question, then a closing preference question.
    fn heuristic_step(&self, answers: &[Answer]) -> QuestionStep {
        let answered = self.lexicon.answered_topics(answers);

        if !answered.contains(&Topic::Age) {
            return step(
                "Per chi è il regalo? Qual è la fascia d'età?",
                &["3-5 anni", "6-10 anni", "11-14 anni", "15+ anni"],
            );
        }
        if !answered.contains(&Topic::Category) {
            return step(
                "Che tipo di gioco ti interessa?",
                &[
                    "Carte collezionabili",
                    "Giochi da tavolo",
                    "Puzzle e costruzioni",
                    "Action figure",
                ],
            );
        }
        if !answered.contains(&Topic::Budget) {
            return step(
                "Quanto vorresti spendere?",
                &["Fino a 15€", "15-30€", "30-60€", "60-100€", "Oltre 100€"],
            );
        }

        if self.category_mentions(answers, &["carte", "tcg", "collezionabil"]) {
            if !answered.contains(&Topic::Brand) {
                return step(
                    "Quale marca di carte preferisci?",
                    &[
                        "Pokémon",
                        "Yu-Gi-Oh!",
                        "Magic: The Gathering",
                        "One Piece",
                        "Dragon Ball",
                    ],
                );
            }
            if !answered.contains(&Topic::Level) {
                return step(
                    "Qual è il livello di esperienza?",
                    &["Principiante", "Intermedio", "Esperto"],
                );
            }
        } else if self.category_mentions(answers, &["tavolo", "società", "societa"])
            && !answered.contains(&Topic::Style)
        {
            return step(
                "Che stile di gioco preferite?",
                &["Competitivo", "Cooperativo", "Party game", "Strategico"],
            );
        }

        step(
            "Cosa conta di più per te?",
            &["Qualità", "Prezzo", "Novità", "Marca"],
        )
    }

    fn category_mentions(&self, answers: &[Answer], needles: &[&str]) -> bool {
        answers
            .iter()
            .filter(|a| self.lexicon.classify(&a.question) == Topic::Category)
            .any(|a| {
                let text = a.answer.to_lowercase();
                needles.iter().any(|n| text.contains(n))
            })
    }
}

fn step(question: &str, options: &[&str]) -> QuestionStep {
    QuestionStep {
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        is_complete: false,
        rationale: None,
    }
}
