use crate::models::Answer;
use std::collections::HashSet;

/// Topic of a quiz question, inferred from its text alone
///
/// Inference is a pure function of the question wording, never of its
/// position in the quiz, so repeated or re-ordered questions classify the
/// same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Age,
    Budget,
    Category,
    Brand,
    Level,
    Style,
    Family,
    Occasion,
    Other,
}

/// Keyword table mapping question substrings to topics
///
/// Kept apart from the scoring code so the vocabulary can grow (or be
/// swapped per locale) without touching the ranking logic. Entries are
/// checked in order; the first topic with a matching keyword wins.
#[derive(Debug, Clone)]
pub struct TopicLexicon {
    entries: &'static [(Topic, &'static [&'static str])],
}

/// Default vocabulary for the Italian shop quiz. Stems like `categor` cover
/// both `categoria` and the English `category` used by older clients.
/// Brand and style come before category: their questions usually also
/// mention games or cards.
const ITALIAN_ENTRIES: &[(Topic, &[&str])] = &[
    (Topic::Age, &["età", "eta", "bambino", "age"]),
    (Topic::Budget, &["budget", "prezzo", "spendere"]),
    (Topic::Brand, &["marca", "brand"]),
    (Topic::Style, &["competitivo", "stile"]),
    (Topic::Category, &["tipo", "categor", "gioc", "carte"]),
    (Topic::Level, &["livello", "difficolt", "esperienza"]),
    (Topic::Family, &["famiglia", "family"]),
    (Topic::Occasion, &["regalo", "occasione"]),
];

impl TopicLexicon {
    pub const fn new(entries: &'static [(Topic, &'static [&'static str])]) -> Self {
        Self { entries }
    }

    pub fn italian() -> Self {
        Self::new(ITALIAN_ENTRIES)
    }

    /// Classify a question by keyword membership.
    #[inline]
    pub fn classify(&self, question: &str) -> Topic {
        let question = question.to_lowercase();
        for (topic, keywords) in self.entries {
            if keywords.iter().any(|k| question.contains(k)) {
                return *topic;
            }
        }
        Topic::Other
    }

    /// Set of topics already covered by the given answers.
    pub fn answered_topics(&self, answers: &[Answer]) -> HashSet<Topic> {
        answers
            .iter()
            .map(|a| self.classify(&a.question))
            .collect()
    }
}

impl Default for TopicLexicon {
    fn default() -> Self {
        Self::italian()
    }
}
