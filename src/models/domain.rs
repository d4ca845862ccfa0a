use serde::{Deserialize, Serialize};

/// One quiz step: the question the shopper saw and what they picked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
}

impl Answer {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Inbound answers payload, resolved once at the boundary.
///
/// The dynamic form (ordered question/answer pairs) is primary; the legacy
/// fixed-schema object is kept for backward compatibility with the old quiz.
/// Anything else fails deserialization and is rejected as a client error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerPayload {
    Dynamic(Vec<Answer>),
    Legacy(LegacyQuizAnswers),
}

impl AnswerPayload {
    /// Answers as a slice for transcript building; the legacy form has none.
    pub fn answers(&self) -> &[Answer] {
        match self {
            AnswerPayload::Dynamic(answers) => answers,
            AnswerPayload::Legacy(_) => &[],
        }
    }
}

/// Fixed-schema legacy quiz payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyQuizAnswers {
    #[serde(rename = "ageRange")]
    pub age_range: LegacyAgeRange,
    pub goal: LegacyGoal,
    #[serde(default)]
    pub materials: Vec<String>,
    pub usage: LegacyUsage,
    #[serde(rename = "budgetBand")]
    pub budget_band: LegacyBudgetBand,
    pub urgency: LegacyUrgency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegacyAgeRange {
    #[serde(rename = "0-6m")]
    Months0To6,
    #[serde(rename = "6-12m")]
    Months6To12,
    #[serde(rename = "1-3y")]
    Years1To3,
    #[serde(rename = "3-6y")]
    Years3To6,
    #[serde(rename = "6+y")]
    Years6Plus,
}

impl LegacyAgeRange {
    pub fn as_label(&self) -> &'static str {
        match self {
            LegacyAgeRange::Months0To6 => "0-6 mesi",
            LegacyAgeRange::Months6To12 => "6-12 mesi",
            LegacyAgeRange::Years1To3 => "1-3 anni",
            LegacyAgeRange::Years3To6 => "3-6 anni",
            LegacyAgeRange::Years6Plus => "6+ anni",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyGoal {
    Risparmio,
    #[serde(rename = "sostenibilità")]
    Sostenibilita,
    #[serde(rename = "comodità")]
    Comodita,
    Scorta,
    Regalo,
}

impl LegacyGoal {
    pub fn as_term(&self) -> &'static str {
        match self {
            LegacyGoal::Risparmio => "risparmio",
            LegacyGoal::Sostenibilita => "sostenibilità",
            LegacyGoal::Comodita => "comodità",
            LegacyGoal::Scorta => "scorta",
            LegacyGoal::Regalo => "regalo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyUsage {
    Basso,
    Medio,
    Alto,
}

impl LegacyUsage {
    pub fn as_term(&self) -> &'static str {
        match self {
            LegacyUsage::Basso => "basso",
            LegacyUsage::Medio => "medio",
            LegacyUsage::Alto => "alto",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegacyBudgetBand {
    #[serde(rename = "<20")]
    Under20,
    #[serde(rename = "20-40")]
    From20To40,
    #[serde(rename = "40-80")]
    From40To80,
    #[serde(rename = "80+")]
    Over80,
}

impl LegacyBudgetBand {
    /// Price bounds for the band; one side stays open at either end.
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        match self {
            LegacyBudgetBand::Under20 => (None, Some(20.0)),
            LegacyBudgetBand::From20To40 => (Some(20.0), Some(40.0)),
            LegacyBudgetBand::From40To80 => (Some(40.0), Some(80.0)),
            LegacyBudgetBand::Over80 => (Some(80.0), None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyUrgency {
    Oggi,
    #[serde(rename = "2-3gg")]
    DueTreGiorni,
    Settimana,
}

/// Structured search intent derived from the quiz answers
///
/// The shape matches what the LLM path is instructed to emit, so the same
/// type deserializes the mined JSON span. Always run through
/// [`crate::core::intent::normalize`] before use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Intent {
    #[serde(default)]
    pub search_terms: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub rationale: String,
}

impl Intent {
    /// True when the price satisfies every bound that is set.
    pub fn contains_price(&self, price: f64) -> bool {
        self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
    }

    /// True when at least one price bound is set.
    pub fn has_price_bounds(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }
}

/// Read-only view of a WooCommerce REST product
///
/// Prices come over the wire as strings; `effective_price` converts them.
/// The catalog owns these records, the pipeline never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub regular_price: Option<String>,
    #[serde(default)]
    pub sale_price: Option<String>,
    #[serde(default)]
    pub stock_status: Option<StockStatus>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub categories: Vec<ProductTerm>,
    #[serde(default)]
    pub tags: Vec<ProductTerm>,
}

impl CatalogProduct {
    /// Effective price in euro: the listed price (already sale-aware in Woo),
    /// else the sale price, else the regular price. None when no field parses.
    pub fn effective_price(&self) -> Option<f64> {
        price_to_number(self.price.as_deref())
            .or_else(|| price_to_number(self.sale_price.as_deref()))
            .or_else(|| price_to_number(self.regular_price.as_deref()))
    }

    pub fn in_stock(&self) -> bool {
        matches!(self.stock_status, Some(StockStatus::InStock))
    }
}

/// Converts a Woo price string to a number; empty or malformed values are
/// treated as unknown rather than zero.
pub fn price_to_number(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "instock")]
    InStock,
    #[serde(rename = "outofstock")]
    OutOfStock,
    #[serde(rename = "onbackorder")]
    OnBackorder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// WordPress taxonomy term (category or tag) attached to a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductTerm {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// One ranked recommendation, built fresh on every ranking pass
///
/// Scores carry the time-bucket perturbation, so they are not comparable
/// across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedProduct {
    pub id: u64,
    pub name: String,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub permalink: String,
    #[serde(rename = "addToCartUrl")]
    pub add_to_cart_url: String,
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Weights for the ranking signal sum
#[derive(Debug, Clone, Copy)]
pub struct RankingWeights {
    pub name_match: f64,
    pub description_match: f64,
    pub budget: f64,
    pub stock: f64,
    pub featured: f64,
    pub tag_match: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            name_match: 1.5,
            description_match: 1.0,
            budget: 2.0,
            stock: 1.5,
            featured: 1.0,
            tag_match: 3.0,
        }
    }
}
