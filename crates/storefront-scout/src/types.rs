//! Product records and the AI fields attached to them.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single product listing as acquired from a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    /// `None` when the listing carried no price or it could not be parsed.
    pub price: Option<f64>,
    /// Star rating in `0.0..=5.0`.
    pub rating: Option<f32>,
    pub url: Option<String>,
}

impl Product {
    /// Create a product with only a title set.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price: None,
            rating: None,
            url: None,
        }
    }
}

/// The fixed set of labels the categorizer may assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Budget,
    Gaming,
    Professional,
    General,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Budget,
        Category::Gaming,
        Category::Professional,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Budget => "budget",
            Category::Gaming => "gaming",
            Category::Professional => "professional",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().trim_matches(|c: char| c == '"' || c == '.').to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .ok_or_else(|| format!("unrecognized category label: {s:?}"))
    }
}

/// Why an AI field holds its placeholder instead of a real value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderReason {
    /// No credential was supplied, so no request was made.
    NoCredential,
    /// The request was made and failed.
    Failed(String),
}

/// An AI field that has a documented placeholder.
pub trait AiField: Serialize {
    /// Value written in place of the field when enrichment is skipped or fails.
    const PLACEHOLDER: &'static str;
}

impl AiField for Category {
    const PLACEHOLDER: &'static str = "unknown";
}

impl AiField for String {
    const PLACEHOLDER: &'static str = "not available";
}

/// Outcome of enriching one field of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome<T> {
    Value(T),
    Placeholder(PlaceholderReason),
}

impl<T> FieldOutcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            FieldOutcome::Value(v) => Some(v),
            FieldOutcome::Placeholder(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, FieldOutcome::Placeholder(_))
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for FieldOutcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => FieldOutcome::Value(v),
            Err(e) => FieldOutcome::Placeholder(PlaceholderReason::Failed(e.to_string())),
        }
    }
}

impl<T: AiField> Serialize for FieldOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldOutcome::Value(v) => v.serialize(serializer),
            FieldOutcome::Placeholder(_) => serializer.serialize_str(T::PLACEHOLDER),
        }
    }
}

/// A product with both AI fields attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedProduct {
    #[serde(flatten)]
    pub product: Product,
    pub ai_category: FieldOutcome<Category>,
    pub ai_sentiment: FieldOutcome<String>,
}

impl EnrichedProduct {
    /// Drop the AI fields and return the scraped record.
    pub fn into_product(self) -> Product {
        self.product
    }
}
