//! AI enrichment of acquired products.
//!
//! Each record gets an `ai_category` and an `ai_sentiment`. The two fields
//! are requested separately and fail separately; a failed or skipped field
//! holds its placeholder and the run carries on.

pub mod completion;

use crate::config::EnrichmentConfig;
use crate::error::CompletionError;
use crate::types::{Category, EnrichedProduct, FieldOutcome, PlaceholderReason, Product};
use completion::CompletionClient;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

/// Longest HTML snippet forwarded to [`suggest_selector`], in characters.
pub const MAX_SNIPPET_CHARS: usize = 6000;

const CATEGORY_SYSTEM: &str = "You are a product classifier. Assign exactly one category \
     from: budget, gaming, professional, general. \
     Respond with a JSON object: {\"category\": \"<label>\"}.";

const SENTIMENT_SYSTEM: &str = "Write a concise one-sentence sentiment summary of a product \
     based on its title and its rating out of 5. \
     Respond with a JSON object: {\"sentiment\": \"<sentence>\"}.";

const SELECTOR_SYSTEM: &str = "You are an expert web scraping assistant. \
     Given a broken CSS or XPath selector and an HTML snippet, \
     return a JSON object: {\"selector\": \"<corrected selector>\"}. \
     No explanation, just the corrected selector.";

/// Attach AI fields to every product, preserving order.
///
/// With no credential (or a blank one) every field gets its placeholder and
/// nothing is sent over the network.
pub async fn enrich(
    products: Vec<Product>,
    credential: Option<&str>,
    config: &EnrichmentConfig,
) -> Vec<EnrichedProduct> {
    let Some(key) = credential.map(str::trim).filter(|k| !k.is_empty()) else {
        warn!("no completion credential set; skipping AI enrichment");
        return products.into_iter().map(skipped).collect();
    };

    let client = CompletionClient::new(key, config);
    let mut enriched = Vec::with_capacity(products.len());
    for product in products {
        enriched.push(enrich_one(&client, product).await);
    }
    info!("AI enrichment complete for {} products", enriched.len());
    enriched
}

fn skipped(product: Product) -> EnrichedProduct {
    EnrichedProduct {
        product,
        ai_category: FieldOutcome::Placeholder(PlaceholderReason::NoCredential),
        ai_sentiment: FieldOutcome::Placeholder(PlaceholderReason::NoCredential),
    }
}

/// Enrich a single record; each field fails independently.
pub async fn enrich_one(client: &CompletionClient, product: Product) -> EnrichedProduct {
    let category = categorize(client, &product).await;
    if let Err(e) = &category {
        warn!("categorization failed for '{}': {e}", product.title);
    }

    let sentiment = summarize(client, &product).await;
    if let Err(e) = &sentiment {
        warn!("sentiment summary failed for '{}': {e}", product.title);
    }

    EnrichedProduct {
        product,
        ai_category: category.into(),
        ai_sentiment: sentiment.into(),
    }
}

/// Ask for one of the fixed category labels.
pub async fn categorize(
    client: &CompletionClient,
    product: &Product,
) -> Result<Category, CompletionError> {
    let user = json!({
        "title": product.title,
        "price": product.price,
        "rating": product.rating,
    })
    .to_string();

    let raw = client.chat(CATEGORY_SYSTEM, &user, 50).await?;
    let label = extract_field(&raw, "category");
    label.parse::<Category>().map_err(CompletionError::Parse)
}

/// Ask for a one-sentence sentiment summary.
pub async fn summarize(
    client: &CompletionClient,
    product: &Product,
) -> Result<String, CompletionError> {
    let user = json!({
        "title": product.title,
        "rating": product.rating,
    })
    .to_string();

    let raw = client.chat(SENTIMENT_SYSTEM, &user, 150).await?;
    let sentence = extract_field(&raw, "sentiment");
    if sentence.is_empty() {
        return Err(CompletionError::Parse("empty sentiment".into()));
    }
    Ok(sentence)
}

/// Ask the model to repair a selector that no longer matches.
///
/// Returns the `selector` field of the reply, or the reply text unchanged
/// when it is not that JSON object.
pub async fn suggest_selector(
    client: &CompletionClient,
    broken_selector: &str,
    html_snippet: &str,
) -> Result<String, CompletionError> {
    let user = format!(
        "Broken selector: {broken_selector}\n\nHTML snippet:\n{}",
        truncate_chars(html_snippet, MAX_SNIPPET_CHARS)
    );
    let raw = client.chat(SELECTOR_SYSTEM, &user, 100).await?;

    #[derive(Deserialize)]
    struct Suggestion {
        selector: String,
    }

    Ok(serde_json::from_str::<Suggestion>(&raw)
        .map(|s| s.selector)
        .unwrap_or(raw))
}

/// Pull `key` out of a JSON object reply, or treat the whole reply as the
/// value when it is plain text.
fn extract_field(raw: &str, key: &str) -> String {
    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(obj)) => obj
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_default(),
        Ok(serde_json::Value::String(s)) => s,
        _ => raw.to_string(),
    };
    value.trim().trim_matches('"').trim().to_string()
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
