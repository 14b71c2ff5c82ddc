//! Fallback source: a fixed JSON product catalog fetched over plain HTTP.
//!
//! Not a browser, just one GET. The catalog ignores the search query.

use super::search_page::parse_price;
use super::ProductSource;
use crate::config::AcquisitionConfig;
use crate::error::SourceError;
use crate::types::Product;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// One catalog entry. Only the title is required; everything else is
/// tolerated in whatever shape the catalog sends.
#[derive(Debug, Deserialize)]
struct CatalogItem {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, alias = "name")]
    title: Option<String>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    rating: Option<Value>,
}

/// HTTP client for the fallback catalog.
#[derive(Clone)]
pub struct CatalogSource {
    client: reqwest::Client,
    catalog_url: String,
}

impl CatalogSource {
    pub fn new(config: &AcquisitionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.catalog_timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("storefront-scout/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            catalog_url: config.catalog_url.clone(),
        }
    }

    fn to_product(&self, item: CatalogItem) -> Option<Product> {
        let title = item.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;

        let price = item.price.as_ref().and_then(number);
        let rating = item
            .rating
            .as_ref()
            .and_then(|r| match r {
                Value::Object(obj) => obj.get("rate").and_then(number),
                other => number(other),
            })
            .map(|r| r as f32)
            .filter(|r| (0.0..=5.0).contains(r));
        let url = item.id.as_ref().and_then(|id| match id {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        });
        let url = url.map(|id| format!("{}/{id}", self.catalog_url.trim_end_matches('/')));

        Some(Product {
            title,
            price,
            rating,
            url,
        })
    }
}

/// A non-negative number, or a string holding one. Strings go through the
/// same parser as displayed search-page prices.
fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite() && *n >= 0.0),
        Value::String(s) => parse_price(s),
        _ => None,
    }
}

#[async_trait]
impl ProductSource for CatalogSource {
    fn name(&self) -> &str {
        "fallback catalog"
    }

    async fn fetch(&self, _query: &str, max_results: usize) -> Result<Vec<Product>, SourceError> {
        debug!("GET {}", self.catalog_url);
        let resp = self.client.get(&self.catalog_url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let items: Vec<CatalogItem> = resp
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        Ok(items
            .into_iter()
            .filter_map(|item| self.to_product(item))
            .take(max_results)
            .collect())
    }
}
