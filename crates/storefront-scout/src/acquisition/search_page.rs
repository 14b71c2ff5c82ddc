//! Primary source: a storefront search results page rendered in a browser.
//!
//! Each fetch opens its own browser context, waits for the first result card
//! to appear, then parses the rendered HTML with the `scraper` crate.

use super::ProductSource;
use crate::config::AcquisitionConfig;
use crate::error::SourceError;
use crate::renderer::{RenderContext, Renderer};
use crate::types::Product;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// CSS selectors for one search result card.
#[derive(Debug, Clone)]
pub struct SearchSelectors {
    pub card: String,
    /// Anchor carrying the title text and the product link.
    pub link: String,
    /// Used for the title when the link has no text.
    pub heading: String,
    pub price: String,
    /// Element whose text reads like "4.5 out of 5 stars".
    pub rating: String,
}

impl Default for SearchSelectors {
    fn default() -> Self {
        Self {
            card: "[data-component-type='s-search-result']".to_string(),
            link: "h2 a.a-link-normal".to_string(),
            heading: "h2".to_string(),
            price: "span.a-price > span.a-offscreen".to_string(),
            rating: "span.a-icon-alt".to_string(),
        }
    }
}

/// Compiled form of [`SearchSelectors`].
struct CompiledSelectors {
    card: Selector,
    link: Selector,
    heading: Selector,
    price: Selector,
    rating: Selector,
}

impl CompiledSelectors {
    fn compile(s: &SearchSelectors) -> Result<Self, SourceError> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| SourceError::Decode(format!("bad selector {css:?}: {e}")))
        };
        Ok(Self {
            card: parse(&s.card)?,
            link: parse(&s.link)?,
            heading: parse(&s.heading)?,
            price: parse(&s.price)?,
            rating: parse(&s.rating)?,
        })
    }
}

/// Browser-driven search page source.
pub struct SearchPageSource {
    renderer: Arc<dyn Renderer>,
    search_url: String,
    selectors: SearchSelectors,
    navigation_timeout_ms: u64,
    wait_timeout_ms: u64,
}

impl SearchPageSource {
    pub fn new(renderer: Arc<dyn Renderer>, config: &AcquisitionConfig) -> Self {
        Self {
            renderer,
            search_url: config.search_url.clone(),
            selectors: config.selectors.clone(),
            navigation_timeout_ms: config.navigation_timeout_ms,
            wait_timeout_ms: config.wait_timeout_ms,
        }
    }

    /// Search URL for `query`, with the query form-encoded as `k`.
    pub fn search_url(&self, query: &str) -> Result<Url, SourceError> {
        Url::parse_with_params(&self.search_url, &[("k", query)])
            .map_err(|e| SourceError::Browser(format!("invalid search URL {}: {e}", self.search_url)))
    }

    async fn scrape(
        &self,
        ctx: &mut dyn RenderContext,
        url: &Url,
        max_results: usize,
    ) -> Result<Vec<Product>, SourceError> {
        ctx.navigate(url.as_str(), self.navigation_timeout_ms)
            .await
            .map_err(|e| SourceError::Browser(format!("{e:#}")))?;

        ctx.wait_for_selector(&self.selectors.card, self.wait_timeout_ms)
            .await
            .map_err(|e| {
                debug!("wait for result cards failed: {e:#}");
                SourceError::Timeout {
                    what: format!("result cards ({})", self.selectors.card),
                    timeout_ms: self.wait_timeout_ms,
                }
            })?;

        let html = ctx
            .get_html()
            .await
            .map_err(|e| SourceError::Browser(format!("{e:#}")))?;
        let page_url = ctx
            .get_url()
            .await
            .ok()
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());

        let products = parse_search_results(&html, &page_url, &self.selectors, max_results)?;
        if products.is_empty() {
            return Err(SourceError::NoResults);
        }
        Ok(products)
    }
}

#[async_trait]
impl ProductSource for SearchPageSource {
    fn name(&self) -> &str {
        "search page"
    }

    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Product>, SourceError> {
        let url = self.search_url(query)?;
        let mut ctx = self
            .renderer
            .new_context()
            .await
            .map_err(|e| SourceError::Browser(format!("{e:#}")))?;

        let result = self.scrape(ctx.as_mut(), &url, max_results).await;

        if let Err(e) = ctx.close().await {
            debug!("failed to close browser context: {e:#}");
        }
        result
    }
}

/// Parse up to `max_results` products out of a rendered results page.
///
/// Cards without a usable title are skipped.
pub fn parse_search_results(
    html: &str,
    page_url: &Url,
    selectors: &SearchSelectors,
    max_results: usize,
) -> Result<Vec<Product>, SourceError> {
    let compiled = CompiledSelectors::compile(selectors)?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&compiled.card)
        .take(max_results)
        .filter_map(|card| parse_card(card, page_url, &compiled))
        .collect())
}

fn parse_card(card: ElementRef<'_>, page_url: &Url, s: &CompiledSelectors) -> Option<Product> {
    let link = card.select(&s.link).next();

    let title = link
        .map(element_text)
        .filter(|t| !t.is_empty())
        .or_else(|| card.select(&s.heading).next().map(element_text))
        .filter(|t| !t.is_empty())?;

    let url = link
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| page_url.join(href).ok())
        .map(|u| u.to_string());

    let price = card
        .select(&s.price)
        .next()
        .and_then(|el| parse_price(&element_text(el)));

    let rating = card
        .select(&s.rating)
        .next()
        .and_then(|el| parse_rating(&element_text(el)));

    Some(Product {
        title,
        price,
        rating,
        url,
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a displayed price such as `"$1,299.99"`, `"1299.99 USD"` or
/// `"1.299,99 €"`.
///
/// The last `,` or `.` is the decimal mark unless it is followed by exactly
/// three digits and nothing else disambiguates it, in which case it groups
/// thousands. Negative amounts, ranges and malformed grouping give `None`.
pub fn parse_price(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.starts_with(|c: char| c == '-' || c == '\u{2212}') {
        return None;
    }

    let mut tokens = text
        .split(|c: char| !(c.is_ascii_digit() || is_separator(c)))
        .map(|t| t.trim_matches(is_separator))
        .filter(|t| !t.is_empty());
    let token = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }

    normalize_amount(token)?
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

fn is_separator(c: char) -> bool {
    c == ',' || c == '.'
}

/// Rewrite a digits-and-separators token into `f64` syntax.
fn normalize_amount(token: &str) -> Option<String> {
    let Some(i) = token.rfind(is_separator) else {
        return Some(token.to_string());
    };
    let sep = if token.as_bytes()[i] == b',' { ',' } else { '.' };
    let other = if sep == ',' { '.' } else { ',' };
    let (whole, fraction) = (&token[..i], &token[i + 1..]);

    if whole.contains(sep) || (!whole.contains(other) && fraction.len() == 3) {
        if token.contains(other) {
            return None;
        }
        return ungroup(token, sep);
    }

    let whole = if whole.contains(other) {
        ungroup(whole, other)?
    } else {
        whole.to_string()
    };
    Some(format!("{whole}.{fraction}"))
}

/// `"1,299,000"` -> `"1299000"`; groups after the first must be three digits.
fn ungroup(digits: &str, sep: char) -> Option<String> {
    let mut groups = digits.split(sep);
    let head = groups.next()?;
    if head.is_empty() || head.len() > 3 {
        return None;
    }
    let mut out = head.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        out.push_str(group);
    }
    Some(out)
}

/// Parse a rating such as `"4.5 out of 5 stars"`; values outside
/// `0.0..=5.0` are discarded.
pub fn parse_rating(text: &str) -> Option<f32> {
    text.split_whitespace()
        .next()
        .and_then(|tok| tok.replace(',', ".").parse::<f32>().ok())
        .filter(|r| (0.0..=5.0).contains(r))
}
