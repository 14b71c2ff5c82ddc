//! Configuration loading and resolution.
//!
//! Every setting has a built-in default and an environment override. The
//! completion credential is deliberately not part of [`ScoutConfig`]; the
//! caller reads it once with [`credential_from_env`] and passes it to
//! [`crate::enrich`] explicitly.

use crate::acquisition::search_page::SearchSelectors;

pub const DEFAULT_SEARCH_URL: &str = "https://www.amazon.com/s";
pub const DEFAULT_CATALOG_URL: &str = "https://fakestoreapi.com/products";
pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Number of primary-source attempts before falling back.
pub const PRIMARY_ATTEMPTS: usize = 2;

/// Settings for both acquisition tiers.
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    /// Search page; the query is appended as `?k=<query>`.
    pub search_url: String,
    pub catalog_url: String,
    pub selectors: SearchSelectors,
    pub attempts: usize,
    pub navigation_timeout_ms: u64,
    /// Upper bound on waiting for the first result card to appear.
    pub wait_timeout_ms: u64,
    pub catalog_timeout_ms: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            selectors: SearchSelectors::default(),
            attempts: PRIMARY_ATTEMPTS,
            navigation_timeout_ms: 15_000,
            wait_timeout_ms: 12_000,
            catalog_timeout_ms: 10_000,
        }
    }
}

/// Settings for the completion service.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct ScoutConfig {
    pub acquisition: AcquisitionConfig,
    pub enrichment: EnrichmentConfig,
}

impl ScoutConfig {
    /// Defaults overridden by `SCOUT_SEARCH_URL`, `SCOUT_CATALOG_URL`,
    /// `OPENAI_BASE_URL` and `OPENAI_MODEL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();
        if let Some(url) = var("SCOUT_SEARCH_URL") {
            config.acquisition.search_url = url;
        }
        if let Some(url) = var("SCOUT_CATALOG_URL") {
            config.acquisition.catalog_url = url;
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            config.enrichment.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = var("OPENAI_MODEL") {
            config.enrichment.model = model;
        }
        config
    }
}

/// Read the completion credential from `OPENAI_API_KEY`.
///
/// Returns `None` when the variable is unset or blank.
pub fn credential_from_env() -> Option<String> {
    std::env::var("OPENAI_API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}
