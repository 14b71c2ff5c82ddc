//! Storefront Scout — product listing acquisition with a catalog fallback and
//! optional LLM enrichment.

pub mod acquisition;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod renderer;
pub mod types;

pub use acquisition::catalog::CatalogSource;
pub use acquisition::search_page::{SearchPageSource, SearchSelectors};
pub use acquisition::{Acquirer, ProductSource};
pub use config::{credential_from_env, AcquisitionConfig, EnrichmentConfig, ScoutConfig};
pub use enrichment::completion::CompletionClient;
pub use enrichment::{enrich, suggest_selector};
pub use error::{AcquireError, CompletionError, SourceError};
pub use types::*;
