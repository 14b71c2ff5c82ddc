//! Two-tier product acquisition.
//!
//! The primary source (a browser-rendered search page) is tried a fixed
//! number of times. Only when every attempt fails does the fallback source
//! (a JSON catalog) run, and its failure is the only error that escapes.

pub mod catalog;
pub mod search_page;

use crate::error::{AcquireError, SourceError};
use crate::types::Product;
use async_trait::async_trait;
use tracing::{info, warn};

/// Anything that can produce a list of products for a query.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;
    /// Fetch at most `max_results` products.
    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Product>, SourceError>;
}

/// Every primary attempt failed; holds one error per attempt.
#[derive(Debug)]
pub struct PrimaryExhausted {
    pub errors: Vec<SourceError>,
}

/// Primary source with bounded retries, composed with a fallback source.
pub struct Acquirer<P, F> {
    primary: P,
    fallback: F,
    attempts: usize,
}

impl<P: ProductSource, F: ProductSource> Acquirer<P, F> {
    pub fn new(primary: P, fallback: F, attempts: usize) -> Self {
        Self {
            primary,
            fallback,
            attempts: attempts.max(1),
        }
    }

    /// Acquire up to `max_results` products for `query`.
    pub async fn acquire(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Product>, AcquireError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let mut products = match self.primary_stage(query, max_results).await {
            Ok(products) => products,
            Err(exhausted) => {
                warn!(
                    "{} failed after {} attempt(s), falling back to {}",
                    self.primary.name(),
                    exhausted.errors.len(),
                    self.fallback.name()
                );
                self.fallback_stage(query, max_results, exhausted).await?
            }
        };

        products.truncate(max_results);
        Ok(products)
    }

    /// Try the primary source up to `attempts` times, one at a time.
    pub async fn primary_stage(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Product>, PrimaryExhausted> {
        let mut errors = Vec::with_capacity(self.attempts);

        for attempt in 1..=self.attempts {
            info!(
                "[attempt {attempt}/{}] fetching '{query}' from {}",
                self.attempts,
                self.primary.name()
            );
            match self.primary.fetch(query, max_results).await {
                Ok(products) if !products.is_empty() => {
                    info!("{} returned {} products", self.primary.name(), products.len());
                    return Ok(products);
                }
                Ok(_) => {
                    warn!("[attempt {attempt}/{}] {}", self.attempts, SourceError::NoResults);
                    errors.push(SourceError::NoResults);
                }
                Err(e) => {
                    warn!("[attempt {attempt}/{}] {} failed: {e}", self.attempts, self.primary.name());
                    errors.push(e);
                }
            }
        }

        Err(PrimaryExhausted { errors })
    }

    async fn fallback_stage(
        &self,
        query: &str,
        max_results: usize,
        exhausted: PrimaryExhausted,
    ) -> Result<Vec<Product>, AcquireError> {
        let products = self
            .fallback
            .fetch(query, max_results)
            .await
            .map_err(|source| AcquireError::FallbackFailed {
                primary_attempts: exhausted.errors.len(),
                source,
            })?;

        info!("{} returned {} products", self.fallback.name(), products.len());
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed sequence of outcomes and counts calls.
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<Vec<Product>, SourceError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<Vec<Product>, SourceError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductSource for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch(&self, _query: &str, max_results: usize) -> Result<Vec<Product>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.outcomes.lock().unwrap().pop_front();
            next.unwrap_or(Err(SourceError::NoResults)).map(|mut p| {
                p.truncate(max_results);
                p
            })
        }
    }

    fn products(n: usize) -> Vec<Product> {
        (0..n).map(|i| Product::titled(format!("Product {i}"))).collect()
    }

    #[tokio::test]
    async fn test_zero_max_results_touches_nothing() {
        let acquirer = Acquirer::new(Scripted::new(vec![]), Scripted::new(vec![]), 2);
        let result = acquirer.acquire("laptops", 0).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(acquirer.primary.calls(), 0);
        assert_eq!(acquirer.fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let acquirer = Acquirer::new(
            Scripted::new(vec![Ok(products(3))]),
            Scripted::new(vec![Ok(products(5))]),
            2,
        );
        let result = acquirer.acquire("laptops", 5).await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(acquirer.primary.calls(), 1);
        assert_eq!(acquirer.fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_attempt_recovers() {
        let acquirer = Acquirer::new(
            Scripted::new(vec![
                Err(SourceError::Browser("crashed".into())),
                Ok(products(2)),
            ]),
            Scripted::new(vec![]),
            2,
        );
        let result = acquirer.acquire("laptops", 5).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(acquirer.primary.calls(), 2);
        assert_eq!(acquirer.fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_primary_counts_as_failure() {
        let acquirer = Acquirer::new(
            Scripted::new(vec![Ok(vec![]), Ok(vec![])]),
            Scripted::new(vec![Ok(products(4))]),
            2,
        );
        let result = acquirer.acquire("laptops", 2).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(acquirer.primary.calls(), 2);
        assert_eq!(acquirer.fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_both_tiers_failing_is_fatal() {
        let acquirer = Acquirer::new(
            Scripted::new(vec![
                Err(SourceError::Timeout {
                    what: "cards".into(),
                    timeout_ms: 10,
                }),
                Err(SourceError::Browser("crashed".into())),
            ]),
            Scripted::new(vec![Err(SourceError::Status(500))]),
            2,
        );
        let err = acquirer.acquire("laptops", 5).await.unwrap_err();
        let AcquireError::FallbackFailed {
            primary_attempts,
            source,
        } = err;
        assert_eq!(primary_attempts, 2);
        assert!(matches!(source, SourceError::Status(500)));
    }

    #[tokio::test]
    async fn test_result_never_exceeds_max() {
        /// Ignores `max_results` on purpose.
        struct Greedy;

        #[async_trait]
        impl ProductSource for Greedy {
            fn name(&self) -> &str {
                "greedy"
            }
            async fn fetch(&self, _: &str, _: usize) -> Result<Vec<Product>, SourceError> {
                Ok(products(10))
            }
        }

        let acquirer = Acquirer::new(Greedy, Greedy, 2);
        for max in 1..=12 {
            let result = acquirer.acquire("laptops", max).await.unwrap();
            assert!(result.len() <= max);
        }
    }
}
