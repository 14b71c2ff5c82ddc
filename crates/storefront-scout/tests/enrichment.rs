//! Enrichment integration tests against a mocked chat-completions endpoint.

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storefront_scout::{
    enrich, suggest_selector, Category, CompletionClient, CompletionError, EnrichmentConfig,
    FieldOutcome, PlaceholderReason, Product,
};

// ─────────────────────── helpers ───────────────────────

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

/// Matches only the categorization request.
fn category_request() -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("product classifier"))
}

/// Matches only the sentiment request.
fn sentiment_request() -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("sentiment summary"))
}

fn config_for(server: &MockServer) -> EnrichmentConfig {
    EnrichmentConfig {
        base_url: format!("{}/v1", server.uri()),
        ..EnrichmentConfig::default()
    }
}

fn sample_products() -> Vec<Product> {
    vec![
        Product {
            title: "Gaming Laptop 15.6 inch".into(),
            price: Some(999.99),
            rating: Some(4.5),
            url: Some("https://example.com/product/1".into()),
        },
        Product {
            title: "Budget Wireless Mouse".into(),
            price: Some(12.99),
            rating: Some(3.8),
            url: Some("https://example.com/product/2".into()),
        },
    ]
}

// ─────────────────────── enrich ───────────────────────

#[tokio::test]
async fn empty_credential_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(r#"{"category": "gaming"}"#))
        .expect(0)
        .mount(&server)
        .await;

    for credential in [None, Some("")] {
        let enriched = enrich(sample_products(), credential, &config_for(&server)).await;
        assert_eq!(enriched.len(), 2);
        for record in &enriched {
            let json = serde_json::to_value(record).unwrap();
            assert_eq!(json["ai_category"], "unknown");
            assert_eq!(json["ai_sentiment"], "not available");
        }
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn credential_yields_category_and_sentiment() {
    let server = MockServer::start().await;
    category_request()
        .and(header("authorization", "Bearer sk-test-key"))
        .respond_with(completion(r#"{"category": "gaming"}"#))
        .expect(2)
        .mount(&server)
        .await;
    sentiment_request()
        .respond_with(completion(r#"{"sentiment": "Highly rated and well liked."}"#))
        .expect(2)
        .mount(&server)
        .await;

    let enriched = enrich(sample_products(), Some("sk-test-key"), &config_for(&server)).await;

    assert_eq!(enriched.len(), 2);
    assert_eq!(enriched[0].product.title, "Gaming Laptop 15.6 inch");
    assert_eq!(enriched[1].product.title, "Budget Wireless Mouse");
    for record in &enriched {
        let category = record.ai_category.value().expect("category should be set");
        assert!(Category::ALL.contains(category));
        assert_eq!(
            record.ai_sentiment.value().map(String::as_str),
            Some("Highly rated and well liked.")
        );
    }
}

#[tokio::test]
async fn category_failure_keeps_sentiment() {
    let server = MockServer::start().await;
    category_request()
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream error"))
        .mount(&server)
        .await;
    sentiment_request()
        .respond_with(completion(r#"{"sentiment": "Decent mouse for the price."}"#))
        .mount(&server)
        .await;

    let enriched = enrich(
        vec![sample_products().remove(1)],
        Some("sk-test-key"),
        &config_for(&server),
    )
    .await;

    assert!(matches!(
        enriched[0].ai_category,
        FieldOutcome::Placeholder(PlaceholderReason::Failed(_))
    ));
    assert_eq!(
        enriched[0].ai_sentiment,
        FieldOutcome::Value("Decent mouse for the price.".to_string())
    );

    let json = serde_json::to_value(&enriched[0]).unwrap();
    assert_eq!(json["ai_category"], "unknown");
    assert_eq!(json["ai_sentiment"], "Decent mouse for the price.");
}

#[tokio::test]
async fn sentiment_failure_keeps_category() {
    let server = MockServer::start().await;
    category_request()
        .respond_with(completion("budget"))
        .mount(&server)
        .await;
    sentiment_request()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let enriched = enrich(sample_products(), Some("sk-test-key"), &config_for(&server)).await;

    for record in &enriched {
        assert_eq!(record.ai_category, FieldOutcome::Value(Category::Budget));
        assert!(record.ai_sentiment.is_placeholder());
    }
}

#[tokio::test]
async fn unknown_label_becomes_placeholder() {
    let server = MockServer::start().await;
    category_request()
        .respond_with(completion(r#"{"category": "luxury"}"#))
        .mount(&server)
        .await;
    sentiment_request()
        .respond_with(completion("not valid json but still a sentence."))
        .mount(&server)
        .await;

    let enriched = enrich(sample_products(), Some("sk-test-key"), &config_for(&server)).await;

    assert!(enriched[0].ai_category.is_placeholder());
    assert_eq!(
        enriched[0].ai_sentiment.value().map(String::as_str),
        Some("not valid json but still a sentence.")
    );
}

#[tokio::test]
async fn re_enriching_is_stable() {
    let server = MockServer::start().await;
    category_request()
        .respond_with(completion(r#"{"category": "professional"}"#))
        .mount(&server)
        .await;
    sentiment_request()
        .respond_with(completion(r#"{"sentiment": "Reliable choice."}"#))
        .mount(&server)
        .await;
    let config = config_for(&server);

    let first = enrich(sample_products(), Some("sk-test-key"), &config).await;
    let again = enrich(
        first.iter().cloned().map(|e| e.into_product()).collect(),
        Some("sk-test-key"),
        &config,
    )
    .await;

    assert_eq!(first, again);
}

// ─────────────────────── suggest_selector ───────────────────────

#[tokio::test]
async fn suggest_selector_returns_reply_unmodified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("div.old-price"))
        .and(body_string_contains("new-price"))
        .respond_with(completion("span.new-price"))
        .expect(1)
        .mount(&server)
        .await;

    let client = CompletionClient::new("sk-test-key", &config_for(&server));
    let selector = suggest_selector(
        &client,
        "div.old-price",
        "<span class='new-price'>$10</span>",
    )
    .await
    .unwrap();

    assert_eq!(selector, "span.new-price");
}

#[tokio::test]
async fn suggest_selector_reads_json_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(r#"{"selector": "h2.product-title a"}"#))
        .mount(&server)
        .await;

    let client = CompletionClient::new("sk-test-key", &config_for(&server));
    let selector = suggest_selector(&client, "h2.old a", "<div><h2 class='product-title'><a>Link</a></h2></div>")
        .await
        .unwrap();

    assert_eq!(selector, "h2.product-title a");
}

#[tokio::test]
async fn suggest_selector_propagates_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let client = CompletionClient::new("sk-test-key", &config_for(&server));
    let err = suggest_selector(&client, "div.old", "<div></div>").await.unwrap_err();

    match err {
        CompletionError::Api { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn suggest_selector_without_key_is_a_config_error() {
    let server = MockServer::start().await;
    let client = CompletionClient::new("", &config_for(&server));

    let err = suggest_selector(&client, "div.old", "<div></div>").await.unwrap_err();

    assert!(matches!(err, CompletionError::Config(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
