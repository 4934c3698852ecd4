use std::sync::Arc;
use std::time::Duration;

use heel::inference::providers::today;
use heel::inference::{
    AttemptEvent, CompletionClient, CompletionError, CompletionProvider, CompletionRequest,
    Conversation, OpenRouterProvider, RequestConfig,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

const SYSTEM_PROMPT: &str = "You are a dog trainer. Today is {date}.";

fn create_test_conversation() -> Conversation {
    let mut conversation = Conversation::new();
    conversation.push_user("How do I stop leash pulling?");
    conversation
}

fn config(max_retries: u8) -> RequestConfig {
    RequestConfig::new("test-model", 0.5, max_retries, Some("sk-or-test".into()))
}

fn provider(server: &MockServer) -> OpenRouterProvider {
    OpenRouterProvider::new(Some(server.uri()), SYSTEM_PROMPT)
        .with_identity("https://example.test/heel", "Heel Tests")
}

fn client(server: &MockServer) -> CompletionClient {
    CompletionClient::new(Arc::new(provider(server))).with_backoff(Duration::from_millis(1))
}

fn reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "gen-1",
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

// ============================================================================
// OpenRouter Provider Tests
// ============================================================================

#[tokio::test]
async fn test_openrouter_successful_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(reply("**Goal:** loose leash walking"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let conversation = create_test_conversation();
    let result = client(&mock_server).complete(&conversation, &config(2)).await;

    assert_eq!(result, Ok("**Goal:** loose leash walking".to_string()));
}

#[tokio::test]
async fn test_openrouter_sends_headers_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-or-test"))
        .and(header("HTTP-Referer", "https://example.test/heel"))
        .and(header("X-Title", "Heel Tests"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "temperature": 0.5,
            "response_format": { "type": "text" }
        })))
        .respond_with(reply("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let conversation = create_test_conversation();
    let single = config(1);
    let request = CompletionRequest {
        conversation: &conversation,
        config: &single,
    };
    let result = provider(&mock_server).complete_once(request).await;
    assert_eq!(result, Ok("ok".to_string()));

    let received = mock_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["role"], "system");
    let system = messages[0]["content"].as_str().unwrap();
    assert!(system.contains(&today()), "date not filled in: {system}");
    assert!(!system.contains("{date}"));
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[2]["role"], "user");
    assert_eq!(messages[2]["content"], "How do I stop leash pulling?");
}

#[tokio::test]
async fn test_openrouter_malformed_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let conversation = create_test_conversation();
    let single = config(1);
    let request = CompletionRequest {
        conversation: &conversation,
        config: &single,
    };
    let result = provider(&mock_server).complete_once(request).await;

    assert!(matches!(result, Err(CompletionError::Decode(_))));
}

#[tokio::test]
async fn test_openrouter_missing_content_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&mock_server)
        .await;

    let conversation = create_test_conversation();
    let single = config(1);
    let request = CompletionRequest {
        conversation: &conversation,
        config: &single,
    };
    let result = provider(&mock_server).complete_once(request).await;

    assert!(matches!(result, Err(CompletionError::Decode(_))));
}

// ============================================================================
// Retry Loop Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_bodies_are_retried_until_valid() {
    let mock_server = MockServer::start().await;

    // Mounted first, so it answers until its two uses run out
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"choices\": "))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(reply("Step 1: stop when the leash is tight"))
        .mount(&mock_server)
        .await;

    let conversation = create_test_conversation();
    let mut events = Vec::new();
    let result = client(&mock_server)
        .complete_observed(&conversation, &config(3), |event| events.push(event))
        .await;

    assert_eq!(result, Ok("Step 1: stop when the leash is tight".to_string()));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);

    let failures: Vec<u8> = events
        .iter()
        .filter_map(|event| match event {
            AttemptEvent::Finished(attempt) if !attempt.succeeded() => Some(attempt.number),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec![1, 2]);
}

#[tokio::test]
async fn test_decode_errors_exhaust_retry_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let conversation = create_test_conversation();
    let result = client(&mock_server).complete(&conversation, &config(2)).await;

    assert!(matches!(result, Err(CompletionError::Decode(_))));
}

#[tokio::test]
async fn test_http_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let conversation = create_test_conversation();
    let result = client(&mock_server).complete(&conversation, &config(2)).await;

    match result {
        Err(CompletionError::Network(msg)) => {
            assert!(msg.contains("500"), "status missing from: {msg}");
            assert!(msg.contains("upstream exploded"));
        }
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(reply("late").set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let provider = provider(&mock_server).with_timeout(Duration::from_millis(50));
    let client = CompletionClient::new(Arc::new(provider)).with_backoff(Duration::from_millis(1));

    let conversation = create_test_conversation();
    let result = client.complete(&conversation, &config(3)).await;

    assert!(matches!(result, Err(CompletionError::Network(_))));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_credential_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(reply("should not be reached"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let conversation = create_test_conversation();
    let no_key = RequestConfig::new("test-model", 0.5, 3, Some("   ".into()));
    let result = client(&mock_server).complete(&conversation, &no_key).await;

    assert_eq!(result, Err(CompletionError::MissingCredential));
}
