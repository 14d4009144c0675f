//! Integration tests for `GeminiClient` against the fake generation server.

use serde_json::json;

use reskill_core::genai::{FALLBACK_REPLY, GeminiClient, GenerationConfig, GenerationError, Generator};
use reskill_test_utils::{FakeGemini, GeminiReply};

fn client(fake: &FakeGemini) -> GeminiClient {
    let mut config = GenerationConfig::new("test-key");
    config.endpoint = fake.endpoint();
    config.timeout_secs = Some(10);
    GeminiClient::new(config).unwrap()
}

#[tokio::test]
async fn returns_first_candidate_text() {
    let fake = FakeGemini::start().await;
    fake.push_text("Olá! Vamos estudar.");

    let reply = client(&fake).generate("diga oi").await.unwrap();
    assert_eq!(reply, "Olá! Vamos estudar.");

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gemini-2.0-flash");
    assert_eq!(requests[0].key.as_deref(), Some("test-key"));
    assert_eq!(requests[0].prompt(), Some("diga oi"));
    assert!(!requests[0].json_mode());
}

#[tokio::test]
async fn json_mode_sets_response_mime_type() {
    let fake = FakeGemini::start().await;
    fake.push_text("{\"items\":[]}");

    let reply = client(&fake).generate_json("notícias").await.unwrap();
    assert_eq!(reply, "{\"items\":[]}");
    assert!(fake.requests()[0].json_mode());
}

#[tokio::test]
async fn missing_candidates_use_fallback() {
    let fake = FakeGemini::start().await;
    fake.push(GeminiReply::Body(json!({ "candidates": [] })));
    fake.push(GeminiReply::Body(json!({ "promptFeedback": { "blockReason": "SAFETY" } })));

    let gemini = client(&fake);
    assert_eq!(gemini.generate("a").await.unwrap(), FALLBACK_REPLY);
    assert_eq!(gemini.generate("b").await.unwrap(), FALLBACK_REPLY);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let fake = FakeGemini::start().await;
    fake.push(GeminiReply::Status(429, "{\"error\":\"quota\"}".into()));

    let err = client(&fake).generate("x").await.unwrap_err();
    assert_eq!(err.status(), Some(429));
    assert_eq!(err.to_string(), "Erro Gemini: 429 - {\"error\":\"quota\"}");
}

#[tokio::test]
async fn non_json_body_is_invalid() {
    let fake = FakeGemini::start().await;
    fake.push(GeminiReply::Status(200, "not json".into()));

    let err = client(&fake).generate("x").await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidBody(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let mut config = GenerationConfig::new("k");
    config.endpoint = "http://127.0.0.1:9/v1beta".into();
    config.timeout_secs = Some(5);
    let err = GeminiClient::new(config).unwrap().generate("x").await.unwrap_err();
    assert!(matches!(err, GenerationError::Transport(_)));
}
