//! Backends against a local mock HTTP server

use scout_provider::{
    ChatParams, Message, OllamaProvider, OpenRouterProvider, Provider, ProviderError,
    ResponseFormat,
};
use std::time::Duration;

fn json_params() -> ChatParams {
    ChatParams {
        messages: vec![Message::system("sys"), Message::user("Goal: test")],
        response_format: ResponseFormat::Json,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_ollama_chat_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/chat")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"format": "json", "stream": false}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"message": {"role": "assistant", "content": "{\"done\": true}"}, "done": true, "eval_count": 3}"#,
        )
        .create_async()
        .await;

    let provider = OllamaProvider::new(server.url(), "llama3.1:8b")
        .with_timeout(Duration::from_secs(5));
    let reply = provider.chat(json_params()).await.unwrap();

    assert_eq!(reply.content.as_deref(), Some("{\"done\": true}"));
    assert_eq!(reply.usage.completion_tokens, 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_ollama_chat_api_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/chat")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "model 'nope' not found"}"#)
        .create_async()
        .await;

    let provider = OllamaProvider::new(server.url(), "nope");
    match provider.chat(json_params()).await {
        Err(ProviderError::Api(msg)) => assert!(msg.contains("not found")),
        other => panic!("unexpected: {:?}", other.map(|r| r.content)),
    }
}

#[tokio::test]
async fn test_openrouter_chat_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"response_format": {"type": "json_object"}}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"choices": [{"message": {"content": "{\"tool\": \"query_database\"}"}, "finish_reason": "stop"}]}"#,
        )
        .create_async()
        .await;

    let provider = OpenRouterProvider::new("sk-test", Some(server.url()), Some("m".to_string()));
    let reply = provider.chat(json_params()).await.unwrap();

    assert_eq!(
        reply.content.as_deref(),
        Some("{\"tool\": \"query_database\"}")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openrouter_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let provider = OpenRouterProvider::new("sk-test", Some(server.url()), None);
    assert!(matches!(
        provider.chat(json_params()).await,
        Err(ProviderError::RateLimited)
    ));
}
