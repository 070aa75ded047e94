//! OpenAI-compatible engine tests against a local mock HTTP server

use serde_json::json;
use toolchat_provider::{Decision, OpenAiProvider, Provider, ProviderError, ReasoningRequest};

#[tokio::test]
async fn test_decide_final_answer_over_http() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{"message": {"role": "assistant", "content": "Hi there"}, "finish_reason": "stop"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let provider = OpenAiProvider::new("sk-test", Some(server.url()), "test-model");
    let decision = provider.decide(ReasoningRequest::new("Hello")).await.unwrap();

    assert_eq!(decision, Decision::FinalAnswer("Hi there".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_decide_tool_calls_over_http() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_xyz",
                            "type": "function",
                            "function": {"name": "calculator", "arguments": "{\"expression\":\"3111696 / 74088\"}"}
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let provider = OpenAiProvider::new("sk-test", Some(server.url()), "test-model");
    match provider.decide(ReasoningRequest::new("divide")).await.unwrap() {
        Decision::ToolCalls(calls) => {
            assert_eq!(calls[0].id, "call_xyz");
            assert_eq!(calls[0].arguments["expression"], "3111696 / 74088");
        }
        other => panic!("Expected tool calls, got {:?}", other),
    }
}

#[tokio::test]
async fn test_decide_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let provider = OpenAiProvider::new("sk-test", Some(server.url()), "test-model");
    let result = provider.decide(ReasoningRequest::new("hi")).await;
    assert!(matches!(result, Err(ProviderError::RateLimited)));
}

#[tokio::test]
async fn test_decide_api_error_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(json!({"error": {"message": "model not found"}}).to_string())
        .create_async()
        .await;

    let provider = OpenAiProvider::new("sk-test", Some(server.url()), "missing-model");
    match provider.decide(ReasoningRequest::new("hi")).await {
        Err(ProviderError::Api(message)) => assert_eq!(message, "model not found"),
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_decide_malformed_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"unexpected": true}).to_string())
        .create_async()
        .await;

    let provider = OpenAiProvider::new("sk-test", Some(server.url()), "test-model");
    let result = provider.decide(ReasoningRequest::new("hi")).await;
    assert!(matches!(result, Err(ProviderError::InvalidResponse)));
}
