//! Tests for the tool executor

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use toolchat_agent::tools::{
    register_default_tools, HandlerResult, ParamSpec, ParamType, ToolDescriptor, ToolHandler,
    ToolRegistry, ToolSchema,
};
use toolchat_agent::ToolExecutor;
use toolchat_provider::{ToolInvocationRequest, ToolStatus};

fn registry_with(extra: Vec<ToolDescriptor>) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    register_default_tools(&mut registry).unwrap();
    for descriptor in extra {
        registry.register(descriptor).unwrap();
    }
    Arc::new(registry)
}

struct PanickyTool;

#[async_trait]
impl ToolHandler for PanickyTool {
    fn name(&self) -> &str {
        "panicky"
    }

    fn description(&self) -> &str {
        "Always panics"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
    }

    async fn call(&self, _input: &Map<String, Value>) -> HandlerResult {
        panic!("handler exploded");
    }
}

fn request(id: &str, tool: &str, input: Value) -> ToolInvocationRequest {
    ToolInvocationRequest::new(id, tool, input)
}

#[tokio::test]
async fn test_execute_success() {
    let executor = ToolExecutor::new(registry_with(vec![]));
    let result = executor
        .execute(&request(
            "c1",
            "calculator",
            json!({"expression": "3111696 / 74088"}),
        ))
        .await;

    assert_eq!(result.status(), ToolStatus::Success);
    assert_eq!(result.value(), Some(&json!(42)));
}

#[tokio::test]
async fn test_unknown_tool_runs_nothing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let spy = ToolDescriptor::from_fn("spy", "Counts calls", ToolSchema::new(), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(Value::Null) }
    });
    let executor = ToolExecutor::new(registry_with(vec![spy]));

    let result = executor.execute(&request("c1", "weather", json!({}))).await;

    assert_eq!(result.status(), ToolStatus::Error);
    assert!(result.error_message().unwrap().contains("unknown tool"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_validation_failure_skips_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let strict = ToolDescriptor::from_fn(
        "strict",
        "Needs a count",
        ToolSchema::new().param(ParamSpec::required("count", ParamType::Integer, "Count")),
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(Value::Null) }
        },
    );
    let executor = ToolExecutor::new(registry_with(vec![strict]));

    let missing = executor.execute(&request("c1", "strict", json!({}))).await;
    assert_eq!(
        missing.error_message(),
        Some("invalid input: missing required parameter 'count'")
    );

    let wrong_type = executor
        .execute(&request("c2", "strict", json!({"count": "three"})))
        .await;
    assert_eq!(
        wrong_type.error_message(),
        Some("invalid input: parameter 'count' must be of type integer, got string")
    );

    let not_object = executor.execute(&request("c3", "strict", json!([1]))).await;
    assert_eq!(
        not_object.error_message(),
        Some("invalid input: input must be a JSON object")
    );

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_handler_error_is_contained() {
    let executor = ToolExecutor::new(registry_with(vec![]));
    let result = executor
        .execute(&request(
            "c1",
            "letter_counter",
            json!({"word": "strawberry", "letter": "rr"}),
        ))
        .await;

    assert_eq!(result.status(), ToolStatus::Error);
    assert_eq!(
        result.error_message(),
        Some("tool execution failed: The 'letter' parameter must be a single character")
    );
}

#[tokio::test]
async fn test_handler_panic_is_contained() {
    let executor = ToolExecutor::new(registry_with(vec![ToolDescriptor::new(PanickyTool)]));

    let result = executor.execute(&request("c1", "panicky", json!({}))).await;

    assert_eq!(result.status(), ToolStatus::Error);
    assert!(result.error_message().unwrap().contains("handler exploded"));
}

#[tokio::test]
async fn test_timeout_is_contained() {
    let slow = ToolDescriptor::from_fn("slow", "Sleeps", ToolSchema::new(), |_| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(json!("done"))
    });
    let executor =
        ToolExecutor::new(registry_with(vec![slow])).with_timeout(Duration::from_millis(50));

    let started = Instant::now();
    let result = executor.execute(&request("c1", "slow", json!({}))).await;

    assert_eq!(result.status(), ToolStatus::Error);
    assert_eq!(result.error_message(), Some("tool timed out after 50ms"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_deeply_nested_expression_is_an_error_result() {
    let executor = ToolExecutor::new(registry_with(vec![]));
    let requests = vec![
        request("deep", "calculator", json!({"expression": "(".repeat(100_000)})),
        request("signs", "calculator", json!({"expression": "-".repeat(100_000)})),
        request("ok", "calculator", json!({"expression": "6 * 7"})),
    ];

    let results = executor.execute_round(&requests).await;

    assert_eq!(results[0].status(), ToolStatus::Error);
    assert_eq!(results[1].status(), ToolStatus::Error);
    assert_eq!(results[2].value(), Some(&json!(42)));
}

#[tokio::test]
async fn test_round_preserves_request_order() {
    let delayed = ToolDescriptor::from_fn(
        "delayed",
        "Sleeps for the given milliseconds",
        ToolSchema::new().param(ParamSpec::required("ms", ParamType::Integer, "Delay")),
        |input| async move {
            let ms = input["ms"].as_u64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(json!(ms))
        },
    );
    let executor = ToolExecutor::new(registry_with(vec![delayed]));

    let requests = vec![
        request("a", "delayed", json!({"ms": 120})),
        request("b", "weather", json!({})),
        request("c", "delayed", json!({"ms": 10})),
        request("d", "calculator", json!({"expression": "1/0"})),
    ];
    let results = executor.execute_round(&requests).await;

    let ids: Vec<&str> = results.iter().map(|r| r.invocation_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
    assert_eq!(results[0].value(), Some(&json!(120)));
    assert_eq!(results[1].status(), ToolStatus::Error);
    assert_eq!(results[2].value(), Some(&json!(10)));
    assert_eq!(results[3].status(), ToolStatus::Error);
}

#[tokio::test]
async fn test_round_runs_concurrently() {
    let nap = ToolDescriptor::from_fn("nap", "Sleeps 200ms", ToolSchema::new(), |_| async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(Value::Null)
    });
    let executor = ToolExecutor::new(registry_with(vec![nap]));

    let requests: Vec<_> = (0..5)
        .map(|i| request(&format!("c{}", i), "nap", json!({})))
        .collect();

    let started = Instant::now();
    let results = executor.execute_round(&requests).await;

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| r.is_success()));
    assert!(started.elapsed() < Duration::from_millis(900));
}

#[tokio::test]
async fn test_execute_is_idempotent_for_pure_tools() {
    let executor = ToolExecutor::new(registry_with(vec![]));
    let req = request(
        "c1",
        "letter_counter",
        json!({"word": "Mississippi", "letter": "s"}),
    );

    let first = executor.execute(&req).await;
    let second = executor.execute(&req).await;

    assert_eq!(first, second);
    assert_eq!(first.value(), Some(&json!(4)));
}
