//! OpenAI-compatible client against a local fake upstream

mod common;

use std::time::Duration;

use common::{
    finish_chunk, text_answer, tool_call_chunk, usage_chunk, CannedResponse, FakeUpstream,
};
use futures::StreamExt;
use serde_json::json;
use weatrip::llm::{
    ContentBlockStart, ContentDelta, FinishReason, GenerateRequest, GenerationConfig, LlmError,
    LlmProvider, Message, OpenAiClient, OpenAiConfig, StreamEvent, ToolDeclaration,
};

fn client(upstream: &FakeUpstream) -> OpenAiClient {
    OpenAiClient::new(
        OpenAiConfig::new("sk-test", format!("{}/v1/", upstream.base_url), "deepseek-chat")
            .with_max_retries(1)
            .with_request_timeout(Duration::from_secs(5)),
    )
    .unwrap()
}

fn request(text: &str) -> GenerateRequest {
    GenerateRequest {
        messages: vec![Message::user(text)],
        tools: Some(vec![ToolDeclaration {
            name: "get_weather".to_string(),
            description: "Current weather".to_string(),
            input_schema: json!({"type": "object", "properties": {"city": {"type": "string"}}}),
        }]),
        config: GenerationConfig::new(256).with_temperature(0.2),
        system: Some("You are a weather assistant.".to_string()),
    }
}

async fn collect(client: &OpenAiClient, request: GenerateRequest) -> Vec<StreamEvent> {
    let stream = client.stream_generate(request).await.unwrap();
    stream.map(|e| e.unwrap()).collect().await
}

#[tokio::test]
async fn test_text_stream() {
    let upstream = FakeUpstream::start(vec![text_answer(&["晴，", "25°C"])]).await;
    let events = collect(&client(&upstream), request("北京今天天气怎么样？")).await;

    let text: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::ContentDelta {
                delta: ContentDelta::TextDelta { text },
                ..
            } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "晴，25°C");

    assert!(matches!(events.first(), Some(StreamEvent::MessageStart { .. })));
    match events.last() {
        Some(StreamEvent::MessageEnd {
            finish_reason,
            usage,
        }) => {
            assert_eq!(*finish_reason, FinishReason::Stop);
            assert_eq!(usage.input_tokens, 12);
            assert_eq!(usage.output_tokens, 8);
        }
        other => panic!("expected MessageEnd, got {:?}", other),
    }
    let ends = events
        .iter()
        .filter(|e| matches!(e, StreamEvent::MessageEnd { .. }))
        .count();
    assert_eq!(ends, 1);
}

#[tokio::test]
async fn test_request_body_and_headers() {
    let upstream = FakeUpstream::start(vec![text_answer(&["ok"])]).await;
    collect(&client(&upstream), request("hi")).await;

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    let recorded = &requests[0];
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.target, "/v1/chat/completions");
    assert_eq!(recorded.headers["authorization"], "Bearer sk-test");

    let body = recorded.json();
    assert_eq!(body["model"], "deepseek-chat");
    assert_eq!(body["stream"], true);
    assert_eq!(body["stream_options"]["include_usage"], true);
    assert_eq!(body["max_tokens"], 256);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "You are a weather assistant.");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "hi");
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "get_weather");
}

#[tokio::test]
async fn test_tool_call_stream() {
    let upstream = FakeUpstream::start(vec![CannedResponse::sse(&[
        tool_call_chunk(0, "call_abc", "get_weather", "{\"city\":"),
        json!({"choices": [{"index": 0, "delta": {"tool_calls": [{"index": 0, "function": {"arguments": "\"Beijing\"}"}}]}}]}),
        finish_chunk("tool_calls"),
        usage_chunk(20, 10),
    ])])
    .await;

    let events = collect(&client(&upstream), request("weather?")).await;

    let started = events.iter().find_map(|e| match e {
        StreamEvent::ContentBlockStart {
            block: ContentBlockStart::ToolUse { id, name },
            ..
        } => Some((id.clone(), name.clone())),
        _ => None,
    });
    assert_eq!(
        started,
        Some(("call_abc".to_string(), "get_weather".to_string()))
    );

    let arguments: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::ContentDelta {
                delta: ContentDelta::ToolUseDelta { partial },
                ..
            } => Some(partial.partial_json.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(arguments, r#"{"city":"Beijing"}"#);

    assert!(matches!(
        events.last(),
        Some(StreamEvent::MessageEnd {
            finish_reason: FinishReason::ToolUse,
            ..
        })
    ));
}

#[tokio::test]
async fn test_invalid_credentials() {
    let upstream = FakeUpstream::start(vec![CannedResponse::json(
        401,
        json!({"error": {"message": "Authentication Fails", "type": "authentication_error"}}),
    )])
    .await;

    let result = client(&upstream).stream_generate(request("hi")).await;

    match result {
        Err(LlmError::AuthenticationError(message)) => {
            assert!(message.contains("invalid API credentials"));
            assert!(message.contains("Authentication Fails"));
        }
        Err(other) => panic!("expected authentication error, got {:?}", other),
        Ok(_) => panic!("expected authentication error, got a stream"),
    }
    // Not retried
    assert_eq!(upstream.requests().len(), 1);
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let upstream = FakeUpstream::start(vec![
        CannedResponse::json(429, json!({"error": {"message": "slow down"}}))
            .with_header("Retry-After", "0"),
        text_answer(&["after retry"]),
    ])
    .await;

    let events = collect(&client(&upstream), request("hi")).await;

    assert_eq!(upstream.requests().len(), 2);
    assert!(events.iter().any(|e| matches!(
        e,
        StreamEvent::ContentDelta { delta: ContentDelta::TextDelta { text }, .. } if text == "after retry"
    )));
}

#[tokio::test]
async fn test_server_error_after_retries() {
    let upstream = FakeUpstream::start(vec![
        CannedResponse::json(503, json!({"error": {"message": "overloaded"}})),
        CannedResponse::json(503, json!({"error": {"message": "overloaded"}})),
    ])
    .await;

    let result = client(&upstream).stream_generate(request("hi")).await;

    assert!(matches!(
        result,
        Err(LlmError::HttpError { status: 503, .. })
    ));
    assert_eq!(upstream.requests().len(), 2);
}

#[tokio::test]
async fn test_bad_request_is_sent_once() {
    let upstream = FakeUpstream::start(vec![
        CannedResponse::json(
            400,
            json!({"error": {"message": "Model Not Exist", "type": "invalid_request_error"}}),
        ),
        text_answer(&["should never be served"]),
    ])
    .await;

    let result = client(&upstream).stream_generate(request("hi")).await;

    assert!(matches!(
        result,
        Err(LlmError::ProviderError { ref code, ref message })
            if code == "invalid_request_error" && message == "Model Not Exist"
    ));
    assert_eq!(upstream.requests().len(), 1);
}

#[tokio::test]
async fn test_error_payload_mid_stream() {
    let upstream = FakeUpstream::start(vec![CannedResponse::sse(&[
        common::text_chunk("partial"),
        json!({"error": {"message": "context length exceeded", "code": "context_length_exceeded"}}),
    ])])
    .await;

    let stream = client(&upstream).stream_generate(request("hi")).await.unwrap();
    let items: Vec<_> = stream.collect().await;

    let error = items.iter().find_map(|i| i.as_ref().err());
    assert!(matches!(
        error,
        Some(LlmError::ProviderError { code, .. }) if code == "context_length_exceeded"
    ));
}

#[tokio::test]
#[ignore] // Needs API_KEY, BASE_URL and MODEL in .env
async fn test_real_endpoint_answers() {
    dotenvy::dotenv().ok();
    let config = OpenAiConfig::new(
        std::env::var("API_KEY").expect("API_KEY required in .env"),
        std::env::var("BASE_URL").expect("BASE_URL required in .env"),
        std::env::var("MODEL").expect("MODEL required in .env"),
    );
    let client = OpenAiClient::new(config).unwrap();

    let mut request = request("What is 2+2? Answer with just the number.");
    request.tools = None;
    let events = collect(&client, request).await;

    let text: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::ContentDelta {
                delta: ContentDelta::TextDelta { text },
                ..
            } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    println!("Response: {}", text);
    assert!(text.contains('4'));
}
