//! End-to-end tests for the Streamlake gateway.
//!
//! These tests drive the full router through `oneshot` against a wiremock
//! upstream and validate:
//! - Streaming and aggregated chat responses
//! - Credential and request admission
//! - Upstream failure handling
//! - Health and metrics endpoints

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use gateway_config::GatewayConfig;
use gateway_server::routes::create_router;
use gateway_server::AppState;
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HI_THERE: &str =
    "data: {\"content\":\"Hi\"}\n\ndata: {\"content\":\" there\"}\n\ndata: [DONE]\n\n";

/// Gateway configuration pointing at the mock upstream
fn test_config(server: &MockServer) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.base_url = format!("{}/v1", server.uri());
    config.upstream.api_key = Some(SecretString::new("sk-upstream".to_string()));
    config.upstream.read_timeout = Duration::from_secs(5);
    config
}

fn create_app(config: GatewayConfig) -> Router {
    create_router(AppState::builder().config(config).build().unwrap())
}

async fn mount_upstream(server: &MockServer, body: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header_matcher("authorization", "Bearer sk-upstream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream"))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn chat_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn hello(stream: bool) -> Value {
    json!({
        "messages": [{"role": "user", "content": "Hello"}],
        "provider": "streamlake",
        "stream": stream
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Parse `data: <json>` frames from an SSE body
fn sse_frames(text: &str) -> Vec<Value> {
    text.split("\n\n")
        .filter(|frame| !frame.trim().is_empty())
        .map(|frame| {
            let data = frame
                .strip_prefix("data: ")
                .or_else(|| frame.strip_prefix("data:"))
                .unwrap_or_else(|| panic!("not a data frame: {frame:?}"));
            serde_json::from_str(data).unwrap()
        })
        .collect()
}

#[cfg(test)]
mod streaming_tests {
    use super::*;

    #[tokio::test]
    async fn test_streaming_relays_normalized_frames() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header_matcher("accept", "text/event-stream"))
            .and(body_partial_json(json!({
                "stream": true,
                "temperature": 0.7,
                "messages": [{"role": "user", "content": "Hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(HI_THERE, "text/event-stream"))
            .expect(1)
            .mount(&server)
            .await;

        let response = create_app(test_config(&server))
            .oneshot(chat_request(&hello(true)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let frames = sse_frames(&body_text(response).await);
        assert_eq!(
            frames,
            vec![
                json!({"type": "chunk", "content": "Hi", "metadata": {"provider": "streamlake"}}),
                json!({"type": "chunk", "content": " there", "metadata": {"provider": "streamlake"}}),
                json!({"type": "done", "metadata": {"provider": "streamlake"}}),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_defaults_to_true() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 1).await;

        let body = json!({"messages": [{"role": "user", "content": "Hello"}]});
        let response = create_app(test_config(&server))
            .oneshot(chat_request(&body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let frames = sse_frames(&body_text(response).await);
        assert_eq!(frames.len(), 3);
    }

    #[tokio::test]
    async fn test_non_json_line_passed_through() {
        let server = MockServer::start().await;
        mount_upstream(&server, "not json\ndata: [DONE]\n", 1).await;

        let response = create_app(test_config(&server))
            .oneshot(chat_request(&hello(true)))
            .await
            .unwrap();

        let frames = sse_frames(&body_text(response).await);
        assert_eq!(frames[0]["content"], "not json");
        assert_eq!(frames[0]["metadata"], json!({"provider": "streamlake"}));
        assert_eq!(frames[1]["type"], "done");
    }

    #[tokio::test]
    async fn test_missing_done_is_synthesized() {
        let server = MockServer::start().await;
        mount_upstream(&server, "data: {\"content\":\"Hi\"}\n", 1).await;

        let response = create_app(test_config(&server))
            .oneshot(chat_request(&hello(true)))
            .await
            .unwrap();

        let frames = sse_frames(&body_text(response).await);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1], json!({"type": "done", "metadata": {"provider": "streamlake"}}));
    }

    #[tokio::test]
    async fn test_upstream_error_status_becomes_error_frame() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(1)
            .mount(&server)
            .await;

        let response = create_app(test_config(&server))
            .oneshot(chat_request(&hello(true)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let frames = sse_frames(&body_text(response).await);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], "error");
        assert!(frames[0]["error"].as_str().unwrap().contains("upstream exploded"));
    }

    #[tokio::test]
    async fn test_exactly_one_terminal_frame() {
        let server = MockServer::start().await;
        mount_upstream(
            &server,
            "data: {\"content\":\"a\"}\ndata: [DONE]\ndata: {\"content\":\"late\"}\nDONE\n",
            1,
        )
        .await;

        let response = create_app(test_config(&server))
            .oneshot(chat_request(&hello(true)))
            .await
            .unwrap();

        let frames = sse_frames(&body_text(response).await);
        let terminals = frames
            .iter()
            .filter(|f| f["type"] == "done" || f["type"] == "error")
            .count();
        assert_eq!(terminals, 1);
        assert_eq!(frames.last().unwrap()["type"], "done");
        assert_eq!(frames.len(), 2);
    }
}

#[cfg(test)]
mod aggregate_tests {
    use super::*;

    #[tokio::test]
    async fn test_aggregate_concatenates_content() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 1).await;

        let response = create_app(test_config(&server))
            .oneshot(chat_request(&hello(false)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json, json!({"content": "Hi there", "provider": "streamlake"}));
    }

    #[tokio::test]
    async fn test_aggregate_matches_streamed_chunks() {
        let upstream_body = "data: {\"delta\":{\"content\":\"Hel\"}}\n\
                             data: {\"id\":\"no-content\"}\n\
                             plain\n\
                             data: {\"content\":\"lo\"}\n\
                             data: [DONE]\n";

        let server = MockServer::start().await;
        mount_upstream(&server, upstream_body, 2).await;
        let config = test_config(&server);

        let streamed = create_app(config.clone())
            .oneshot(chat_request(&hello(true)))
            .await
            .unwrap();
        let concatenated: String = sse_frames(&body_text(streamed).await)
            .iter()
            .filter(|f| f["type"] == "chunk")
            .filter_map(|f| f["content"].as_str().map(String::from))
            .collect();

        let aggregated = create_app(config)
            .oneshot(chat_request(&hello(false)))
            .await
            .unwrap();
        let json = body_json(aggregated).await;

        assert_eq!(concatenated, "Helplainlo");
        assert_eq!(json["content"], concatenated);
    }

    #[tokio::test]
    async fn test_aggregate_upstream_error_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let response = create_app(test_config(&server))
            .oneshot(chat_request(&hello(false)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["type"], "upstream_error");
        assert!(json["error"]["message"].as_str().unwrap().contains("overloaded"));
        assert!(json.get("content").is_none());
    }

    #[tokio::test]
    async fn test_aggregate_unreachable_upstream() {
        let mut config = GatewayConfig::default();
        config.upstream.base_url = "http://127.0.0.1:1/v1".to_string();
        config.upstream.api_key = Some(SecretString::new("sk-upstream".to_string()));

        let response = create_app(config)
            .oneshot(chat_request(&hello(false)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}

#[cfg(test)]
mod admission_tests {
    use super::*;

    fn with_gateway_key(mut config: GatewayConfig, key: &str) -> GatewayConfig {
        config.security.gateway_api_key = Some(SecretString::new(key.to_string()));
        config
    }

    #[tokio::test]
    async fn test_wrong_credential_rejected_without_upstream_call() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 0).await;

        let mut request = chat_request(&hello(true));
        request
            .headers_mut()
            .insert("x-api-key", "wrong".parse().unwrap());

        let response = create_app(with_gateway_key(test_config(&server), "secret"))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["type"], "authentication_error");
    }

    #[tokio::test]
    async fn test_missing_credential_rejected_before_body_parsing() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 0).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = create_app(with_gateway_key(test_config(&server), "secret"))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_matching_credential_accepted() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 1).await;

        let mut request = chat_request(&hello(false));
        request
            .headers_mut()
            .insert("X-API-Key", "secret".parse().unwrap());

        let response = create_app(with_gateway_key(test_config(&server), "secret"))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_messages_rejected_without_upstream_call() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 0).await;

        let body = json!({"messages": [], "provider": "streamlake", "stream": true});
        let response = create_app(test_config(&server))
            .oneshot(chat_request(&body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_content_rejected() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 0).await;

        let body = json!({"messages": [{"role": "user", "content": ""}]});
        let response = create_app(test_config(&server))
            .oneshot(chat_request(&body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_temperature_bounds() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 2).await;
        let config = test_config(&server);

        for (temperature, expected) in [
            (2.5, StatusCode::BAD_REQUEST),
            (2.000_000_1, StatusCode::BAD_REQUEST),
            (-0.1, StatusCode::BAD_REQUEST),
            (0.0, StatusCode::OK),
            (2.0, StatusCode::OK),
        ] {
            let body = json!({
                "messages": [{"role": "user", "content": "Hello"}],
                "temperature": temperature,
                "stream": false
            });
            let response = create_app(config.clone())
                .oneshot(chat_request(&body))
                .await
                .unwrap();
            assert_eq!(response.status(), expected, "temperature {temperature}");
        }
    }

    #[tokio::test]
    async fn test_zero_max_tokens_rejected() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 0).await;

        let body = json!({"messages": [{"role": "user", "content": "Hello"}], "max_tokens": 0});
        let response = create_app(test_config(&server))
            .oneshot(chat_request(&body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_provider_rejected() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 0).await;

        let body = json!({"messages": [{"role": "user", "content": "Hello"}], "provider": "openai"});
        let response = create_app(test_config(&server))
            .oneshot(chat_request(&body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"]["message"].as_str().unwrap().contains("openai"));
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 0).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"messages\": ["))
            .unwrap();

        let response = create_app(test_config(&server)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unconfigured_upstream_is_unavailable() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 0).await;

        let mut config = test_config(&server);
        config.upstream.api_key = None;

        let response = create_app(config)
            .oneshot(chat_request(&hello(true)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["type"], "service_unavailable");
    }
}

#[cfg(test)]
mod operational_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint_returns_ok() {
        let app = create_app(GatewayConfig::default());

        let request = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_health_ignores_gateway_credential() {
        let mut config = GatewayConfig::default();
        config.security.gateway_api_key = Some(SecretString::new("secret".to_string()));

        let response = create_app(config)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_count_requests() {
        let server = MockServer::start().await;
        mount_upstream(&server, HI_THERE, 1).await;

        let state = AppState::builder().config(test_config(&server)).build().unwrap();
        let app = create_router(state);

        let response = app
            .clone()
            .oneshot(chat_request(&hello(false)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = body_text(response).await;
        assert!(text.contains("gateway_chat_requests_total{mode=\"aggregate\",outcome=\"ok\"} 1"));
        assert!(text.contains("gateway_chat_events_total{kind=\"chunk\"} 2"));
    }

    #[tokio::test]
    async fn test_metrics_count_refused_before_parsing() {
        let mut config = GatewayConfig::default();
        config.security.gateway_api_key = Some(SecretString::new("secret".to_string()));
        let app = create_router(AppState::builder().config(config).build().unwrap());

        let response = app
            .clone()
            .oneshot(chat_request(&hello(true)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let malformed = Request::builder()
            .method(Method::POST)
            .uri("/chat")
            .header("x-api-key", "secret")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(malformed).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let text = body_text(response).await;
        assert!(text.contains("gateway_chat_requests_total{mode=\"unknown\",outcome=\"rejected\"} 2"));
    }

    #[tokio::test]
    async fn test_request_id_echoed() {
        let response = create_app(GatewayConfig::default())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "trace-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-42");
    }
}

#[cfg(test)]
mod cancellation_tests {
    use super::*;
    use futures::stream;
    use gateway_core::{GatewayError, UpstreamRequest};
    use gateway_providers::{ChatUpstream, LineStream};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Sets its flag when the upstream line stream is released
    struct ReleaseFlag(Arc<AtomicBool>);

    impl Drop for ReleaseFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Upstream that sends one chunk and then stays open forever
    struct EndlessUpstream {
        released: Arc<AtomicBool>,
    }

    impl ChatUpstream for EndlessUpstream {
        fn id(&self) -> &str {
            "streamlake"
        }

        fn is_configured(&self) -> bool {
            true
        }

        fn stream_lines(&self, _request: UpstreamRequest) -> Result<LineStream, GatewayError> {
            let flag = ReleaseFlag(Arc::clone(&self.released));
            let lines = stream::unfold((flag, false), |(flag, sent)| async move {
                if sent {
                    std::future::pending::<()>().await;
                }
                let line: Result<String, GatewayError> =
                    Ok("data: {\"content\":\"tick\"}".to_string());
                Some((line, (flag, true)))
            });
            Ok(Box::pin(lines))
        }
    }

    #[tokio::test]
    async fn test_client_disconnect_releases_upstream() {
        let released = Arc::new(AtomicBool::new(false));
        let state = AppState::builder()
            .upstream(Arc::new(EndlessUpstream {
                released: Arc::clone(&released),
            }))
            .build()
            .unwrap();
        let app = create_router(state);

        let response = app
            .clone()
            .oneshot(chat_request(&hello(true)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut body = response.into_body();
        let frame = body.frame().await.unwrap().unwrap();
        let data = frame.into_data().unwrap();
        let frames = sse_frames(std::str::from_utf8(&data).unwrap());
        assert_eq!(frames[0]["type"], "chunk");
        assert_eq!(frames[0]["content"], "tick");
        assert!(!released.load(Ordering::SeqCst));

        drop(body);
        assert!(released.load(Ordering::SeqCst));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let text = body_text(response).await;
        assert!(text.contains("gateway_chat_requests_total{mode=\"streaming\",outcome=\"cancelled\"} 1"));
    }
}
