//! Function-style entry point for on-demand hosting.
//!
//! An event describing one HTTP request is turned into a real request,
//! pushed through the same [`Router`] the server runs, and the response is
//! turned back into an event-shaped result.

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::ServiceExt;
use tracing::{debug, info_span, warn, Instrument};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    pub http_method: String,
    pub path: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionContext {
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default)]
    pub aws_request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    /// Last value of every response header.
    pub headers: HashMap<String, String>,
    /// Every value of every response header, in order.
    pub multi_value_headers: HashMap<String, Vec<String>>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl FunctionResponse {
    /// Result for an event that cannot be turned into a request.
    fn bad_request(message: &str) -> Self {
        let content_type = "application/json".to_string();
        Self {
            status_code: 400,
            headers: HashMap::from([("content-type".to_string(), content_type.clone())]),
            multi_value_headers: HashMap::from([(
                "content-type".to_string(),
                vec![content_type],
            )]),
            body: serde_json::json!({ "error": message }).to_string(),
            is_base64_encoded: false,
        }
    }
}

pub async fn handle(
    app: Router,
    event: FunctionEvent,
    context: FunctionContext,
) -> Result<FunctionResponse> {
    let span = info_span!(
        "function",
        function = context.function_name.as_deref().unwrap_or("unknown"),
        request_id = context.aws_request_id.as_deref().unwrap_or("-"),
        method = %event.http_method,
        path = %event.path,
    );

    async move {
        let request = match to_request(event) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected function event: {:#}", e);
                return Ok(FunctionResponse::bad_request(&format!("{e:#}")));
            }
        };
        let response = app
            .oneshot(request)
            .await
            .context("Router failed to handle request")?;
        from_response(response).await
    }
    .instrument(span)
    .await
}

fn to_request(event: FunctionEvent) -> Result<Request<Body>> {
    let mut uri = if event.path.is_empty() {
        "/".to_string()
    } else {
        event.path
    };

    if let Some(params) = event.query_string_parameters.filter(|p| !p.is_empty()) {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();
        uri.push('?');
        uri.push_str(&query);
    }

    let body = match event.body {
        Some(body) if event.is_base64_encoded => STANDARD
            .decode(body.as_bytes())
            .context("Failed to decode base64 request body")?,
        Some(body) => body.into_bytes(),
        None => Vec::new(),
    };

    let mut builder = Request::builder().method(event.http_method.as_str()).uri(&uri);
    for (name, value) in &event.headers {
        if !event.multi_value_headers.contains_key(name) {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    for (name, values) in &event.multi_value_headers {
        for value in values {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }

    builder
        .body(Body::from(body))
        .with_context(|| format!("Invalid function event for {}", uri))
}

async fn from_response(response: Response<Body>) -> Result<FunctionResponse> {
    let status_code = response.status().as_u16();

    let mut headers = HashMap::new();
    let mut multi_value_headers: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in response.headers() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers.insert(name.as_str().to_string(), value.clone());
        multi_value_headers
            .entry(name.as_str().to_string())
            .or_default()
            .push(value);
    }

    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .context("Failed to read response body")?;

    let (body, is_base64_encoded) = match String::from_utf8(bytes.to_vec()) {
        Ok(text) => (text, false),
        Err(_) => (STANDARD.encode(&bytes), true),
    };

    debug!("Function response: {} ({} bytes)", status_code, body.len());

    Ok(FunctionResponse {
        status_code,
        headers,
        multi_value_headers,
        body,
        is_base64_encoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ExtractionMode};
    use crate::server::router_from_config;
    use axum::http::HeaderValue;
    use serde_json::{json, Value};

    fn stub_router() -> Router {
        let mut config = Config::default();
        config.extraction.mode = ExtractionMode::Stub;
        router_from_config(&config)
    }

    fn post_event(path: &str, body: &str) -> FunctionEvent {
        FunctionEvent {
            http_method: "POST".to_string(),
            path: path.to_string(),
            headers: HashMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_event_deserialization() {
        let event: FunctionEvent = serde_json::from_value(json!({
            "httpMethod": "POST",
            "path": "/download",
            "headers": {"content-type": "application/json"},
            "queryStringParameters": null,
            "body": "{\"url\": \"x\"}",
            "isBase64Encoded": false
        }))
        .unwrap();

        assert_eq!(event.http_method, "POST");
        assert_eq!(event.path, "/download");
        assert!(event.query_string_parameters.is_none());
        assert_eq!(event.body.as_deref(), Some("{\"url\": \"x\"}"));
    }

    #[test]
    fn test_query_string_is_rebuilt() {
        let event = FunctionEvent {
            http_method: "GET".to_string(),
            path: "/".to_string(),
            query_string_parameters: Some(HashMap::from([(
                "q".to_string(),
                "a b&c".to_string(),
            )])),
            ..Default::default()
        };

        let request = to_request(event).unwrap();
        assert_eq!(request.uri().path(), "/");
        assert_eq!(request.uri().query(), Some("q=a+b%26c"));
    }

    #[tokio::test]
    async fn test_stub_download_through_adapter() {
        let response = handle(
            stub_router(),
            post_event("/download", r#"{"url": "https://example.com/v"}"#),
            FunctionContext::default(),
        )
        .await
        .unwrap();

        assert_eq!(response.status_code, 200);
        assert!(!response.is_base64_encoded);
        assert_eq!(response.headers["content-type"], "application/json");

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(
            body["title"],
            "Test Video - If you see this, the deployment is working!"
        );
        assert_eq!(body["formats"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_url_through_adapter() {
        let response = handle(
            stub_router(),
            post_event("/api/download", "{}"),
            FunctionContext::default(),
        )
        .await
        .unwrap();

        assert_eq!(response.status_code, 400);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({"error": "URL is required"}));
    }

    #[tokio::test]
    async fn test_base64_body() {
        let mut event = post_event("/download", "");
        event.body = Some(STANDARD.encode(r#"{"url": "https://example.com/v"}"#));
        event.is_base64_encoded = true;

        let response = handle(stub_router(), event, FunctionContext::default())
            .await
            .unwrap();
        assert_eq!(response.status_code, 200);
    }

    #[tokio::test]
    async fn test_invalid_base64_body() {
        let mut event = post_event("/download", "");
        event.body = Some("***".to_string());
        event.is_base64_encoded = true;

        let response = handle(stub_router(), event, FunctionContext::default())
            .await
            .unwrap();
        assert_eq!(response.status_code, 400);
        assert_eq!(response.headers["content-type"], "application/json");

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to decode base64 request body"));
    }

    #[tokio::test]
    async fn test_repeated_response_headers_are_kept() {
        let response = Response::builder()
            .status(201)
            .header("set-cookie", "a=1")
            .header("set-cookie", "b=2")
            .header("x-raw", HeaderValue::from_bytes(b"caf\xe9").unwrap())
            .body(Body::from("ok"))
            .unwrap();

        let response = from_response(response).await.unwrap();
        assert_eq!(response.status_code, 201);
        assert_eq!(response.headers["set-cookie"], "b=2");
        assert_eq!(response.multi_value_headers["set-cookie"], vec!["a=1", "b=2"]);
        assert_eq!(response.multi_value_headers["x-raw"], vec!["caf\u{fffd}"]);
        assert_eq!(response.body, "ok");
    }

    #[test]
    fn test_multi_value_request_headers() {
        let event = FunctionEvent {
            http_method: "GET".to_string(),
            path: "/".to_string(),
            headers: HashMap::from([("accept".to_string(), "text/html".to_string())]),
            multi_value_headers: HashMap::from([(
                "accept".to_string(),
                vec!["text/html".to_string(), "application/json".to_string()],
            )]),
            ..Default::default()
        };

        let request = to_request(event).unwrap();
        let values: Vec<_> = request
            .headers()
            .get_all("accept")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["text/html", "application/json"]);
    }

    #[tokio::test]
    async fn test_index_through_adapter() {
        let event = FunctionEvent {
            http_method: "GET".to_string(),
            path: "/".to_string(),
            ..Default::default()
        };
        let context = FunctionContext {
            function_name: Some("server".to_string()),
            aws_request_id: Some("abc-123".to_string()),
        };

        let response = handle(stub_router(), event, context).await.unwrap();
        assert_eq!(response.status_code, 200);
        assert!(response.body.contains("<form"));
    }
}
