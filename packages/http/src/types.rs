use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP method for requests. The record API is POST-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    POST,
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::POST => http::Method::POST,
        }
    }
}

/// A single outgoing request
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HttpRequest {
    #[serde(default)]
    pub method: Method,

    /// Absolute URL
    pub url: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Request body (will be JSON-serialized)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_json_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The last path segment of the URL, which names the remote operation.
    pub fn endpoint(&self) -> &str {
        let path = self.url.split(['?', '#']).next().unwrap_or(&self.url);
        path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
    }
}

/// HTTP response from a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,

    /// Response headers
    pub headers: HashMap<String, String>,

    /// Raw body text
    pub body_text: String,
}

impl HttpResponse {
    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON. An empty body parses as an empty object,
    /// which is what the write endpoints send back.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        if self.body_text.trim().is_empty() {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&self.body_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            status_text: String::new(),
            headers: HashMap::new(),
            body_text: body.to_string(),
        }
    }

    #[test]
    fn post_is_default_method() {
        assert_eq!(HttpRequest::default().method, Method::POST);
        assert_eq!(HttpRequest::post("https://x").method, Method::POST);
    }

    #[test]
    fn endpoint_is_last_segment() {
        let request = HttpRequest::post("https://www.notion.so/api/v3/loadPageChunk");
        assert_eq!(request.endpoint(), "loadPageChunk");

        let request = HttpRequest::post("https://host/api/v3/getRecordValues/?x=1");
        assert_eq!(request.endpoint(), "getRecordValues");
    }

    #[test]
    fn builder_sets_fields() {
        let request = HttpRequest::post("https://host/api")
            .with_header("cookie", "token_v2=abc")
            .with_json_body(json!({"a": 1}));
        assert_eq!(request.headers.get("cookie"), Some(&"token_v2=abc".to_string()));
        assert_eq!(request.body, Some(json!({"a": 1})));
    }

    #[test]
    fn success_range() {
        assert!(response(200, "").is_success());
        assert!(response(204, "").is_success());
        assert!(!response(302, "").is_success());
        assert!(!response(500, "").is_success());
    }

    #[test]
    fn json_body_parsing() {
        assert_eq!(response(200, r#"{"a":1}"#).json().unwrap(), json!({"a": 1}));
        assert_eq!(response(200, "  ").json().unwrap(), json!({}));
        assert!(response(200, "<html>").json().is_err());
    }

    #[test]
    fn method_converts_to_http_method() {
        let m: http::Method = Method::POST.into();
        assert_eq!(m, http::Method::POST);
    }
}
