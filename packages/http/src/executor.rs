//! HTTP execution abstraction.
//!
//! The gateway never talks to reqwest directly; it goes through
//! [`HttpExecutor`] so tests can count and inspect every request without a
//! network.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::types::{HttpRequest, HttpResponse};

/// Trait for executing HTTP requests.
pub trait HttpExecutor: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// Returns `Err` with a message if the request could not be sent or the
    /// response could not be read. Non-2xx statuses are NOT errors here.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

/// Production HTTP executor using reqwest.
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Create a new executor with the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| e.to_string())?;

        Ok(Self { client })
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, String> {
        Self::new(Duration::from_secs(30))
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let method: http::Method = request.method.clone().into();

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let header_name = HeaderName::try_from(name.as_str()).map_err(|e| e.to_string())?;
            let header_value = HeaderValue::try_from(value.as_str()).map_err(|e| e.to_string())?;
            headers.insert(header_name, header_value);
        }

        let mut req_builder = self.client.request(method, &request.url).headers(headers);

        if let Some(body) = &request.body {
            req_builder = req_builder.json(body);
        }

        let response = req_builder.send().map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();

        let mut resp_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                resp_headers.insert(name.to_string(), v.to_string());
            }
        }

        let body_text = response.text().map_err(|e| e.to_string())?;

        Ok(HttpResponse {
            status,
            status_text,
            headers: resp_headers,
            body_text,
        })
    }
}

/// Mock HTTP executor for testing.
///
/// Responses are keyed by endpoint name (the last URL segment), so tests do
/// not need to know the configured base URL.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// A mock HTTP executor that returns predefined responses.
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Responses keyed by endpoint name.
        responses: Arc<Mutex<HashMap<String, HttpResponse>>>,
        /// Default response when no match found.
        default_response: Arc<Mutex<Option<HttpResponse>>>,
        /// Recorded requests for verification.
        recorded_requests: Arc<Mutex<Vec<HttpRequest>>>,
        /// Error message returned for every request, when set.
        failure: Arc<Mutex<Option<String>>>,
    }

    impl MockExecutor {
        /// Create a new mock executor.
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `endpoint` with `response`.
        pub fn with_response(self, endpoint: impl Into<String>, response: HttpResponse) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(endpoint.into(), response);
            self
        }

        /// Answer `endpoint` with a 200 carrying `body`.
        pub fn with_json(self, endpoint: impl Into<String>, body: serde_json::Value) -> Self {
            self.with_response(endpoint, Self::success_response(body))
        }

        /// Set a default response when no endpoint matches.
        pub fn with_default_response(self, response: HttpResponse) -> Self {
            *self.default_response.lock().unwrap() = Some(response);
            self
        }

        /// Configure to fail all requests with an error.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            *self.failure.lock().unwrap() = Some(message.into());
            self
        }

        /// Replace the response for `endpoint` on an executor that has
        /// already been handed out.
        pub fn set_json(&self, endpoint: impl Into<String>, body: serde_json::Value) {
            self.responses
                .lock()
                .unwrap()
                .insert(endpoint.into(), Self::success_response(body));
        }

        /// Get all recorded requests.
        pub fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.recorded_requests.lock().unwrap().clone()
        }

        /// Recorded requests sent to `endpoint`.
        pub fn requests_to(&self, endpoint: &str) -> Vec<HttpRequest> {
            self.recorded_requests()
                .into_iter()
                .filter(|r| r.endpoint() == endpoint)
                .collect()
        }

        /// Number of requests sent to `endpoint`.
        pub fn call_count(&self, endpoint: &str) -> usize {
            self.requests_to(endpoint).len()
        }

        /// Clear recorded requests.
        pub fn clear_recorded(&self) {
            self.recorded_requests.lock().unwrap().clear();
        }

        /// Create a simple success response.
        pub fn success_response(body: serde_json::Value) -> HttpResponse {
            HttpResponse {
                status: 200,
                status_text: "OK".to_string(),
                headers: HashMap::new(),
                body_text: body.to_string(),
            }
        }

        /// Create a simple error response.
        pub fn error_response(status: u16, message: &str) -> HttpResponse {
            HttpResponse {
                status,
                status_text: message.to_string(),
                headers: HashMap::new(),
                body_text: serde_json::json!({"errorId": "mock", "message": message})
                    .to_string(),
            }
        }

        /// Create a 404 Not Found response.
        pub fn not_found() -> HttpResponse {
            Self::error_response(404, "Not Found")
        }
    }

    impl HttpExecutor for MockExecutor {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
            self.recorded_requests.lock().unwrap().push(request.clone());

            if let Some(message) = self.failure.lock().unwrap().clone() {
                return Err(message);
            }

            let responses = self.responses.lock().unwrap();
            if let Some(response) = responses.get(request.endpoint()) {
                return Ok(response.clone());
            }

            if let Some(ref response) = *self.default_response.lock().unwrap() {
                return Ok(response.clone());
            }

            Ok(Self::not_found())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockExecutor;
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://www.notion.so/api/v3/";

    #[test]
    fn mock_executor_answers_by_endpoint() {
        let executor = MockExecutor::new().with_json("loadPageChunk", json!({"recordMap": {}}));

        let request = HttpRequest::post(format!("{}loadPageChunk", BASE));
        let result = executor.execute(&request).unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.json().unwrap(), json!({"recordMap": {}}));
    }

    #[test]
    fn mock_executor_returns_default_response() {
        let default = MockExecutor::success_response(json!({"default": true}));
        let executor = MockExecutor::new().with_default_response(default);

        let result = executor
            .execute(&HttpRequest::post(format!("{}anything", BASE)))
            .unwrap();
        assert_eq!(result.json().unwrap(), json!({"default": true}));
    }

    #[test]
    fn mock_executor_returns_404_when_no_match() {
        let executor = MockExecutor::new();
        let result = executor
            .execute(&HttpRequest::post(format!("{}unknown", BASE)))
            .unwrap();
        assert_eq!(result.status, 404);
    }

    #[test]
    fn mock_executor_fails_when_configured() {
        let executor = MockExecutor::new().fail_with("connection reset");
        let result = executor.execute(&HttpRequest::post(format!("{}any", BASE)));
        assert_eq!(result.unwrap_err(), "connection reset");
        assert_eq!(executor.recorded_requests().len(), 1);
    }

    #[test]
    fn mock_executor_counts_per_endpoint() {
        let executor = MockExecutor::new()
            .with_default_response(MockExecutor::success_response(json!({})));

        executor
            .execute(&HttpRequest::post(format!("{}getRecordValues", BASE)))
            .unwrap();
        executor
            .execute(&HttpRequest::post(format!("{}getRecordValues", BASE)))
            .unwrap();
        executor
            .execute(&HttpRequest::post(format!("{}saveTransactions", BASE)))
            .unwrap();

        assert_eq!(executor.call_count("getRecordValues"), 2);
        assert_eq!(executor.call_count("saveTransactions"), 1);
        assert_eq!(executor.call_count("submitTransaction"), 0);

        executor.clear_recorded();
        assert!(executor.recorded_requests().is_empty());
    }

    #[test]
    fn mock_executor_set_json_after_clone() {
        let executor = MockExecutor::new();
        let shared = executor.clone();
        shared.set_json("loadUserContent", json!({"recordMap": {}}));

        let result = executor
            .execute(&HttpRequest::post(format!("{}loadUserContent", BASE)))
            .unwrap();
        assert_eq!(result.status, 200);
    }

    #[test]
    fn mock_executor_records_headers_and_body() {
        let executor = MockExecutor::new()
            .with_default_response(MockExecutor::success_response(json!({})));

        let request = HttpRequest::post(format!("{}submitTransaction", BASE))
            .with_header("cookie", "token_v2=secret")
            .with_json_body(json!({"operations": []}));
        executor.execute(&request).unwrap();

        let recorded = executor.recorded_requests();
        assert_eq!(
            recorded[0].headers.get("cookie"),
            Some(&"token_v2=secret".to_string())
        );
        assert_eq!(recorded[0].body, Some(json!({"operations": []})));
    }

    #[test]
    fn mock_error_response_helper() {
        let response = MockExecutor::error_response(500, "Internal Error");
        assert_eq!(response.status, 500);
        assert!(!response.is_success());
        assert!(response.body_text.contains("Internal Error"));
    }

    #[test]
    fn reqwest_executor_creation() {
        assert!(ReqwestExecutor::with_default_timeout().is_ok());
        assert!(ReqwestExecutor::new(Duration::from_secs(10)).is_ok());
    }
}
