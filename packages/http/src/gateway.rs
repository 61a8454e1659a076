//! The cached request gateway.
//!
//! Every remote operation is a POST of a JSON body to
//! `<api base>/<operationName>`, authenticated with the session cookie.
//! Reads go through [`CachedGateway::execute`] and may be answered from the
//! response cache; writes go through [`CachedGateway::post`] and always hit
//! the network.

use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::cache::{self, CacheStore};
use crate::error::Error;
use crate::executor::HttpExecutor;
use crate::types::HttpRequest;

const SESSION_COOKIE: &str = "token_v2";

pub struct CachedGateway {
    executor: Arc<dyn HttpExecutor>,
    cache: Arc<dyn CacheStore>,
    base_url: Url,
    token: String,
}

impl CachedGateway {
    /// Create a gateway rooted at `base_url`.
    ///
    /// A missing trailing slash is added so that endpoint names are
    /// appended rather than replacing the last path segment.
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        executor: Arc<dyn HttpExecutor>,
        cache: Arc<dyn CacheStore>,
    ) -> Result<Self, Error> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            executor,
            cache,
            base_url,
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    /// Build the full URL for an endpoint.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        self.base_url.join(endpoint).map_err(Error::from)
    }

    /// Run a read operation, answering from the cache when possible.
    ///
    /// The caller owns `cache_key`: two logically different requests that
    /// share a key will share a cached response.
    pub fn execute(&self, cache_key: &str, endpoint: &str, body: &Value) -> Result<Value, Error> {
        cache::get_or_try_insert_with(self.cache.as_ref(), cache_key, || {
            self.post(endpoint, body)
        })
    }

    /// POST `body` to `endpoint` and parse the JSON answer. Never cached.
    pub fn post(&self, endpoint: &str, body: &Value) -> Result<Value, Error> {
        let url = self.endpoint_url(endpoint)?;
        let body = match body {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other.clone(),
        };

        let request = HttpRequest::post(url.as_str())
            .with_header("cookie", format!("{}={}", SESSION_COOKIE, self.token))
            .with_json_body(body);

        let failed = |status: Option<u16>, message: String| Error::RemoteRequestFailed {
            endpoint: endpoint.to_string(),
            status,
            message,
        };

        let response = self.executor.execute(&request).map_err(|message| {
            tracing::warn!(endpoint, %message, "request failed");
            failed(None, message)
        })?;

        tracing::debug!(endpoint, status = response.status, "response received");

        if !response.is_success() {
            return Err(failed(
                Some(response.status),
                format!("{} {}", response.status_text, response.body_text)
                    .trim()
                    .to_string(),
            ));
        }

        response
            .json()
            .map_err(|e| failed(Some(response.status), format!("invalid JSON body: {}", e)))
    }
}
