//! # pagekit-http
//!
//! Transport and caching for the pagekit record API.
//!
//! Every remote operation is a JSON POST to a named endpoint. The
//! [`CachedGateway`] sends it through an [`HttpExecutor`] and keeps
//! successful read responses in a [`CacheStore`]:
//!
//! ```ignore
//! use std::sync::Arc;
//! use pagekit_http::{CacheLifetime, CachedGateway, ReqwestExecutor, ResponseCache};
//!
//! let gateway = CachedGateway::new(
//!     "https://www.notion.so/api/v3/",
//!     token,
//!     Arc::new(ReqwestExecutor::with_default_timeout()?),
//!     Arc::new(ResponseCache::new(CacheLifetime::Seconds(300))),
//! )?;
//!
//! // Second call is answered from the cache.
//! let chunk = gateway.execute("chunk:abc:0", "loadPageChunk", &body)?;
//! let chunk = gateway.execute("chunk:abc:0", "loadPageChunk", &body)?;
//! ```

pub mod cache;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod types;

pub use cache::{CacheLifetime, CacheStore, ResponseCache};
pub use error::Error;
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use gateway::CachedGateway;
pub use types::{HttpRequest, HttpResponse, Method};

#[cfg(any(test, feature = "test-utils"))]
pub use executor::mock::MockExecutor;
