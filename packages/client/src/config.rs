//! Client configuration.
//!
//! Settings come from a JSON file and may be overridden from the
//! environment:
//!
//! ```json
//! {
//!   "token": "<token_v2 cookie value>",
//!   "apiBaseUrl": "https://www.notion.so/api/v3/",
//!   "cacheLifetimeSeconds": 300,
//!   "spaceId": "optional space to work in"
//! }
//! ```
//!
//! Without an explicit path the file is read from
//! `<config dir>/pagekit/config.json` if it exists.

use std::fmt;
use std::path::{Path, PathBuf};

use pagekit_http::CacheLifetime;
use pagekit_records::Identifier;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://www.notion.so/api/v3/";

pub const TOKEN_VAR: &str = "PAGEKIT_TOKEN";
pub const API_BASE_URL_VAR: &str = "PAGEKIT_API_BASE_URL";
pub const CACHE_LIFETIME_VAR: &str = "PAGEKIT_CACHE_LIFETIME";
pub const SPACE_ID_VAR: &str = "PAGEKIT_SPACE_ID";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default, rename = "cacheLifetimeSeconds")]
    pub cache_lifetime: CacheLifetime,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<Identifier>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base_url: default_api_base_url(),
            cache_lifetime: CacheLifetime::DEFAULT,
            space_id: None,
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_cache_lifetime(mut self, lifetime: CacheLifetime) -> Self {
        self.cache_lifetime = lifetime;
        self
    }

    pub fn with_space_id(mut self, space_id: Identifier) -> Self {
        self.space_id = Some(space_id);
        self
    }

    /// The default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pagekit").join("config.json"))
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| Error::config(format!("invalid config file {}: {}", path.display(), e)))
    }

    /// Load configuration from `path` (or the default location), then apply
    /// environment overrides.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "loading config");
                    Self::from_file(&path)?
                }
                None => Self::new(""),
            },
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override settings from `lookup`, normally the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(TOKEN_VAR) {
            self.token = token;
        }
        if let Some(url) = lookup(API_BASE_URL_VAR) {
            self.api_base_url = url;
        }
        if let Some(lifetime) = lookup(CACHE_LIFETIME_VAR) {
            let seconds: i64 = lifetime.trim().parse().map_err(|_| {
                Error::config(format!(
                    "{} must be an integer, got '{}'",
                    CACHE_LIFETIME_VAR, lifetime
                ))
            })?;
            self.cache_lifetime = CacheLifetime::from_seconds(seconds).map_err(Error::config)?;
        }
        if let Some(space_id) = lookup(SPACE_ID_VAR) {
            self.space_id = Some(Identifier::parse(&space_id)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::config(format!(
                "no session token configured; set \"token\" in the config file or {}",
                TOKEN_VAR
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("cache_lifetime", &self.cache_lifetime)
            .field("space_id", &self.space_id)
            .finish()
    }
}
