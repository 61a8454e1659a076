//! Response cache.
//!
//! A string-keyed store of parsed JSON responses with a single expiry
//! policy fixed at construction. Only successful read responses are ever
//! stored; concurrent writers to the same key race and the last write wins,
//! which is harmless because every value under a key is a re-derivation of
//! the same remote state.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// How long cached responses stay valid.
///
/// Configured as an integer number of seconds, where `-1` turns caching off
/// entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLifetime {
    Disabled,
    Seconds(u64),
}

impl CacheLifetime {
    pub const DEFAULT: CacheLifetime = CacheLifetime::Seconds(300);

    pub fn from_seconds(seconds: i64) -> Result<Self, String> {
        match seconds {
            -1 => Ok(CacheLifetime::Disabled),
            s if s >= 0 => Ok(CacheLifetime::Seconds(s as u64)),
            s => Err(format!(
                "cache lifetime must be -1 (disabled) or a non-negative number of seconds, got {}",
                s
            )),
        }
    }

    pub fn as_seconds(&self) -> i64 {
        match self {
            CacheLifetime::Disabled => -1,
            CacheLifetime::Seconds(s) => i64::try_from(*s).unwrap_or(i64::MAX),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, CacheLifetime::Disabled)
    }

    fn ttl(&self) -> Option<Duration> {
        match self {
            CacheLifetime::Disabled => None,
            CacheLifetime::Seconds(s) => Some(Duration::from_secs(*s)),
        }
    }
}

impl Default for CacheLifetime {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for CacheLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheLifetime::Disabled => write!(f, "disabled"),
            CacheLifetime::Seconds(s) => write!(f, "{}s", s),
        }
    }
}

impl Serialize for CacheLifetime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_seconds())
    }
}

impl<'de> Deserialize<'de> for CacheLifetime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let seconds = i64::deserialize(deserializer)?;
        CacheLifetime::from_seconds(seconds).map_err(de::Error::custom)
    }
}

/// A key/value store for parsed responses.
pub trait CacheStore: Send + Sync {
    /// The unexpired value under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key`, replacing any previous entry.
    fn insert(&self, key: &str, value: Value);

    /// Drop every entry.
    fn clear(&self);

    /// Whether this store keeps anything at all.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Return the cached value under `key`, or compute, store and return it.
///
/// Failures from `compute` are returned as-is and leave the cache untouched.
pub fn get_or_try_insert_with<E>(
    cache: &dyn CacheStore,
    key: &str,
    compute: impl FnOnce() -> Result<Value, E>,
) -> Result<Value, E> {
    if let Some(value) = cache.get(key) {
        tracing::debug!(key, "cache hit");
        return Ok(value);
    }

    tracing::debug!(key, "cache miss");
    let value = compute()?;
    cache.insert(key, value.clone());
    Ok(value)
}

struct CacheEntry {
    stored_at: Instant,
    value: Value,
}

/// In-process cache with a fixed time-to-live.
pub struct ResponseCache {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(lifetime: CacheLifetime) -> Self {
        Self {
            ttl: lifetime.ttl(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A cache with a sub-second lifetime.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(CacheLifetime::Disabled)
    }

    /// Number of stored entries. Expired ones linger until the next insert.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Entries are plain values; a panic mid-insert cannot leave one torn.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheStore for ResponseCache {
    fn get(&self, key: &str) -> Option<Value> {
        let ttl = self.ttl?;
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn insert(&self, key: &str, value: Value) {
        let Some(ttl) = self.ttl else {
            return;
        };
        let mut entries = self.entries();
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.insert(
            key.to_string(),
            CacheEntry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    fn clear(&self) {
        self.entries().clear();
    }

    fn is_enabled(&self) -> bool {
        self.ttl.is_some()
    }
}
