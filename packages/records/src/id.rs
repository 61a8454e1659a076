//! Record identifiers.
//!
//! Every record on the remote side is named by a 128-bit token that is
//! unique across all tables. The service is inconsistent about dashes (page
//! URLs drop them, record maps keep them), so parsing ignores them and the
//! canonical form is always the dashed lowercase string.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::Error;

/// A normalized record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Uuid);

impl Identifier {
    /// Parse an identifier, with or without dashes.
    ///
    /// ```rust
    /// use pagekit_records::Identifier;
    ///
    /// let a = Identifier::parse("4A5B6C7D8E9F40A1B2C3D4E5F6A7B8C9").unwrap();
    /// let b = Identifier::parse("4a5b6c7d-8e9f-40a1-b2c3-d4e5f6a7b8c9").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.to_string(), "4a5b6c7d-8e9f-40a1-b2c3-d4e5f6a7b8c9");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let hex: String = raw.chars().filter(|c| *c != '-').collect();

        if hex.len() != 32 {
            return Err(Error::InvalidIdentifier {
                raw: raw.to_string(),
                message: format!("expected 32 hex digits, found {}", hex.len()),
            });
        }

        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::InvalidIdentifier {
                raw: raw.to_string(),
                message: format!("invalid character '{}'", bad),
            });
        }

        let value = u128::from_str_radix(&hex, 16).map_err(|e| Error::InvalidIdentifier {
            raw: raw.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self(Uuid::from_u128(value)))
    }

    /// Extract the identifier from a page URL.
    ///
    /// Page URLs end in `<slug>-<hex>` and may carry a query string; the
    /// token must end the path. A bare identifier is accepted too.
    pub fn from_url(url: &str) -> Result<Self, Error> {
        lazy_static! {
            static ref TRAILING_ID: Regex = Regex::new(
                r"([0-9a-fA-F]{32}|[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})/?$"
            )
            .unwrap();
        }

        let path = url.trim().split(['?', '#']).next().unwrap_or(url);
        match TRAILING_ID.captures(path).and_then(|c| c.get(1)) {
            Some(found) => Self::parse(found.as_str()),
            None => Err(Error::InvalidIdentifier {
                raw: url.to_string(),
                message: "no identifier found in URL".to_string(),
            }),
        }
    }

    /// Generate a fresh random identifier for a new record.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The undashed 32-character form used in page URLs.
    pub fn to_compact(&self) -> String {
        self.0.simple().to_string()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for Identifier {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
