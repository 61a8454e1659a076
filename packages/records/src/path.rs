//! Attribute paths into a record's JSON attribute tree.
//!
//! The wire format addresses attributes with a JSON array such as
//! `["properties", "title"]`. Locally the same path can be written in dotted
//! form (`"properties.title"`); purely numeric segments index into arrays.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One step of an [`AttrPath`].
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object member name.
    Key(String),
    /// Array position.
    Index(usize),
}

impl PathSegment {
    fn from_component(component: &str) -> Self {
        if !component.is_empty() && component.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = component.parse::<usize>() {
                return PathSegment::Index(index);
            }
        }
        PathSegment::Key(component.to_string())
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// An ordered sequence of segments addressing a node in an attribute tree.
///
/// The empty path addresses the whole tree.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttrPath {
    pub segments: Vec<PathSegment>,
}

impl AttrPath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path.
    ///
    /// - Segments are separated by `.`
    /// - Empty segments are ignored (`"a..b"` is `"a.b"`)
    /// - Purely numeric segments become array indices
    ///
    /// ```rust
    /// use pagekit_records::{AttrPath, PathSegment};
    ///
    /// let path = AttrPath::parse("content.0");
    /// assert_eq!(path.segments, vec![PathSegment::Key("content".into()), PathSegment::Index(0)]);
    /// ```
    pub fn parse(s: &str) -> Self {
        Self {
            segments: s
                .split('.')
                .filter(|c| !c.is_empty())
                .map(PathSegment::from_component)
                .collect(),
        }
    }

    /// Build a path from key names, each taken literally.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: keys
                .into_iter()
                .map(|k| PathSegment::Key(k.into()))
                .collect(),
        }
    }

    /// `["properties", <property_id>]`
    pub fn property(property_id: &str) -> Self {
        Self::from_keys(["properties", property_id])
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// Append one segment, returning the longer path.
    #[must_use]
    pub fn child(&self, segment: impl Into<PathSegment>) -> AttrPath {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        AttrPath { segments }
    }

    #[must_use]
    pub fn join(&self, other: &AttrPath) -> AttrPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        AttrPath { segments }
    }

    pub fn has_prefix(&self, prefix: &AttrPath) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix.segments == self.segments[..prefix.segments.len()]
    }

    /// Split off the final segment.
    pub fn split_last(&self) -> Option<(AttrPath, &PathSegment)> {
        let (last, parent) = self.segments.split_last()?;
        Some((
            AttrPath {
                segments: parent.to_vec(),
            },
            last,
        ))
    }

    /// Wire form: a JSON array of strings and numbers.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.segments
                .iter()
                .map(|s| match s {
                    PathSegment::Key(key) => serde_json::Value::String(key.clone()),
                    PathSegment::Index(index) => serde_json::Value::from(*index),
                })
                .collect(),
        )
    }

    pub(crate) fn invalid(&self, message: impl Into<String>) -> Error {
        Error::InvalidPath {
            path: self.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl std::ops::Index<usize> for AttrPath {
    type Output = PathSegment;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}

impl From<&str> for AttrPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl<const N: usize> From<[&str; N]> for AttrPath {
    fn from(keys: [&str; N]) -> Self {
        Self::from_keys(keys)
    }
}

impl From<Vec<PathSegment>> for AttrPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl Serialize for AttrPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.segments.len()))?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => seq.serialize_element(key)?,
                PathSegment::Index(index) => seq.serialize_element(index)?,
            }
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for AttrPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SegmentsVisitor;

        impl<'de> Visitor<'de> for SegmentsVisitor {
            type Value = AttrPath;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an array of strings and non-negative integers")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<AttrPath, A::Error> {
                let mut segments = Vec::new();
                while let Some(element) = seq.next_element::<serde_json::Value>()? {
                    let segment = match element {
                        serde_json::Value::String(key) => PathSegment::Key(key),
                        serde_json::Value::Number(n) => n
                            .as_u64()
                            .map(|i| PathSegment::Index(i as usize))
                            .ok_or_else(|| de::Error::custom("negative path index"))?,
                        other => {
                            return Err(de::Error::custom(format!(
                                "unexpected path segment {}",
                                other
                            )))
                        }
                    };
                    segments.push(segment);
                }
                Ok(AttrPath { segments })
            }
        }

        deserializer.deserialize_seq(SegmentsVisitor)
    }
}

/// Build an [`AttrPath`] from a dotted literal.
///
/// ```rust
/// use pagekit_records::attr_path;
///
/// let p = attr_path!("properties.title");
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! attr_path {
    ($s:expr) => {
        $crate::AttrPath::parse($s)
    };
}
