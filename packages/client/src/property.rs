//! Collection row properties.
//!
//! Row values are stored under `properties.<property-id>` in the service's
//! rich-text form: an array of segments, each `[text]` or
//! `[text, [formatting..]]`. What the text means depends on the schema type
//! of the property, so decoding always goes through a [`PropertyType`].

use std::fmt;

use chrono::NaiveDate;
use pagekit_records::AttrPath;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::collection::SchemaEntry;
use crate::error::{Error, Result};

/// Marker character the service uses for inline mentions and dates.
pub const MENTION_MARKER: &str = "‣";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Schema type of a collection property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    Title,
    Text,
    Number,
    Select,
    MultiSelect,
    Date,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
    Other(String),
}

impl PropertyType {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::Title => "title",
            PropertyType::Text => "text",
            PropertyType::Number => "number",
            PropertyType::Select => "select",
            PropertyType::MultiSelect => "multi_select",
            PropertyType::Date => "date",
            PropertyType::Checkbox => "checkbox",
            PropertyType::Url => "url",
            PropertyType::Email => "email",
            PropertyType::PhoneNumber => "phone_number",
            PropertyType::Other(other) => other,
        }
    }

    fn is_textual(&self) -> bool {
        matches!(
            self,
            PropertyType::Title
                | PropertyType::Text
                | PropertyType::Url
                | PropertyType::Email
                | PropertyType::PhoneNumber
        )
    }
}

impl From<String> for PropertyType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "title" => PropertyType::Title,
            "text" => PropertyType::Text,
            "number" => PropertyType::Number,
            "select" => PropertyType::Select,
            "multi_select" => PropertyType::MultiSelect,
            "date" => PropertyType::Date,
            "checkbox" => PropertyType::Checkbox,
            "url" => PropertyType::Url,
            "email" => PropertyType::Email,
            "phone_number" => PropertyType::PhoneNumber,
            _ => PropertyType::Other(s),
        }
    }
}

impl From<PropertyType> for String {
    fn from(kind: PropertyType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar date or date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotionDate {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl NotionDate {
    pub fn new(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// The nested mention markup the service stores dates as:
    /// `[["‣", [["d", {"type": "date", "start_date": "2024-01-01"}]]]]`.
    pub fn to_markup(&self) -> Value {
        let mut details = json!({
            "type": if self.end.is_some() { "daterange" } else { "date" },
            "start_date": self.start.format(DATE_FORMAT).to_string(),
        });
        if let Some(end) = self.end {
            details["end_date"] = json!(end.format(DATE_FORMAT).to_string());
        }
        json!([[MENTION_MARKER, [["d", details]]]])
    }

    /// Find the first date mention in a rich-text value.
    pub fn from_markup(value: &Value) -> Option<Self> {
        let segments = value.as_array()?;
        for segment in segments {
            let Some(formats) = segment.get(1).and_then(Value::as_array) else {
                continue;
            };
            for format in formats {
                if format.get(0).and_then(Value::as_str) != Some("d") {
                    continue;
                }
                let details = format.get(1)?;
                let start = parse_date(details.get("start_date")?)?;
                let end = details.get("end_date").and_then(parse_date);
                return Some(Self { start, end });
            }
        }
        None
    }
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.as_str()?, DATE_FORMAT).ok()
}

impl From<NaiveDate> for NotionDate {
    fn from(start: NaiveDate) -> Self {
        Self::new(start)
    }
}

impl fmt::Display for NotionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{} → {}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

/// A typed value to write to (or read from) a record attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Select(String),
    MultiSelect(Vec<String>),
    Checkbox(bool),
    Date(NotionDate),
    /// Written verbatim; no rich-text wrapping.
    Raw(Value),
}

impl PropertyValue {
    /// The plain text the value is stored as inside rich text.
    pub fn as_text(&self) -> String {
        match self {
            PropertyValue::Text(s) | PropertyValue::Select(s) => s.clone(),
            PropertyValue::Number(n) => n.to_string(),
            PropertyValue::MultiSelect(values) => values.join(","),
            PropertyValue::Checkbox(true) => "Yes".to_string(),
            PropertyValue::Checkbox(false) => "No".to_string(),
            PropertyValue::Date(date) => date.to_string(),
            PropertyValue::Raw(value) => rich_text_to_plain(value),
        }
    }

    /// Check that this value can be stored in a property of `kind`.
    pub fn check_kind(&self, name: &str, kind: &PropertyType) -> Result<()> {
        let compatible = match (self, kind) {
            (PropertyValue::Raw(_), _) | (_, PropertyType::Other(_)) => true,
            (PropertyValue::Text(_), k) => k.is_textual() || *k == PropertyType::Select,
            (PropertyValue::Select(_), k) => *k == PropertyType::Select || k.is_textual(),
            (PropertyValue::MultiSelect(_), k) => *k == PropertyType::MultiSelect,
            (PropertyValue::Number(_), k) => *k == PropertyType::Number,
            (PropertyValue::Checkbox(_), k) => *k == PropertyType::Checkbox,
            (PropertyValue::Date(_), k) => *k == PropertyType::Date,
        };

        if compatible {
            Ok(())
        } else {
            Err(Error::InvalidValue {
                name: name.to_string(),
                message: format!("{:?} cannot be stored in a '{}' property", self, kind),
            })
        }
    }

    /// Decode a stored rich-text value according to its schema type.
    ///
    /// Returns `None` for missing or empty values.
    pub fn decode(raw: &Value, kind: &PropertyType) -> Option<Self> {
        if raw.is_null() {
            return None;
        }

        if let PropertyType::Other(_) = kind {
            return Some(PropertyValue::Raw(raw.clone()));
        }

        if *kind == PropertyType::Date {
            return NotionDate::from_markup(raw).map(PropertyValue::Date);
        }

        let text = rich_text_to_plain(raw);
        if text.is_empty() {
            return None;
        }

        Some(match kind {
            PropertyType::Number => match text.trim().parse::<f64>() {
                Ok(n) => PropertyValue::Number(n),
                Err(_) => PropertyValue::Raw(raw.clone()),
            },
            PropertyType::Select => PropertyValue::Select(text),
            PropertyType::MultiSelect => PropertyValue::MultiSelect(
                text.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            PropertyType::Checkbox => PropertyValue::Checkbox(text == "Yes"),
            _ => PropertyValue::Text(text),
        })
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Checkbox(b)
    }
}

impl From<NaiveDate> for PropertyValue {
    fn from(date: NaiveDate) -> Self {
        PropertyValue::Date(NotionDate::new(date))
    }
}

impl From<NotionDate> for PropertyValue {
    fn from(date: NotionDate) -> Self {
        PropertyValue::Date(date)
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::Raw(value)
    }
}

/// Wrap plain text as a single unformatted rich-text segment.
pub fn plain_to_rich_text(text: &str) -> Value {
    json!([[text]])
}

/// Flatten rich text to its plain characters.
///
/// Plain strings pass through, so attributes the service stores either way
/// (`title`, `name`) read the same.
pub fn rich_text_to_plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(segments) => segments
            .iter()
            .filter_map(|segment| match segment {
                Value::Array(parts) => parts.first().and_then(Value::as_str),
                Value::String(s) => Some(s.as_str()),
                _ => None,
            })
            .collect(),
        _ => String::new(),
    }
}

/// A view over one property of a collection row.
#[derive(Debug, Clone, Copy)]
pub struct Property<'a> {
    id: &'a str,
    entry: &'a SchemaEntry,
    raw: &'a Value,
}

impl<'a> Property<'a> {
    pub(crate) fn new(id: &'a str, entry: &'a SchemaEntry, raw: &'a Value) -> Self {
        Self { id, entry, raw }
    }

    pub fn id(&self) -> &'a str {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.entry.name
    }

    pub fn kind(&self) -> &'a PropertyType {
        &self.entry.kind
    }

    pub fn entry(&self) -> &'a SchemaEntry {
        self.entry
    }

    /// Attribute path used in update operations.
    pub fn path(&self) -> AttrPath {
        AttrPath::property(self.id)
    }

    /// The stored value, undecoded.
    pub fn raw(&self) -> &'a Value {
        self.raw
    }

    pub fn value(&self) -> Option<PropertyValue> {
        PropertyValue::decode(self.raw, &self.entry.kind)
    }
}
