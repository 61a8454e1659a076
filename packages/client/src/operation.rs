//! Wire-level mutation records.
//!
//! An [`Operation`] is one path-addressed `set` against one record. Values
//! are encoded here and nowhere else: dates become mention markup, raw JSON
//! passes through unchanged and every other value becomes single-segment
//! rich text.

use pagekit_records::{AttrPath, Identifier, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::property::{plain_to_rich_text, PropertyValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "id")]
    pub target_id: Identifier,
    pub path: AttrPath,
    pub args: Value,
    pub command: Command,
    pub table: String,
}

impl Operation {
    /// A `set` of already-encoded `args` at `path`.
    pub fn set(
        target_id: Identifier,
        table: impl Into<String>,
        path: AttrPath,
        args: Value,
    ) -> Self {
        Self {
            target_id,
            path,
            args,
            command: Command::Set,
            table: table.into(),
        }
    }
}

/// Encode a property value into the form the service stores it as.
pub fn encode_value(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Date(date) => date.to_markup(),
        PropertyValue::Raw(raw) => raw.clone(),
        other => plain_to_rich_text(&other.as_text()),
    }
}

/// Build a `set` operation writing `value` to `path` of `target`.
pub fn build_set_operation(target: &Record, path: AttrPath, value: &PropertyValue) -> Operation {
    Operation::set(target.id(), target.table(), path, encode_value(value))
}
