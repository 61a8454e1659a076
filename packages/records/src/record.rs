//! The untyped record: an identifier, the table it lives in, and a free-form
//! attribute tree.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::id::Identifier;
use crate::path::AttrPath;
use crate::value_utils;

static NULL: Value = Value::Null;

/// Table names used by the remote API.
pub mod table {
    pub const BLOCK: &str = "block";
    pub const COLLECTION: &str = "collection";
    pub const COLLECTION_VIEW: &str = "collection_view";
    pub const SPACE: &str = "space";
    pub const USER: &str = "notion_user";
}

/// A server-side entity.
///
/// Records are rebuilt from every response. Two records never share
/// attribute state, so mutating one has no effect on any other copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: Identifier,
    table: String,
    attributes: Value,
}

impl Record {
    pub fn new(id: Identifier, table: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            id,
            table: table.into(),
            attributes: Value::Object(attributes),
        }
    }

    /// A record with no attributes.
    pub fn empty(id: Identifier, table: impl Into<String>) -> Self {
        Self::new(id, table, Map::new())
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn attributes(&self) -> &Value {
        &self.attributes
    }

    pub fn into_attributes(self) -> Value {
        self.attributes
    }

    /// True when the server returned nothing for this record.
    pub fn is_empty(&self) -> bool {
        match &self.attributes {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    /// Read the attribute at `path`; missing paths read as `null`.
    pub fn get(&self, path: &AttrPath) -> &Value {
        value_utils::get_path(&self.attributes, path).unwrap_or(&NULL)
    }

    /// Read a top-level string attribute.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Write the attribute at `path`, creating intermediate containers.
    pub fn set(&mut self, path: &AttrPath, value: Value) -> Result<(), Error> {
        value_utils::set_path(&mut self.attributes, path, value)
    }

    pub fn version(&self) -> Option<u64> {
        self.attributes.get("version").and_then(Value::as_u64)
    }

    /// Records default to alive unless the server says otherwise.
    pub fn alive(&self) -> bool {
        self.attributes
            .get("alive")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }
}

impl AsRef<Record> for Record {
    fn as_ref(&self) -> &Record {
        self
    }
}

/// A `{table, id}` pair naming one record to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRequest {
    pub table: String,
    pub id: Identifier,
}

impl RecordRequest {
    pub fn new(table: impl Into<String>, id: Identifier) -> Self {
        Self {
            table: table.into(),
            id,
        }
    }

    pub fn block(id: Identifier) -> Self {
        Self::new(table::BLOCK, id)
    }

    pub fn collection(id: Identifier) -> Self {
        Self::new(table::COLLECTION, id)
    }
}
