//! Collections: structured tables whose rows are blocks.

use std::collections::BTreeMap;

use pagekit_records::{attr_path, record_map, table, Identifier, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::{self, Block};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::property::{rich_text_to_plain, PropertyType};

/// Rows fetched per `list_rows` call.
pub const ROW_LIMIT: usize = 1000;

/// One column of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

/// Property id to column description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    entries: BTreeMap<String, SchemaEntry>,
}

impl Schema {
    /// Read a schema from a collection's `schema` attribute.
    ///
    /// Entries without a usable `type` are skipped rather than failing the
    /// whole collection.
    pub fn from_value(value: &Value) -> Self {
        let entries = value
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(id, entry)| {
                        let kind = entry.get("type")?.as_str()?;
                        Some((
                            id.clone(),
                            SchemaEntry {
                                name: entry
                                    .get("name")
                                    .and_then(Value::as_str)
                                    .unwrap_or(id)
                                    .to_string(),
                                kind: PropertyType::from(kind.to_string()),
                                options: entry.get("options").cloned().unwrap_or(Value::Null),
                            },
                        ))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SchemaEntry> {
        self.entries.get(id)
    }

    /// Find a column by property id, then by case-insensitive name.
    pub fn lookup(&self, name: &str) -> Option<(&str, &SchemaEntry)> {
        if let Some((id, entry)) = self.entries.get_key_value(name) {
            return Some((id.as_str(), entry));
        }
        self.entries
            .iter()
            .find(|(_, entry)| entry.name.eq_ignore_ascii_case(name))
            .map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }
}

pub struct Collection<'c> {
    record: Record,
    schema: Schema,
    client: Option<&'c Client>,
}

impl<'c> Collection<'c> {
    pub fn from_record(record: Record, client: Option<&'c Client>) -> Self {
        let schema = Schema::from_value(record.get(&attr_path!("schema")));
        Self {
            record,
            schema,
            client,
        }
    }

    /// Look up `collection[id]` in a record map.
    pub fn from_record_map(
        id: Identifier,
        map: &Value,
        client: Option<&'c Client>,
    ) -> Option<Self> {
        let record = record_map::resolve_record(map, table::COLLECTION, &id);
        if record.is_empty() {
            None
        } else {
            Some(Self::from_record(record, client))
        }
    }

    pub fn id(&self) -> Identifier {
        self.record.id()
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn title(&self) -> String {
        rich_text_to_plain(self.record.get(&attr_path!("name")))
    }

    pub fn description(&self) -> String {
        rich_text_to_plain(self.record.get(&attr_path!("description")))
    }

    pub fn is_detached(&self) -> bool {
        self.client.is_none()
    }

    /// Rows of this collection matching `query` (empty matches all).
    pub fn list_rows(&self, query: &str) -> Result<Vec<Block<'c>>> {
        let client = self.client.ok_or(Error::Detached { id: self.id() })?;
        let response = client.search_pages_with_parent(self.id(), query, ROW_LIMIT)?;
        let map = record_map::record_map_of(&response);

        let ids: Vec<Identifier> = match response.get("results").and_then(Value::as_array) {
            Some(results) => results
                .iter()
                .filter_map(|r| r.as_str().or_else(|| r.get("id").and_then(Value::as_str)))
                .filter_map(|id| Identifier::parse(id).ok())
                .collect(),
            None => record_map::record_ids(map, table::BLOCK),
        };

        let rows = block::children_from_record_map(&ids, map, Some(client))
            .into_iter()
            .map(|row| row.bind_schema(self.schema.clone()))
            .collect();

        Ok(block::rows_only(rows))
    }
}

impl AsRef<Record> for Collection<'_> {
    fn as_ref(&self) -> &Record {
        &self.record
    }
}

impl std::fmt::Debug for Collection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("record", &self.record)
            .field("schema", &self.schema)
            .field("detached", &self.is_detached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::from_value(&json!({
            "title": {"name": "Name", "type": "title"},
            "p1": {"name": "Due", "type": "date"},
            "p2": {"name": "Status", "type": "select", "options": [{"id": "o1", "value": "Done"}]},
            "broken": {"name": "No type"}
        }))
    }

    #[test]
    fn schema_skips_entries_without_type() {
        let schema = schema();
        assert_eq!(schema.len(), 3);
        assert!(schema.get("broken").is_none());
    }

    #[test]
    fn lookup_by_id_then_name() {
        let schema = schema();
        let (id, entry) = schema.lookup("p1").unwrap();
        assert_eq!(id, "p1");
        assert_eq!(entry.kind, PropertyType::Date);

        let (id, _) = schema.lookup("status").unwrap();
        assert_eq!(id, "p2");

        assert!(schema.lookup("Owner").is_none());
    }

    #[test]
    fn options_are_kept() {
        let schema = schema();
        assert_eq!(schema.get("p2").unwrap().options[0]["value"], json!("Done"));
        assert!(schema.get("p1").unwrap().options.is_null());
    }

    #[test]
    fn non_object_schema_is_empty() {
        assert!(Schema::from_value(&json!(null)).is_empty());
        assert!(Schema::from_value(&json!([1, 2])).is_empty());
    }

    #[test]
    fn collection_from_record_map() {
        let id = Identifier::parse("c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0").unwrap();
        let map = json!({
            "collection": {
                id.to_string(): {"value": {
                    "name": [["Tasks"]],
                    "description": [["Things ", [["b"]]], ["to do"]],
                    "schema": {"title": {"name": "Name", "type": "title"}}
                }}
            }
        });

        let collection = Collection::from_record_map(id, &map, None).unwrap();
        assert_eq!(collection.title(), "Tasks");
        assert_eq!(collection.description(), "Things to do");
        assert_eq!(collection.schema().len(), 1);
        assert!(collection.is_detached());
    }

    #[test]
    fn missing_collection_is_none() {
        let id = Identifier::generate();
        assert!(Collection::from_record_map(id, &json!({}), None).is_none());
    }

    #[test]
    fn detached_collection_cannot_list_rows() {
        let id = Identifier::generate();
        let collection = Collection::from_record(Record::empty(id, table::COLLECTION), None);
        assert!(matches!(collection.list_rows(""), Err(Error::Detached { .. })));
    }
}
