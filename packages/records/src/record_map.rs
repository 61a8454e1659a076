//! Record map resolution.
//!
//! Most read endpoints answer with a record map shaped
//! `{ table: { id: { value: attributes, role, .. } } }`. The bulk
//! `getRecordValues` endpoint instead answers with a `results` array
//! aligned position-for-position with the request list. Resolution never
//! fails: anything missing comes back as an empty attribute map, and the
//! caller decides whether empty means "not found".

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::id::Identifier;
use crate::record::{Record, RecordRequest};

/// Attribute map of a single record.
pub type Attributes = Map<String, Value>;

/// Return the record map inside a response, accepting either the full
/// `{recordMap: ..}` envelope or the bare map.
pub fn record_map_of(response: &Value) -> &Value {
    response.get("recordMap").unwrap_or(response)
}

fn value_of(entry: &Value) -> Attributes {
    entry
        .get("value")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Attributes of `table[id].value`, or an empty map.
pub fn resolve_one(record_map: &Value, table: &str, id: &Identifier) -> Attributes {
    record_map
        .get(table)
        .and_then(|records| records.get(id.to_string()))
        .map(value_of)
        .unwrap_or_default()
}

/// Like [`resolve_one`], wrapped into a [`Record`].
pub fn resolve_record(record_map: &Value, table: &str, id: &Identifier) -> Record {
    Record::new(*id, table, resolve_one(record_map, table, id))
}

/// Pair each request with the result at the same position.
///
/// Requests beyond the end of `results` resolve to empty maps.
pub fn resolve_ordered(
    response: &Value,
    requests: &[RecordRequest],
) -> Vec<(RecordRequest, Attributes)> {
    let results = response
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    requests
        .iter()
        .enumerate()
        .map(|(i, request)| {
            let attributes = results.get(i).map(value_of).unwrap_or_default();
            (request.clone(), attributes)
        })
        .collect()
}

/// Re-key a `getRecordValues` response by identifier.
///
/// When the same identifier appears more than once, the later position
/// wins.
pub fn resolve_many(
    response: &Value,
    requests: &[RecordRequest],
) -> HashMap<Identifier, Attributes> {
    resolve_ordered(response, requests)
        .into_iter()
        .map(|(request, attributes)| (request.id, attributes))
        .collect()
}

/// Identifiers present under `table`, skipping keys that do not parse.
pub fn record_ids(record_map: &Value, table: &str) -> Vec<Identifier> {
    record_map
        .get(table)
        .and_then(Value::as_object)
        .map(|records| {
            records
                .keys()
                .filter_map(|key| Identifier::parse(key).ok())
                .collect()
        })
        .unwrap_or_default()
}
