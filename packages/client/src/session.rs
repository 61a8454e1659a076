//! The signed-in user and the space they work in.
//!
//! Loaded once from `loadUserContent` when a client is built and passed
//! wherever new records need `created_by` / `space_id` stamps.

use pagekit_records::{record_map, table, Identifier, Record};
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct SessionContext {
    user: Record,
    space: Record,
}

impl SessionContext {
    pub fn new(user: Record, space: Record) -> Self {
        Self { user, space }
    }

    /// Pick the user and space out of a `loadUserContent` response.
    ///
    /// With `space_id` set that space must be present; otherwise the first
    /// space in the response is used.
    pub fn from_user_content(response: &Value, space_id: Option<Identifier>) -> Result<Self> {
        let map = record_map::record_map_of(response);

        let user = first_record(map, table::USER, None)?;
        let space = first_record(map, table::SPACE, space_id)?;

        Ok(Self { user, space })
    }

    pub fn user(&self) -> &Record {
        &self.user
    }

    pub fn space(&self) -> &Record {
        &self.space
    }

    pub fn user_id(&self) -> Identifier {
        self.user.id()
    }

    pub fn space_id(&self) -> Identifier {
        self.space.id()
    }
}

fn first_record(map: &Value, table: &str, wanted: Option<Identifier>) -> Result<Record> {
    let id = match wanted {
        Some(id) => Some(id),
        None => record_map::record_ids(map, table).into_iter().next(),
    };

    id.map(|id| record_map::resolve_record(map, table, &id))
        .filter(|record| !record.is_empty())
        .ok_or_else(|| Error::RecordNotFound {
            table: table.to_string(),
            id: wanted,
        })
}
