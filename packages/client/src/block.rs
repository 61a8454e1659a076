//! The typed block hierarchy.
//!
//! A [`Block`] is a record from the `block` table plus a [`BlockKind`]
//! selected from its `type` attribute. The mapping from discriminant to
//! kind is closed: anything not listed becomes [`BlockKind::Generic`],
//! which still supports attribute access and mutation.
//!
//! Blocks fetched through a [`Client`] keep a borrowed handle to it and can
//! load children, flush edits and so on. Blocks built straight from a
//! record map without a client are detached: attributes can be read, but
//! anything that writes or talks to the network fails with
//! [`Error::Detached`].

use std::fmt;

use pagekit_records::{attr_path, record_map, table, AttrPath, Identifier, Record};
use serde_json::Value;

use crate::client::Client;
use crate::collection::{Collection, Schema};
use crate::error::{Error, Result};
use crate::operation::{build_set_operation, Operation};
use crate::property::{rich_text_to_plain, Property, PropertyType, PropertyValue};

const TITLE: &str = "title";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Page,
    Text,
    Header,
    SubHeader,
    ToDo,
    BulletedList,
    NumberedList,
    CollectionView,
    CollectionViewPage,
    /// A page living inside a collection; its properties follow the
    /// collection's schema.
    CollectionRow { collection_id: Option<Identifier> },
    Generic(String),
}

impl BlockKind {
    /// Select the kind for a block's `type` and `parent_table`.
    pub fn from_discriminant(
        block_type: &str,
        parent_table: Option<&str>,
        parent_id: Option<Identifier>,
    ) -> Self {
        if block_type == "collection_row"
            || (block_type == "page" && parent_table == Some(table::COLLECTION))
        {
            return BlockKind::CollectionRow {
                collection_id: parent_id,
            };
        }

        match block_type {
            "page" => BlockKind::Page,
            "text" => BlockKind::Text,
            "header" => BlockKind::Header,
            "sub_header" => BlockKind::SubHeader,
            "to_do" => BlockKind::ToDo,
            "bulleted_list" => BlockKind::BulletedList,
            "numbered_list" => BlockKind::NumberedList,
            "collection_view" => BlockKind::CollectionView,
            "collection_view_page" => BlockKind::CollectionViewPage,
            other => BlockKind::Generic(other.to_string()),
        }
    }

    pub fn is_collection_backed(&self) -> bool {
        matches!(self, BlockKind::CollectionView | BlockKind::CollectionViewPage)
    }
}

pub struct Block<'c> {
    record: Record,
    kind: BlockKind,
    schema: Option<Schema>,
    client: Option<&'c Client>,
    pending: Vec<Operation>,
}

impl<'c> Block<'c> {
    pub fn from_record(record: Record, client: Option<&'c Client>) -> Self {
        let parent_id = record
            .get_str("parent_id")
            .and_then(|id| Identifier::parse(id).ok());
        let kind = BlockKind::from_discriminant(
            record.get_str("type").unwrap_or_default(),
            record.get_str("parent_table"),
            parent_id,
        );

        Self {
            record,
            kind,
            schema: None,
            client,
            pending: Vec::new(),
        }
    }

    /// Build `block[id]` out of a record map.
    ///
    /// Rows pick up their collection's schema when the record map carries
    /// the parent collection too. Returns `None` when the map has no such
    /// block.
    pub fn from_record_map(
        id: Identifier,
        map: &Value,
        client: Option<&'c Client>,
    ) -> Option<Self> {
        let record = record_map::resolve_record(map, table::BLOCK, &id);
        if record.is_empty() {
            return None;
        }

        let block = Self::from_record(record, client);
        let schema = block
            .collection_id()
            .and_then(|collection_id| Collection::from_record_map(collection_id, map, None))
            .map(|collection| collection.schema().clone());

        Some(match schema {
            Some(schema) => block.bind_schema(schema),
            None => block,
        })
    }

    /// Attach a collection schema. Only rows keep it.
    pub fn bind_schema(mut self, schema: Schema) -> Self {
        if self.is_collection_row() {
            self.schema = Some(schema);
        }
        self
    }

    pub fn id(&self) -> Identifier {
        self.record.id()
    }

    pub fn block_type(&self) -> &str {
        self.record.get_str("type").unwrap_or_default()
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn parent_id(&self) -> Option<Identifier> {
        self.record
            .get_str("parent_id")
            .and_then(|id| Identifier::parse(id).ok())
    }

    pub fn parent_table(&self) -> Option<&str> {
        self.record.get_str("parent_table")
    }

    /// Child block ids in display order.
    pub fn content(&self) -> Vec<Identifier> {
        self.record
            .get(&attr_path!("content"))
            .as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .filter_map(|id| Identifier::parse(id).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn alive(&self) -> bool {
        self.record.alive()
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn get(&self, path: &AttrPath) -> &Value {
        self.record.get(path)
    }

    /// Write `value` at `path` and queue the matching operation.
    ///
    /// Nothing is sent until [`Block::flush`].
    pub fn set(&mut self, path: AttrPath, value: Value) -> Result<()> {
        self.client()?;
        self.record.set(&path, value.clone())?;
        let op = build_set_operation(&self.record, path, &PropertyValue::Raw(value));
        self.pending.push(op);
        Ok(())
    }

    /// Encode `value` for the property `name` and [`set`](Block::set) it.
    ///
    /// `name` is either `title` or a schema property id or name.
    pub fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        let (path, kind) = self.resolve_property(name)?;
        if let Some(kind) = kind {
            value.check_kind(name, &kind)?;
        }
        self.client()?;

        let op = build_set_operation(&self.record, path, &value);
        self.record.set(&op.path, op.args.clone())?;
        self.pending.push(op);
        Ok(())
    }

    fn resolve_property(&self, name: &str) -> Result<(AttrPath, Option<PropertyType>)> {
        if let Some((id, entry)) = self.schema.as_ref().and_then(|s| s.lookup(name)) {
            return Ok((AttrPath::property(id), Some(entry.kind.clone())));
        }
        if name == TITLE {
            return Ok((AttrPath::property(TITLE), Some(PropertyType::Title)));
        }
        Err(Error::UnknownProperty {
            name: name.to_string(),
        })
    }

    pub fn pending_operations(&self) -> &[Operation] {
        &self.pending
    }

    pub fn take_pending(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn title(&self) -> String {
        if self.kind.is_collection_backed() {
            let name = rich_text_to_plain(self.record.get(&attr_path!("name")));
            if !name.is_empty() {
                return name;
            }
        }

        let title = self.record.get(&AttrPath::property(TITLE));
        if !title.is_null() {
            return rich_text_to_plain(title);
        }
        rich_text_to_plain(self.record.get(&attr_path!("title")))
    }

    pub fn is_detached(&self) -> bool {
        self.client.is_none()
    }

    /// The client this block was fetched with.
    pub fn client(&self) -> Result<&'c Client> {
        self.client.ok_or(Error::Detached { id: self.id() })
    }

    pub fn is_collection_row(&self) -> bool {
        matches!(self.kind, BlockKind::CollectionRow { .. })
    }

    fn collection_id(&self) -> Option<Identifier> {
        match &self.kind {
            BlockKind::CollectionRow { collection_id } => *collection_id,
            BlockKind::CollectionView | BlockKind::CollectionViewPage => self
                .record
                .get_str("collection_id")
                .and_then(|id| Identifier::parse(id).ok()),
            _ => None,
        }
    }

    /// Typed views of every schema property. Empty unless this is a row
    /// with a bound schema.
    pub fn properties(&self) -> Vec<Property<'_>> {
        let Some(schema) = &self.schema else {
            return Vec::new();
        };
        schema
            .iter()
            .map(|(id, entry)| Property::new(id, entry, self.record.get(&AttrPath::property(id))))
            .collect()
    }

    pub fn property(&self, name: &str) -> Result<Property<'_>> {
        self.schema
            .as_ref()
            .and_then(|schema| schema.lookup(name))
            .map(|(id, entry)| Property::new(id, entry, self.record.get(&AttrPath::property(id))))
            .ok_or_else(|| Error::UnknownProperty {
                name: name.to_string(),
            })
    }

    /// The collection behind a row or a collection view.
    pub fn collection(&self) -> Result<Collection<'c>> {
        let client = self.client()?;
        let collection_id = self.collection_id().ok_or_else(|| Error::RecordNotFound {
            table: table::COLLECTION.to_string(),
            id: None,
        })?;
        client.get_collection(collection_id)
    }

    /// Fetch child blocks in content order.
    pub fn children(&self) -> Result<Vec<Block<'c>>> {
        let client = self.client()?;
        client.get_blocks(&self.content())
    }

    /// Children found in an already loaded record map.
    pub fn children_in(&self, map: &Value) -> Vec<Block<'c>> {
        children_from_record_map(&self.content(), map, self.client)
    }

    /// Send pending operations with `saveTransactions`.
    ///
    /// Operations stay queued if the request fails.
    pub fn flush(&mut self) -> Result<()> {
        let client = self.client()?;
        if self.pending.is_empty() {
            return Ok(());
        }
        client.save_transactions(&self.pending)?;
        self.pending.clear();
        Ok(())
    }

    /// Apply `updates` and save them. See [`Client::update_record`].
    pub fn update<I, K, V>(&mut self, updates: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<PropertyValue>,
    {
        let client = self.client()?;
        client.update_record(self, updates)
    }

    pub fn attributes(&self) -> &Value {
        self.record.attributes()
    }
}

/// Wrap `ids` found in `map` as blocks, keeping the order of `ids`.
/// Ids missing from the map are skipped.
pub fn children_from_record_map<'c>(
    ids: &[Identifier],
    map: &Value,
    client: Option<&'c Client>,
) -> Vec<Block<'c>> {
    ids.iter()
        .filter_map(|id| Block::from_record_map(*id, map, client))
        .collect()
}

/// Keep collection rows only.
pub fn rows_only(blocks: Vec<Block<'_>>) -> Vec<Block<'_>> {
    blocks
        .into_iter()
        .filter(Block::is_collection_row)
        .collect()
}

impl AsRef<Record> for Block<'_> {
    fn as_ref(&self) -> &Record {
        &self.record
    }
}

impl fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("record", &self.record)
            .field("kind", &self.kind)
            .field("schema", &self.schema)
            .field("pending", &self.pending.len())
            .field("detached", &self.is_detached())
            .finish()
    }
}
