//! The API client.
//!
//! A [`Client`] owns the cached gateway and the session context. Every
//! read goes through the gateway cache under a key derived from the
//! request; writes are always sent.

use std::sync::Arc;

use chrono::Utc;
use pagekit_http::{CachedGateway, HttpExecutor, ReqwestExecutor, ResponseCache};
use pagekit_records::{record_map, table, AttrPath, Identifier, Record, RecordRequest};
use serde::Serialize;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::block::Block;
use crate::collection::Collection;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::property::PropertyValue;
use crate::session::SessionContext;
use crate::transaction::{
    SaveTransactionsRequest, SubmitTransactionRequest, SAVE_ENDPOINT, SUBMIT_ENDPOINT,
};

/// Blocks requested per `loadPageChunk` call.
pub const PAGE_CHUNK_LIMIT: usize = 100;

pub struct Client {
    gateway: CachedGateway,
    session: SessionContext,
    config: ClientConfig,
}

impl Client {
    /// Connect with the default HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let executor = ReqwestExecutor::with_default_timeout().map_err(Error::config)?;
        Self::with_executor(config, Arc::new(executor))
    }

    /// Connect through `executor`, then load the session.
    pub fn with_executor(config: ClientConfig, executor: Arc<dyn HttpExecutor>) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(ResponseCache::new(config.cache_lifetime));
        let gateway = CachedGateway::new(
            &config.api_base_url,
            config.token.clone(),
            executor,
            cache,
        )?;

        let user_content = gateway.execute("user_content", "loadUserContent", &Value::Null)?;
        let session = SessionContext::from_user_content(&user_content, config.space_id)?;

        tracing::info!(
            user = %session.user_id(),
            space = %session.space_id(),
            cache = %config.cache_lifetime,
            "session loaded"
        );

        Ok(Self {
            gateway,
            session,
            config,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Forget every cached response.
    pub fn clear_cache(&self) {
        self.gateway.cache().clear();
    }

    fn page_chunk_body(page_id: Identifier, chunk_number: u32) -> Value {
        json!({
            "pageId": page_id,
            "limit": PAGE_CHUNK_LIMIT,
            "cursor": {"stack": []},
            "chunkNumber": chunk_number,
            "verticalColumns": false,
        })
    }

    /// Raw `loadPageChunk` response for one chunk of a page.
    pub fn load_page_chunk(&self, page_id: Identifier, chunk_number: u32) -> Result<Value> {
        let key = format!("chunk:{}:{}", page_id, chunk_number);
        let body = Self::page_chunk_body(page_id, chunk_number);
        Ok(self.gateway.execute(&key, "loadPageChunk", &body)?)
    }

    /// Fetch a block by id.
    ///
    /// Collection rows come back with their collection's schema bound,
    /// fetching the collection separately when the page chunk lacks it.
    pub fn get_block(&self, id: Identifier) -> Result<Block<'_>> {
        let response = self.load_page_chunk(id, 0)?;
        let map = record_map::record_map_of(&response);

        let block = Block::from_record_map(id, map, Some(self))
            .ok_or_else(|| Error::not_found(table::BLOCK, id))?;
        self.with_row_schema(block)
    }

    pub fn get_block_by_url(&self, url: &str) -> Result<Block<'_>> {
        self.get_block(Identifier::from_url(url)?)
    }

    fn with_row_schema<'c>(&'c self, block: Block<'c>) -> Result<Block<'c>> {
        if !block.is_collection_row() || block.schema().is_some() {
            return Ok(block);
        }
        match block.parent_id() {
            Some(collection_id) => match self.get_collection(collection_id) {
                Ok(collection) => Ok(block.bind_schema(collection.schema().clone())),
                Err(Error::RecordNotFound { .. }) => {
                    tracing::warn!(row = %block.id(), %collection_id, "row collection not found");
                    Ok(block)
                }
                Err(e) => Err(e),
            },
            None => Ok(block),
        }
    }

    /// Fetch records in bulk with `getRecordValues`.
    ///
    /// The result is aligned with `requests`; records the server did not
    /// return are empty.
    pub fn get_record_values(&self, requests: &[RecordRequest]) -> Result<Vec<Record>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let serialized = serde_json::to_string(requests)?;
        let key = format!("records:{:x}", Sha256::digest(serialized.as_bytes()));
        let response = self
            .gateway
            .execute(&key, "getRecordValues", &json!({ "requests": requests }))?;

        Ok(record_map::resolve_ordered(&response, requests)
            .into_iter()
            .map(|(request, attributes)| Record::new(request.id, request.table, attributes))
            .collect())
    }

    /// Fetch blocks in the given order, skipping any the server does not
    /// know. Rows get their collection schemas bound.
    pub fn get_blocks(&self, ids: &[Identifier]) -> Result<Vec<Block<'_>>> {
        let requests: Vec<RecordRequest> = ids.iter().copied().map(RecordRequest::block).collect();
        let blocks: Vec<Block<'_>> = self
            .get_record_values(&requests)?
            .into_iter()
            .filter(|record| !record.is_empty())
            .map(|record| Block::from_record(record, Some(self)))
            .collect();

        let mut collection_ids: Vec<Identifier> = blocks
            .iter()
            .filter(|block| block.is_collection_row())
            .filter_map(Block::parent_id)
            .collect();
        collection_ids.sort();
        collection_ids.dedup();

        if collection_ids.is_empty() {
            return Ok(blocks);
        }

        let collections: Vec<Collection<'_>> = self
            .get_record_values(
                &collection_ids
                    .iter()
                    .copied()
                    .map(RecordRequest::collection)
                    .collect::<Vec<_>>(),
            )?
            .into_iter()
            .filter(|record| !record.is_empty())
            .map(|record| Collection::from_record(record, Some(self)))
            .collect();

        Ok(blocks
            .into_iter()
            .map(|block| {
                let schema = block.parent_id().and_then(|parent| {
                    collections
                        .iter()
                        .find(|c| c.id() == parent)
                        .map(|c| c.schema().clone())
                });
                match schema {
                    Some(schema) if block.is_collection_row() => block.bind_schema(schema),
                    _ => block,
                }
            })
            .collect())
    }

    pub fn get_collection(&self, id: Identifier) -> Result<Collection<'_>> {
        self.get_record_values(&[RecordRequest::collection(id)])?
            .into_iter()
            .find(|record| !record.is_empty())
            .map(|record| Collection::from_record(record, Some(self)))
            .ok_or_else(|| Error::not_found(table::COLLECTION, id))
    }

    /// Pages under `parent` matching `query`, scoped to the session space.
    pub fn search_pages_with_parent(
        &self,
        parent: Identifier,
        query: &str,
        limit: usize,
    ) -> Result<Value> {
        let key = format!("search:{}:{}:{}", parent, query, limit);
        let body = json!({
            "query": query,
            "parentId": parent,
            "limit": limit,
            "spaceId": self.session.space_id(),
        });
        Ok(self.gateway.execute(&key, "searchPagesWithParent", &body)?)
    }

    /// Run a collection view query. The response shape is the server's.
    pub fn query_collection(
        &self,
        collection_id: Identifier,
        view_id: Identifier,
        search: &str,
        query: &Value,
    ) -> Result<Value> {
        let body = json!({
            "collectionId": collection_id,
            "collectionViewId": view_id,
            "loader": {
                "type": "table",
                "limit": 1000,
                "searchQuery": search,
            },
            "query": query,
        });
        let key = format!(
            "query:{}:{}:{:x}",
            collection_id,
            view_id,
            Sha256::digest(body.to_string().as_bytes())
        );
        Ok(self.gateway.execute(&key, "queryCollection", &body)?)
    }

    /// Apply `updates` to `block` and save them in one `saveTransactions`
    /// call.
    ///
    /// Each entry is resolved and applied in order. An entry naming an
    /// unknown property stops the update before anything is sent; entries
    /// before it stay applied in memory and queued on the block.
    pub fn update_record<I, K, V>(&self, block: &mut Block<'_>, updates: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<PropertyValue>,
    {
        for (name, value) in updates {
            block.set_property(name.as_ref(), value.into())?;
        }

        if block.pending_operations().is_empty() {
            return Ok(());
        }
        self.save_transactions(block.pending_operations())?;
        block.clear_pending();
        Ok(())
    }

    /// Create a record under `parent` and return its new id.
    ///
    /// The initial attributes are sent in a single `submitTransaction`
    /// operation together with the bookkeeping fields, which take
    /// precedence over caller-supplied values of the same name.
    pub fn create_record(
        &self,
        table: &str,
        parent: &impl AsRef<Record>,
        attributes: Map<String, Value>,
    ) -> Result<Identifier> {
        let id = Identifier::generate();
        let parent = parent.as_ref();

        let mut args = attributes;
        args.insert("id".to_string(), json!(id));
        args.insert("version".to_string(), json!(1));
        args.insert("alive".to_string(), json!(true));
        args.insert("created_by".to_string(), json!(self.session.user_id()));
        args.insert("created_time".to_string(), json!(Utc::now().timestamp_millis()));
        args.insert("parent_id".to_string(), json!(parent.id()));
        args.insert("parent_table".to_string(), json!(parent.table()));
        args.insert("space_id".to_string(), json!(self.session.space_id()));

        let op = Operation::set(id, table, AttrPath::root(), Value::Object(args));
        self.submit_transaction(&[op])?;

        tracing::info!(%id, table, parent = %parent.id(), "record created");
        Ok(id)
    }

    /// Send operations with `submitTransaction`.
    pub fn submit_transaction(&self, operations: &[Operation]) -> Result<()> {
        tracing::debug!(operations = operations.len(), "submitting transaction");
        self.post(SUBMIT_ENDPOINT, &SubmitTransactionRequest { operations })
    }

    /// Send operations as one transaction with `saveTransactions`.
    pub fn save_transactions(&self, operations: &[Operation]) -> Result<()> {
        tracing::debug!(operations = operations.len(), "saving transaction");
        self.post(
            SAVE_ENDPOINT,
            &SaveTransactionsRequest::single(self.session.space_id(), operations),
        )
    }

    fn post<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<()> {
        self.gateway.post(endpoint, &serde_json::to_value(body)?)?;
        Ok(())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_base_url", &self.gateway.base_url().as_str())
            .field("session", &self.session)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_http::{CacheLifetime, MockExecutor};

    const USER: &str = "aaaaaaaa-0000-4000-8000-000000000001";
    const SPACE: &str = "bbbbbbbb-0000-4000-8000-000000000001";
    const PAGE: &str = "cccccccc-0000-4000-8000-000000000001";

    fn executor() -> MockExecutor {
        MockExecutor::new().with_json(
            "loadUserContent",
            json!({"recordMap": {
                "notion_user": {USER: {"value": {"email": "me@example.com"}}},
                "space": {SPACE: {"value": {"name": "Home"}}}
            }}),
        )
    }

    fn client(executor: &MockExecutor, lifetime: CacheLifetime) -> Client {
        Client::with_executor(
            ClientConfig::new("tok").with_cache_lifetime(lifetime),
            Arc::new(executor.clone()),
        )
        .unwrap()
    }

    fn page_id() -> Identifier {
        Identifier::parse(PAGE).unwrap()
    }

    #[test]
    fn session_is_loaded_once() {
        let executor = executor();
        let client = client(&executor, CacheLifetime::DEFAULT);
        assert_eq!(client.session().space_id().to_string(), SPACE);
        assert_eq!(executor.call_count("loadUserContent"), 1);
    }

    #[test]
    fn empty_token_is_rejected_before_any_request() {
        let executor = executor();
        let err =
            Client::with_executor(ClientConfig::new(""), Arc::new(executor.clone())).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(executor.recorded_requests().is_empty());
    }

    #[test]
    fn page_chunk_body_shape() {
        let executor = executor().with_json("loadPageChunk", json!({"recordMap": {}}));
        let client = client(&executor, CacheLifetime::DEFAULT);
        client.load_page_chunk(page_id(), 2).unwrap();

        let sent = executor.requests_to("loadPageChunk");
        assert_eq!(
            sent[0].body,
            Some(json!({
                "pageId": PAGE,
                "limit": 100,
                "cursor": {"stack": []},
                "chunkNumber": 2,
                "verticalColumns": false
            }))
        );
    }

    #[test]
    fn block_and_first_chunk_share_a_cache_entry() {
        let executor = executor().with_json(
            "loadPageChunk",
            json!({"recordMap": {"block": {PAGE: {"value": {"type": "page"}}}}}),
        );
        let client = client(&executor, CacheLifetime::DEFAULT);

        client.get_block(page_id()).unwrap();
        client.load_page_chunk(page_id(), 0).unwrap();
        client.get_block(page_id()).unwrap();
        assert_eq!(executor.call_count("loadPageChunk"), 1);

        client.load_page_chunk(page_id(), 1).unwrap();
        assert_eq!(executor.call_count("loadPageChunk"), 2);
    }

    #[test]
    fn missing_block_is_not_found() {
        let executor = executor().with_json("loadPageChunk", json!({"recordMap": {"block": {}}}));
        let client = client(&executor, CacheLifetime::DEFAULT);
        let err = client.get_block(page_id()).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { .. }));
    }

    #[test]
    fn record_values_cache_key_depends_on_requests() {
        let executor = executor().with_json("getRecordValues", json!({"results": []}));
        let client = client(&executor, CacheLifetime::DEFAULT);

        let a = [RecordRequest::block(page_id())];
        let b = [RecordRequest::collection(page_id())];
        client.get_record_values(&a).unwrap();
        client.get_record_values(&a).unwrap();
        client.get_record_values(&b).unwrap();
        assert_eq!(executor.call_count("getRecordValues"), 2);
    }

    #[test]
    fn record_values_are_aligned_with_requests() {
        let other = Identifier::generate();
        let executor = executor().with_json(
            "getRecordValues",
            json!({"results": [{"value": {"type": "page"}}, {}]}),
        );
        let client = client(&executor, CacheLifetime::DEFAULT);

        let records = client
            .get_record_values(&[
                RecordRequest::block(page_id()),
                RecordRequest::block(other),
            ])
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get_str("type"), Some("page"));
        assert!(records[1].is_empty());
        assert_eq!(records[1].id(), other);
    }

    #[test]
    fn no_requests_means_no_call() {
        let executor = executor();
        let client = client(&executor, CacheLifetime::DEFAULT);
        assert!(client.get_record_values(&[]).unwrap().is_empty());
        assert_eq!(executor.call_count("getRecordValues"), 0);
    }

    #[test]
    fn search_body_is_scoped_to_space() {
        let executor = executor().with_json("searchPagesWithParent", json!({"recordMap": {}}));
        let client = client(&executor, CacheLifetime::DEFAULT);
        client.search_pages_with_parent(page_id(), "foo", 10).unwrap();

        let body = executor.requests_to("searchPagesWithParent")[0].body.clone().unwrap();
        assert_eq!(body["spaceId"], json!(SPACE));
        assert_eq!(body["parentId"], json!(PAGE));
        assert_eq!(body["query"], json!("foo"));
        assert_eq!(body["limit"], json!(10));
    }

    #[test]
    fn query_collection_body() {
        let view = Identifier::generate();
        let executor = executor().with_json("queryCollection", json!({"result": {}}));
        let client = client(&executor, CacheLifetime::DEFAULT);
        client
            .query_collection(page_id(), view, "x", &json!({"aggregate": []}))
            .unwrap();

        let body = executor.requests_to("queryCollection")[0].body.clone().unwrap();
        assert_eq!(body["collectionViewId"], json!(view));
        assert_eq!(body["loader"]["searchQuery"], json!("x"));
        assert_eq!(body["query"], json!({"aggregate": []}));
    }

    #[test]
    fn clear_cache_forces_refetch() {
        let executor = executor().with_json("searchPagesWithParent", json!({"recordMap": {}}));
        let client = client(&executor, CacheLifetime::DEFAULT);
        client.search_pages_with_parent(page_id(), "", 5).unwrap();
        client.clear_cache();
        client.search_pages_with_parent(page_id(), "", 5).unwrap();
        assert_eq!(executor.call_count("searchPagesWithParent"), 2);
    }

    #[test]
    fn empty_save_is_not_sent() {
        let executor = executor();
        let client = client(&executor, CacheLifetime::DEFAULT);
        let page = Record::empty(page_id(), table::BLOCK);
        let mut block = Block::from_record(page, Some(&client));
        client
            .update_record(&mut block, Vec::<(&str, PropertyValue)>::new())
            .unwrap();
        assert_eq!(executor.call_count(SAVE_ENDPOINT), 0);
    }
}
