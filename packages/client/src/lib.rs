//! # pagekit
//!
//! A client for a block-structured workspace service and its private
//! record API.
//!
//! Pages, collections and rows are fetched as typed [`Block`]s through a
//! [`Client`]. Edits are applied to the in-memory block immediately and
//! queued as path-addressed operations; nothing is sent until the block is
//! flushed or updated through [`Client::update_record`].
//!
//! ```ignore
//! use pagekit::{Client, ClientConfig, Identifier};
//! use chrono::NaiveDate;
//!
//! let client = Client::new(ClientConfig::load(None)?)?;
//! let mut row = client.get_block(Identifier::parse("4a5b6c7d8e9f40a1b2c3d4e5f6a7b8c9")?)?;
//!
//! println!("{}", row.title());
//! row.update([("Due", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())])?;
//! ```
//!
//! Read responses are cached for the configured lifetime (see
//! [`ClientConfig`]); writes always go to the network.

pub mod block;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod operation;
pub mod property;
pub mod session;
pub mod transaction;

pub use block::{children_from_record_map, rows_only, Block, BlockKind};
pub use client::Client;
pub use collection::{Collection, Schema, SchemaEntry};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use operation::{build_set_operation, Command, Operation};
pub use property::{NotionDate, Property, PropertyType, PropertyValue};
pub use session::SessionContext;

pub use pagekit_http::CacheLifetime;
pub use pagekit_records::{
    attr_path, table, AttrPath, Identifier, PathSegment, Record, RecordRequest,
};
