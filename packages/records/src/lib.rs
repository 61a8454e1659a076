//! # pagekit-records
//!
//! The data layer shared by every pagekit package: record identifiers,
//! attribute paths, JSON tree navigation and record map resolution.
//!
//! ```rust
//! use pagekit_records::{attr_path, record_map, table, Identifier};
//! use serde_json::json;
//!
//! let id = Identifier::parse("4a5b6c7d8e9f40a1b2c3d4e5f6a7b8c9").unwrap();
//! let response = json!({
//!     "block": { id.to_string(): { "value": { "type": "page" } } }
//! });
//!
//! let record = record_map::resolve_record(&response, table::BLOCK, &id);
//! assert_eq!(record.get(&attr_path!("type")), &json!("page"));
//! ```

pub mod error;
pub mod id;
pub mod path;
pub mod record;
pub mod record_map;
pub mod value_utils;

pub use error::Error;
pub use id::Identifier;
pub use path::{AttrPath, PathSegment};
pub use record::{table, Record, RecordRequest};
pub use record_map::Attributes;
