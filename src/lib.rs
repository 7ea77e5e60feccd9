#![deny(missing_docs)]

//! # DynamoDB counter
//!
//! Counter records, document-table demos and Lambda handlers over Amazon DynamoDB.
//!
//! ## Overview
//!
//! The centre of this crate is the [`counter`] module: a counter record identified by a
//! string key, incremented once per logical event. Two increment strategies are offered:
//! - [`counter::IncrementStrategy::ReadThenWrite`] reads the record, adds one and writes it
//!   back. Two round trips; concurrent increments of the same identity can lose updates.
//! - [`counter::IncrementStrategy::Atomic`] issues a single `UpdateItem` with
//!   `ADD #count :one`, which DynamoDB applies atomically and which creates the record
//!   when it is missing.
//!
//! Failures never cross the counter boundary as a Rust error: [`counter::Counter::increment`]
//! logs them and reports an [`counter::Outcome`], whose severity is chosen by the
//! configured [`counter::FailurePolicy`].
//!
//! Everything else is glue expressed through typed operation builders, so that no
//! expression string or placeholder map is written by hand:
//!
//! ```no_run
//! use aws_sdk_dynamodb::Client;
//! use dynamo_counter::{common, write};
//! use indexmap::IndexMap;
//! use serde_json::Value;
//!
//! # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
//! let update_item = write::update_item::UpdateItem {
//!     keys: common::key::Keys::partition("customer_id", Value::from("cus-02"))
//!         .with_sort("order_id", Value::from("ord-3")),
//!     update_expression: write::update_item::UpdateExpression::Set(IndexMap::from([
//!         (
//!             "status".to_string(),
//!             write::update_item::SetInput::Assign(Value::from("completed")),
//!         ),
//!     ])),
//!     write_args: write::common::WriteArgs {
//!         table_name: "demo-dynamo-python".to_string(),
//!         ..Default::default()
//!     },
//! };
//! // Sent as "SET #status = :set0" with {"#status": "status"}
//! update_item.send(client).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@counter`] - Counter records, stores and increment strategies
//! - [`mod@handler`] - Lambda handlers for the visit and invocation counters
//! - [`mod@orders`] - Order table demo: insert, scan, query, update, batch delete
//! - [`mod@posts`] - Post table demo with SNS notification
//! - [`mod@notify`] - Notification publishing
//! - [`mod@common`] - Keys and condition expressions
//! - [`mod@read`] - Read operations (GetItem, Query, Scan)
//! - [`mod@write`] - Write operations (PutItem, UpdateItem, BatchWriteItem)

/// Keys and condition expressions shared by read and write operations.
pub mod common;

/// Environment-driven settings.
pub mod config;

/// Counter records and the increment operation.
pub mod counter;

/// Crate error type.
pub mod error;

/// Lambda handlers.
pub mod handler;

/// Notification publishing.
pub mod notify;

/// Order table demo operations.
pub mod orders;

/// Post table demo operations.
pub mod posts;

/// Read operations for retrieving data from DynamoDB tables.
///
/// This module provides operations for:
/// - Getting individual items by key
/// - Querying items with key conditions, optionally through a secondary index
/// - Scanning entire tables
pub mod read;

/// Tracing subscriber setup for the binaries.
pub mod telemetry;

/// Write operations for modifying data in DynamoDB tables.
///
/// This module provides operations for:
/// - Putting new items or replacing existing ones
/// - Updating items with SET and ADD clauses
/// - Batch writing (putting and deleting) multiple items
pub mod write;

pub use error::{Error, Result};
