//! Write operations for modifying data in DynamoDB tables.
//!
//! This module provides operations for writing data to DynamoDB:
//! - Putting new items or replacing existing ones
//! - Updating items with SET and ADD clauses
//! - Batch writing (putting and deleting) multiple items

/// Batch write item operation for writing and deleting many items.
pub mod batch_write_item;

/// Common utilities and types for write operations.
pub mod common;

/// Put item operation for creating or replacing items.
pub mod put_item;

/// Update item operation for modifying existing items.
pub mod update_item;
