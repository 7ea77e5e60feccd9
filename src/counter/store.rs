use crate::{
    Error, Result, common,
    counter::{CounterRecord, CounterTable},
    error::Operation,
    read, write,
};

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, types};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Backing store for counter records.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Fetch the record for `identity`, if any.
    async fn get(&self, table: &CounterTable, identity: &str) -> Result<Option<CounterRecord>>;

    /// Create or replace a record.
    async fn put(&self, table: &CounterTable, record: &CounterRecord) -> Result<()>;

    /// Atomically add `delta` to the count of `identity` (missing counts as zero) and
    /// return the new count.
    async fn add(&self, table: &CounterTable, identity: &str, delta: u64) -> Result<u64>;
}

#[async_trait]
impl<S: CounterStore + ?Sized> CounterStore for Arc<S> {
    async fn get(&self, table: &CounterTable, identity: &str) -> Result<Option<CounterRecord>> {
        (**self).get(table, identity).await
    }

    async fn put(&self, table: &CounterTable, record: &CounterRecord) -> Result<()> {
        (**self).put(table, record).await
    }

    async fn add(&self, table: &CounterTable, identity: &str, delta: u64) -> Result<u64> {
        (**self).add(table, identity, delta).await
    }
}

/// Counter store backed by a DynamoDB table.
#[derive(Clone, Debug)]
pub struct DynamoCounterStore {
    client: Client,
}

impl DynamoCounterStore {
    /// Store using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Consistent read of the record for `identity`.
fn get_request(table: &CounterTable, identity: &str) -> read::get_item::GetItem<Value> {
    read::get_item::GetItem {
        keys: table.keys(identity),
        single_read_args: read::common::SingleReadArgs {
            consistent_read: Some(true),
            table_name: table.table_name.clone(),
        },
    }
}

fn put_request(table: &CounterTable, record: &CounterRecord) -> write::put_item::PutItem<Value> {
    write::put_item::PutItem {
        item: table.document(record),
        write_args: write::common::WriteArgs {
            table_name: table.table_name.clone(),
            ..Default::default()
        },
    }
}

/// `ADD` of `delta` to the count, returning the updated count.
fn add_request(
    table: &CounterTable,
    identity: &str,
    delta: u64,
) -> write::update_item::UpdateItem<Value> {
    write::update_item::UpdateItem {
        keys: table.keys(identity),
        update_expression: write::update_item::UpdateExpression::Add(IndexMap::from([(
            table.count_attribute.clone(),
            Value::from(delta),
        )])),
        write_args: write::common::WriteArgs {
            return_values: Some(types::ReturnValue::UpdatedNew),
            table_name: table.table_name.clone(),
            ..Default::default()
        },
    }
}

/// Count from the attributes an `ADD` returned.
fn updated_count(table: &CounterTable, identity: &str, attributes: &common::Item) -> Result<u64> {
    if !attributes.contains_key(&table.count_attribute) {
        return Err(Error::MalformedRecord {
            table: table.table_name.clone(),
            identity: identity.to_string(),
            reason: format!("update returned no {} attribute", table.count_attribute),
        });
    }
    Ok(table.decode(identity, attributes)?.count)
}

#[async_trait]
impl CounterStore for DynamoCounterStore {
    async fn get(&self, table: &CounterTable, identity: &str) -> Result<Option<CounterRecord>> {
        let output = get_request(table, identity)
            .send(&self.client)
            .await
            .map_err(|e| Error::store(Operation::GetItem, &table.table_name, e))?;
        output
            .item
            .map(|item| table.decode(identity, &item))
            .transpose()
    }

    async fn put(&self, table: &CounterTable, record: &CounterRecord) -> Result<()> {
        put_request(table, record)
            .send(&self.client)
            .await
            .map_err(|e| Error::store(Operation::PutItem, &table.table_name, e))?;
        Ok(())
    }

    async fn add(&self, table: &CounterTable, identity: &str, delta: u64) -> Result<u64> {
        let output = add_request(table, identity, delta)
            .send(&self.client)
            .await
            .map_err(|e| Error::store(Operation::UpdateItem, &table.table_name, e))?;
        updated_count(table, identity, &output.attributes.unwrap_or_default())
    }
}
