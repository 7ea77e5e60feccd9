use crate::{
    Error, Result, common,
    counter::{CounterRecord, CounterStore, CounterTable},
    error::Operation,
};

use async_trait::async_trait;
use serde_dynamo::to_item;
use std::collections;
use tokio::sync::Mutex;

type RecordKey = (String, String);

#[derive(Debug, Default)]
struct Tables {
    /// Partition key attribute of each table, fixed by its first use.
    key_attributes: collections::HashMap<String, String>,
    items: collections::HashMap<RecordKey, common::Item>,
}

impl Tables {
    /// Fail like DynamoDB does when a key does not match the table's key schema.
    fn check_schema(&mut self, table: &CounterTable, operation: Operation) -> Result<()> {
        let key_attribute = self
            .key_attributes
            .entry(table.table_name.clone())
            .or_insert_with(|| table.key_attribute.clone());
        if *key_attribute != table.key_attribute {
            return Err(Error::Store {
                operation,
                table: table.table_name.clone(),
                source: format!(
                    "key attribute {} does not match the table key {key_attribute}",
                    table.key_attribute
                )
                .into(),
            });
        }
        Ok(())
    }
}

/// In-process counter store.
///
/// Records are kept as DynamoDB items, so they are encoded and decoded exactly as the
/// table-backed store does it. Each table keeps the key attribute it was first used with.
/// `add` holds the lock across its read and write.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    tables: Mutex<Tables>,
}

impl MemoryCounterStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_key(table: &CounterTable, identity: &str) -> RecordKey {
        (table.table_name.clone(), identity.to_string())
    }

    /// Raw stored item for `identity`.
    pub async fn item(&self, table: &CounterTable, identity: &str) -> Option<common::Item> {
        self.tables
            .lock()
            .await
            .items
            .get(&Self::record_key(table, identity))
            .cloned()
    }

    /// Store a raw item for `identity`, bypassing encoding.
    pub async fn insert_item(&self, table: &CounterTable, identity: &str, item: common::Item) {
        self.tables
            .lock()
            .await
            .items
            .insert(Self::record_key(table, identity), item);
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, table: &CounterTable, identity: &str) -> Result<Option<CounterRecord>> {
        let mut tables = self.tables.lock().await;
        tables.check_schema(table, Operation::GetItem)?;
        tables
            .items
            .get(&Self::record_key(table, identity))
            .map(|item| table.decode(identity, item))
            .transpose()
    }

    async fn put(&self, table: &CounterTable, record: &CounterRecord) -> Result<()> {
        let item: common::Item = to_item(table.document(record))?;
        let mut tables = self.tables.lock().await;
        tables.check_schema(table, Operation::PutItem)?;
        tables
            .items
            .insert(Self::record_key(table, &record.identity), item);
        Ok(())
    }

    async fn add(&self, table: &CounterTable, identity: &str, delta: u64) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        tables.check_schema(table, Operation::UpdateItem)?;
        let record_key = Self::record_key(table, identity);
        let current = match tables.items.get(&record_key) {
            Some(item) => table.decode(identity, item)?.count,
            None => 0,
        };
        let count = current.checked_add(delta).ok_or_else(|| Error::Overflow {
            identity: identity.to_string(),
            value: current,
        })?;
        let item: common::Item = to_item(table.document(&CounterRecord {
            identity: identity.to_string(),
            count,
        }))?;
        tables.items.insert(record_key, item);
        Ok(count)
    }
}
