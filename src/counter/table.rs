use crate::{Error, Result, common, counter::CounterRecord};

use aws_sdk_dynamodb::types;
use serde_json::{Map, Value};

/// Counter name used by the visit counter.
pub const TOTAL_VISITS: &str = "TotalVisits";

/// Where a family of counters lives: table, key attribute and count attribute.
///
/// ```rust
/// use dynamo_counter::counter::CounterTable;
///
/// let table = CounterTable::visits("VisitCounter");
/// assert_eq!(table.key_attribute, "CounterName");
/// assert_eq!(table.count_attribute, "Count");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CounterTable {
    /// The table name.
    pub table_name: String,
    /// Partition key attribute holding the counter identity.
    pub key_attribute: String,
    /// Numeric attribute holding the count.
    pub count_attribute: String,
}

impl CounterTable {
    /// Custom schema.
    pub fn new(
        table_name: impl Into<String>,
        key_attribute: impl Into<String>,
        count_attribute: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            key_attribute: key_attribute.into(),
            count_attribute: count_attribute.into(),
        }
    }

    /// Site-wide visit counters: `CounterName` / `Count`.
    pub fn visits(table_name: impl Into<String>) -> Self {
        Self::new(table_name, "CounterName", "Count")
    }

    /// Per-function invocation counters: `FunctionName` / `InvocationCount`.
    pub fn invocations(table_name: impl Into<String>) -> Self {
        Self::new(table_name, "FunctionName", "InvocationCount")
    }

    /// Primary key of the record for `identity`.
    pub fn keys(&self, identity: &str) -> common::key::Keys<Value> {
        common::key::Keys::partition(self.key_attribute.as_str(), Value::from(identity))
    }

    /// Stored document for `record`.
    pub(crate) fn document(&self, record: &CounterRecord) -> Value {
        let mut document = Map::new();
        document.insert(
            self.key_attribute.clone(),
            Value::from(record.identity.as_str()),
        );
        document.insert(self.count_attribute.clone(), Value::from(record.count));
        Value::Object(document)
    }

    /// Typed record from a stored item. A missing count attribute reads as zero.
    pub(crate) fn decode(&self, identity: &str, item: &common::Item) -> Result<CounterRecord> {
        let malformed = |reason: String| Error::MalformedRecord {
            table: self.table_name.clone(),
            identity: identity.to_string(),
            reason,
        };
        let count = match item.get(&self.count_attribute) {
            None => 0,
            Some(types::AttributeValue::N(number)) => number.parse::<u64>().map_err(|_| {
                malformed(format!(
                    "attribute {} holds {number:?}, not a non-negative integer",
                    self.count_attribute
                ))
            })?,
            Some(_) => {
                return Err(malformed(format!(
                    "attribute {} is not a number",
                    self.count_attribute
                )));
            }
        };
        Ok(CounterRecord {
            identity: identity.to_string(),
            count,
        })
    }
}
