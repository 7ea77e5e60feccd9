//! Order table demo.
//!
//! Orders live in a table keyed by `customer_id` (partition) and `order_id` (sort), with a
//! `status-index` secondary index keyed by `status`. Every operation has a `*_request`
//! builder returning the typed operation, so the request can be inspected without a
//! client.

use crate::{Error, Result, common, error::Operation, read, write};

use aws_sdk_dynamodb::{Client, types};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_dynamo::{from_item, from_items};
use serde_json::Value;
use std::{fmt, str};

/// Order lifecycle state.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, not yet processed.
    Pending,
    /// Being handled.
    Processed,
    /// Done.
    Completed,
}

impl OrderStatus {
    /// Stored form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string that is not an [`OrderStatus`].
#[derive(Debug, thiserror::Error)]
#[error("unknown order status {0:?}, expected pending, processed or completed")]
pub struct UnknownStatus(pub String);

impl str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processed" => Ok(Self::Processed),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Stored timestamp: RFC 3339, or ISO 8601 without an offset, which reads as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .or_else(|_| value.parse::<NaiveDateTime>().map(|timestamp| timestamp.and_utc()))
        .ok()
}

fn invalid_timestamp<E: de::Error>(value: &str) -> E {
    E::custom(format!("invalid timestamp {value:?}"))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_timestamp(&value).ok_or_else(|| invalid_timestamp(&value))
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|value| parse_timestamp(&value).ok_or_else(|| invalid_timestamp(&value)))
        .transpose()
}

/// Order record.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Order {
    /// Partition key.
    pub customer_id: String,
    /// Sort key.
    pub order_id: String,
    /// Current state; key of the status index.
    pub status: OrderStatus,
    /// Creation time.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_date: DateTime<Utc>,
    /// Time of the last status update.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_date: Option<DateTime<Utc>>,
}

impl Order {
    /// New order created now.
    pub fn new(
        customer_id: impl Into<String>,
        order_id: impl Into<String>,
        status: OrderStatus,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            order_id: order_id.into(),
            status,
            created_date: Utc::now(),
            updated_date: None,
        }
    }
}

/// Primary key of an order.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct OrderKey {
    /// Partition key.
    pub customer_id: String,
    /// Sort key.
    pub order_id: String,
}

impl OrderKey {
    /// Key of order `order_id` placed by `customer_id`.
    pub fn new(customer_id: impl Into<String>, order_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            order_id: order_id.into(),
        }
    }

    fn keys(self) -> common::key::Keys<Value> {
        common::key::Keys::partition(CUSTOMER_ID, Value::from(self.customer_id))
            .with_sort(ORDER_ID, Value::from(self.order_id))
    }
}

/// Attributes returned by [`OrderTable::update_status`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct StatusUpdate {
    /// The new status.
    pub status: OrderStatus,
    /// When it was set.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_date: DateTime<Utc>,
}

/// Sort key order of query results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortOrder {
    /// Oldest sort key first.
    #[default]
    Ascending,
    /// Newest sort key first.
    Descending,
}

impl SortOrder {
    fn scan_index_forward(self) -> Option<bool> {
        Some(self == Self::Ascending)
    }
}

const CUSTOMER_ID: &str = "customer_id";
const ORDER_ID: &str = "order_id";
const STATUS: &str = "status";
const UPDATED_DATE: &str = "updated_date";

fn status_equals(status: OrderStatus) -> common::condition::AttributeCondition<Value> {
    common::condition::AttributeCondition::new(
        STATUS,
        common::condition::Condition::Equals(Value::from(status.as_str())),
    )
}

/// Order table and its status index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderTable {
    /// The table name.
    pub table_name: String,
    /// Secondary index keyed on `status`.
    pub status_index: String,
}

impl OrderTable {
    /// Table `table_name` with status index `status_index`.
    pub fn new(table_name: impl Into<String>, status_index: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            status_index: status_index.into(),
        }
    }

    fn store_error<E>(&self, operation: Operation) -> impl FnOnce(E) -> Error + '_
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |e| Error::store(operation, &self.table_name, e)
    }

    /// Put request for `order`.
    pub fn insert_request(&self, order: Order) -> write::put_item::PutItem<Order> {
        write::put_item::PutItem {
            item: order,
            write_args: write::common::WriteArgs {
                table_name: self.table_name.clone(),
                ..Default::default()
            },
        }
    }

    /// Create or replace `order`.
    pub async fn insert(&self, client: &Client, order: Order) -> Result<()> {
        let key = OrderKey::new(&order.customer_id, &order.order_id);
        self.insert_request(order)
            .send(client)
            .await
            .map_err(self.store_error(Operation::PutItem))?;
        tracing::info!(
            table = %self.table_name,
            customer_id = %key.customer_id,
            order_id = %key.order_id,
            "order inserted"
        );
        Ok(())
    }

    /// Full-table scan keeping orders in `status`.
    pub fn scan_by_status_request(&self, status: OrderStatus) -> read::scan::Scan<Value> {
        read::scan::Scan {
            multiple_read_args: read::common::MultipleReadArgs {
                filter: Some(common::condition::Filter::all(vec![status_equals(status)])),
                table_name: self.table_name.clone(),
                ..Default::default()
            },
        }
    }

    /// Every order in `status`, read from the whole table.
    pub async fn scan_by_status(&self, client: &Client, status: OrderStatus) -> Result<Vec<Order>> {
        let output = self
            .scan_by_status_request(status)
            .send(client)
            .await
            .map_err(self.store_error(Operation::Scan))?;
        tracing::info!(
            table = %self.table_name,
            %status,
            scanned = output.scanned_count,
            matched = output.count,
            "scanned orders"
        );
        Ok(from_items(output.items.unwrap_or_default())?)
    }

    /// Query for the orders of `customer_id`.
    pub fn query_by_customer_request(
        &self,
        customer_id: &str,
        order: SortOrder,
    ) -> read::query::Query<Value> {
        read::query::Query {
            multiple_read_args: read::common::MultipleReadArgs {
                table_name: self.table_name.clone(),
                ..Default::default()
            },
            partition_key: common::key::Key::new(CUSTOMER_ID, Value::from(customer_id)),
            scan_index_forward: order.scan_index_forward(),
            sort_key_condition: None,
        }
    }

    /// Orders of `customer_id` in `order_id` order.
    pub async fn query_by_customer(
        &self,
        client: &Client,
        customer_id: &str,
        order: SortOrder,
    ) -> Result<Vec<Order>> {
        self.query(client, self.query_by_customer_request(customer_id, order))
            .await
    }

    /// Query on the status index, newest first.
    pub fn query_by_status_request(&self, status: OrderStatus) -> read::query::Query<Value> {
        read::query::Query {
            multiple_read_args: read::common::MultipleReadArgs {
                index_name: Some(self.status_index.clone()),
                table_name: self.table_name.clone(),
                ..Default::default()
            },
            partition_key: common::key::Key::new(STATUS, Value::from(status.as_str())),
            scan_index_forward: SortOrder::Descending.scan_index_forward(),
            sort_key_condition: None,
        }
    }

    /// Orders in `status`, read through the status index.
    pub async fn query_by_status(
        &self,
        client: &Client,
        status: OrderStatus,
    ) -> Result<Vec<Order>> {
        self.query(client, self.query_by_status_request(status))
            .await
    }

    /// Query matching both key attributes.
    pub fn query_by_customer_and_order_request(
        &self,
        customer_id: &str,
        order_id: &str,
    ) -> read::query::Query<Value> {
        read::query::Query {
            multiple_read_args: read::common::MultipleReadArgs {
                table_name: self.table_name.clone(),
                ..Default::default()
            },
            partition_key: common::key::Key::new(CUSTOMER_ID, Value::from(customer_id)),
            scan_index_forward: None,
            sort_key_condition: Some(common::condition::AttributeCondition::new(
                ORDER_ID,
                common::condition::Condition::Equals(Value::from(order_id)),
            )),
        }
    }

    /// The order `order_id` of `customer_id`, as a list of zero or one orders.
    pub async fn query_by_customer_and_order(
        &self,
        client: &Client,
        customer_id: &str,
        order_id: &str,
    ) -> Result<Vec<Order>> {
        self.query(
            client,
            self.query_by_customer_and_order_request(customer_id, order_id),
        )
        .await
    }

    async fn query(&self, client: &Client, query: read::query::Query<Value>) -> Result<Vec<Order>> {
        let output = query
            .send(client)
            .await
            .map_err(self.store_error(Operation::Query))?;
        tracing::info!(table = %self.table_name, count = output.count, "queried orders");
        Ok(from_items(output.items.unwrap_or_default())?)
    }

    /// Update setting `status` and `updated_date`, returning the updated attributes.
    pub fn update_status_request(
        &self,
        key: OrderKey,
        status: OrderStatus,
        updated_date: DateTime<Utc>,
    ) -> write::update_item::UpdateItem<Value> {
        let updated_date = updated_date.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        write::update_item::UpdateItem {
            keys: key.keys(),
            update_expression: write::update_item::UpdateExpression::Set(IndexMap::from([
                (
                    STATUS.to_string(),
                    write::update_item::SetInput::Assign(Value::from(status.as_str())),
                ),
                (
                    UPDATED_DATE.to_string(),
                    write::update_item::SetInput::Assign(Value::from(updated_date)),
                ),
            ])),
            write_args: write::common::WriteArgs {
                return_values: Some(types::ReturnValue::UpdatedNew),
                table_name: self.table_name.clone(),
                ..Default::default()
            },
        }
    }

    /// Set the status of an order, stamping `updated_date` with the current time.
    pub async fn update_status(
        &self,
        client: &Client,
        key: OrderKey,
        status: OrderStatus,
    ) -> Result<StatusUpdate> {
        let output = self
            .update_status_request(key, status, Utc::now())
            .send(client)
            .await
            .map_err(self.store_error(Operation::UpdateItem))?;
        let update: StatusUpdate = from_item(output.attributes.unwrap_or_default())?;
        tracing::info!(
            table = %self.table_name,
            status = %update.status,
            updated_date = %update.updated_date,
            "order status updated"
        );
        Ok(update)
    }

    /// Batch write deleting every order in `keys`.
    pub fn batch_delete_request(
        &self,
        keys: Vec<OrderKey>,
    ) -> write::batch_write_item::BatchWriteItem<Value> {
        let requests = keys
            .into_iter()
            .map(|key| write::batch_write_item::BatchWriteRequest::Delete(key.keys()))
            .collect();
        write::batch_write_item::BatchWriteItem {
            request_items: IndexMap::from([(self.table_name.clone(), requests)]),
        }
    }

    /// Delete every order in `keys` and return how many deletes DynamoDB left unprocessed.
    pub async fn batch_delete(&self, client: &Client, keys: Vec<OrderKey>) -> Result<usize> {
        let requested = keys.len();
        let output = self
            .batch_delete_request(keys)
            .send(client)
            .await
            .map_err(|e| {
                tracing::warn!(
                    table = %self.table_name,
                    requested,
                    calls = e.completed.calls,
                    not_sent = e.not_sent,
                    "batch delete stopped early"
                );
                Error::store(Operation::BatchWriteItem, &self.table_name, e)
            })?;
        let unprocessed = output.unprocessed_count();
        if unprocessed > 0 {
            tracing::warn!(
                table = %self.table_name,
                requested,
                unprocessed,
                "some deletes were not processed"
            );
        } else {
            tracing::info!(
                table = %self.table_name,
                requested,
                calls = output.calls,
                "orders deleted"
            );
        }
        Ok(unprocessed)
    }
}
