use crate::common;

use aws_sdk_dynamodb::{Client, error, operation, types};
use indexmap::IndexMap;
use serde::Serialize;
use serde_dynamo::to_item;
use std::collections;

/// Maximum number of put or delete requests DynamoDB accepts in one `BatchWriteItem` call.
pub const MAX_BATCH_REQUESTS: usize = 25;

/// A single request within a batch write.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchWriteRequest<T> {
    /// Create or replace an item.
    Put(T),
    /// Remove the item with this primary key.
    Delete(common::key::Keys<T>),
}

impl<T: Serialize> TryFrom<BatchWriteRequest<T>> for types::WriteRequest {
    type Error = crate::Error;

    fn try_from(request: BatchWriteRequest<T>) -> crate::Result<Self> {
        let builder = match request {
            BatchWriteRequest::Put(item) => {
                let put_request = types::PutRequest::builder()
                    .set_item(Some(to_item(item)?))
                    .build()?;
                Self::builder().put_request(put_request)
            }
            BatchWriteRequest::Delete(keys) => {
                let delete_request = types::DeleteRequest::builder()
                    .set_key(Some(keys.try_into()?))
                    .build()?;
                Self::builder().delete_request(delete_request)
            }
        };
        Ok(builder.build())
    }
}

/// Batch write item operation.
///
/// Requests are sent in calls of at most [`MAX_BATCH_REQUESTS`]. Requests DynamoDB leaves
/// unprocessed (throttling, size limits) are reported back, not retried.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamo_counter::{common, write};
/// use indexmap::IndexMap;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let batch_write = write::batch_write_item::BatchWriteItem {
///     request_items: IndexMap::from([(
///         "demo-dynamo-python".to_string(),
///         vec![write::batch_write_item::BatchWriteRequest::Delete(
///             common::key::Keys::partition("customer_id", "cus-04".to_string())
///                 .with_sort("order_id", "ord-4".to_string()),
///         )],
///     )]),
/// };
/// let output = batch_write.send(client).await?;
/// println!("{} unprocessed", output.unprocessed_count());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteItem<T> {
    /// Table name to the requests for that table, in submission order.
    pub request_items: IndexMap<String, Vec<BatchWriteRequest<T>>>,
}

/// Result of a batch write across one or more calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteOutput {
    /// Number of `BatchWriteItem` calls made.
    pub calls: usize,
    /// Requests DynamoDB did not process, by table.
    pub unprocessed_items: collections::HashMap<String, Vec<types::WriteRequest>>,
}

impl BatchWriteOutput {
    /// Total number of unprocessed requests.
    pub fn unprocessed_count(&self) -> usize {
        self.unprocessed_items.values().map(Vec::len).sum()
    }

    fn record(&mut self, unprocessed_items: Option<Chunk>) {
        self.calls += 1;
        for (table_name, requests) in unprocessed_items.unwrap_or_default() {
            if !requests.is_empty() {
                self.unprocessed_items
                    .entry(table_name)
                    .or_default()
                    .extend(requests);
            }
        }
    }
}

/// A batch write that stopped at a failed call.
///
/// Calls before the failure were applied; `completed` reports them and `not_sent` counts
/// the requests of the failed call and of every call after it.
#[derive(Debug, thiserror::Error)]
#[error(
    "batch write stopped after {} calls with {not_sent} requests not sent",
    .completed.calls
)]
pub struct BatchWriteError {
    /// Output of the calls that succeeded.
    pub completed: BatchWriteOutput,
    /// Requests that were never accepted by DynamoDB.
    pub not_sent: usize,
    /// The failure.
    #[source]
    pub source: error::SdkError<operation::batch_write_item::BatchWriteItemError>,
}

type Chunk = collections::HashMap<String, Vec<types::WriteRequest>>;

impl<T: Serialize> BatchWriteItem<T> {
    /// Serialize every request and split them into calls of at most [`MAX_BATCH_REQUESTS`].
    fn into_chunks(self) -> crate::Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        let mut chunk = Chunk::new();
        let mut chunk_len = 0;
        for (table_name, requests) in self.request_items {
            for request in requests {
                if chunk_len == MAX_BATCH_REQUESTS {
                    chunks.push(std::mem::take(&mut chunk));
                    chunk_len = 0;
                }
                chunk
                    .entry(table_name.clone())
                    .or_default()
                    .push(request.try_into()?);
                chunk_len += 1;
            }
        }
        if chunk_len > 0 {
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    /// Execute the batch write.
    ///
    /// On failure the error carries the output of the calls already made.
    #[cfg_attr(
        feature = "instrument",
        tracing::instrument(name = "dynamo_counter.batch_write_item", skip_all, err)
    )]
    pub async fn send(self, client: &Client) -> Result<BatchWriteOutput, BatchWriteError> {
        let requested: usize = self.request_items.values().map(Vec::len).sum();
        let chunks = self.into_chunks().map_err(|e| BatchWriteError {
            completed: BatchWriteOutput::default(),
            not_sent: requested,
            source: error::BuildError::other(e).into(),
        })?;
        let mut not_sent = requested;
        let mut output = BatchWriteOutput::default();
        for chunk in chunks {
            let chunk_len: usize = chunk.values().map(Vec::len).sum();
            let response = match client
                .batch_write_item()
                .set_request_items(Some(chunk))
                .send()
                .await
            {
                Ok(response) => response,
                Err(source) => {
                    return Err(BatchWriteError {
                        completed: output,
                        not_sent,
                        source,
                    });
                }
            };
            not_sent -= chunk_len;
            output.record(response.unprocessed_items);
        }
        Ok(output)
    }
}
