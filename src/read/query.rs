use crate::{common, read};

use aws_sdk_dynamodb::{Client, error, operation};
use serde::Serialize;
use serde_dynamo::{Error, Result};

#[derive(Clone, Debug, Default, PartialEq)]
struct QueryInput {
    key_condition_expression: String,
    multiple_read_input: read::common::MultipleReadInput,
    scan_index_forward: Option<bool>,
}

/// Query operation.
///
/// The partition key is always matched by equality; the sort key (or the index sort key)
/// can be constrained by any key condition.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamo_counter::{common, read};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// // newest orders first
/// let query = read::query::Query {
///     partition_key: common::key::Key::new("customer_id", "cus-01".to_string()),
///     multiple_read_args: read::common::MultipleReadArgs {
///         table_name: "demo-dynamo-python".to_string(),
///         ..Default::default()
///     },
///     scan_index_forward: Some(false),
///     ..Default::default()
/// };
/// query.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query<T> {
    /// Table, index, filter and pagination arguments.
    pub multiple_read_args: read::common::MultipleReadArgs<T>,
    /// The partition key value to query for.
    pub partition_key: common::key::Key<T>,
    /// `Some(false)` returns items in descending sort key order.
    pub scan_index_forward: Option<bool>,
    /// Optional condition on the sort key.
    pub sort_key_condition: Option<common::condition::AttributeCondition<T>>,
}

impl<T: Serialize> TryFrom<Query<T>> for QueryInput {
    type Error = Error;

    fn try_from(query: Query<T>) -> Result<Self> {
        let mut index = 0;
        let key_condition = common::condition::key_condition(
            query.partition_key,
            query.sort_key_condition,
            &mut index,
        )?;
        let mut multiple_read_input = query.multiple_read_args.into_input(&mut index)?;
        let key_condition_expression = key_condition.merge_into(
            &mut multiple_read_input.expression_attribute_names,
            &mut multiple_read_input.expression_attribute_values,
        );
        let input = Self {
            key_condition_expression,
            multiple_read_input,
            scan_index_forward: query.scan_index_forward,
        };
        Ok(input)
    }
}

impl<T: Serialize> Query<T> {
    /// Execute the query operation, reading every page.
    #[cfg_attr(
        feature = "instrument",
        tracing::instrument(name = "dynamo_counter.query", skip_all, err)
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<operation::query::QueryOutput, error::SdkError<operation::query::QueryError>> {
        let query: QueryInput = self.try_into().map_err(error::BuildError::other)?;
        let builder = client
            .query()
            .key_condition_expression(query.key_condition_expression)
            .set_scan_index_forward(query.scan_index_forward);
        let mut paginator =
            read::common::apply_multiple_read_input!(builder, query.multiple_read_input)
                .into_paginator()
                .send();
        read::common::collect_pages!(paginator, operation::query::QueryOutput)
    }
}
