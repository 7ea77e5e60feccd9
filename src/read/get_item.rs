use crate::{common, read};

use aws_sdk_dynamodb::{Client, error, operation};
use serde::Serialize;
use serde_dynamo::{Error, Result};

#[derive(Clone, Debug, Default, PartialEq)]
struct GetItemInput {
    keys: common::Item,
    single_read_input: read::common::SingleReadInput,
}

/// Get item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamo_counter::{common, read};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let get_item = read::get_item::GetItem {
///     keys: common::key::Keys::partition("CounterName", "TotalVisits".to_string()),
///     single_read_args: read::common::SingleReadArgs {
///         table_name: "VisitCounter".to_string(),
///         ..Default::default()
///     },
/// };
/// let output = get_item.send(client).await?;
/// println!("{:?}", output.item());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetItem<T> {
    /// The primary key of the item to retrieve.
    pub keys: common::key::Keys<T>,
    /// Table name and read consistency.
    pub single_read_args: read::common::SingleReadArgs,
}

impl<T: Serialize> TryFrom<GetItem<T>> for GetItemInput {
    type Error = Error;

    fn try_from(get_item: GetItem<T>) -> Result<Self> {
        let keys = get_item.keys.try_into()?;
        let input = Self {
            keys,
            single_read_input: get_item.single_read_args.into(),
        };
        Ok(input)
    }
}

impl<T: Serialize> GetItem<T> {
    /// Execute the get item operation.
    #[cfg_attr(
        feature = "instrument",
        tracing::instrument(name = "dynamo_counter.get_item", skip_all, err)
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::get_item::GetItemOutput,
        error::SdkError<operation::get_item::GetItemError>,
    > {
        let get_item: GetItemInput = self.try_into().map_err(error::BuildError::other)?;
        client
            .get_item()
            .set_key(Some(get_item.keys))
            .set_consistent_read(get_item.single_read_input.consistent_read)
            .table_name(get_item.single_read_input.table_name)
            .send()
            .await
    }
}
