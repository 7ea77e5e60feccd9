use crate::{common, write};

use aws_sdk_dynamodb::{Client, error, operation};
use serde::Serialize;
use serde_dynamo::{Error, Result, to_item};

#[derive(Debug, PartialEq)]
struct PutItemInput {
    item: common::Item,
    write_input: write::common::WriteInput,
}

/// Put item operation: creates the item or replaces it entirely.
///
/// `I` is the item (any serializable struct or map); `T` is the value type used in the
/// optional write condition.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamo_counter::write;
/// use serde_json::json;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let put_item: write::put_item::PutItem<_> = write::put_item::PutItem {
///     item: json!({"CounterName": "TotalVisits", "Count": 1}),
///     write_args: write::common::WriteArgs {
///         table_name: "VisitCounter".to_string(),
///         ..Default::default()
///     },
/// };
/// put_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq)]
pub struct PutItem<I, T = serde_json::Value> {
    /// The item to put into the table.
    pub item: I,
    /// Table name, condition and return values.
    pub write_args: write::common::WriteArgs<T>,
}

impl<I: Serialize, T: Serialize> TryFrom<PutItem<I, T>> for PutItemInput {
    type Error = Error;

    fn try_from(put_item: PutItem<I, T>) -> Result<Self> {
        let item = to_item(put_item.item)?;
        let write_input = put_item.write_args.try_into()?;
        Ok(Self { item, write_input })
    }
}

impl<I: Serialize, T: Serialize> PutItem<I, T> {
    /// Execute the put item operation.
    #[cfg_attr(
        feature = "instrument",
        tracing::instrument(name = "dynamo_counter.put_item", skip_all, err)
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::put_item::PutItemOutput,
        error::SdkError<operation::put_item::PutItemError>,
    > {
        let put_item: PutItemInput = self.try_into().map_err(error::BuildError::other)?;
        let builder = client.put_item().set_item(Some(put_item.item));
        write::common::apply_write_input!(builder, put_item.write_input)
            .send()
            .await
    }
}
