use crate::read;

use aws_sdk_dynamodb::{Client, error, operation};
use serde::Serialize;
use serde_dynamo::{Error, Result};

#[derive(Clone, Debug, Default, PartialEq)]
struct ScanInput {
    multiple_read_input: read::common::MultipleReadInput,
}

/// Scan operation.
///
/// Reads the whole table (or index): every page is fetched, and the filter only reduces
/// what is returned, not what is read.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamo_counter::{common, read};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let scan = read::scan::Scan {
///     multiple_read_args: read::common::MultipleReadArgs {
///         filter: Some(common::condition::Filter::all(vec![
///             common::condition::AttributeCondition::new(
///                 "status",
///                 common::condition::Condition::Equals("pending".to_string()),
///             ),
///         ])),
///         table_name: "demo-dynamo-python".to_string(),
///         ..Default::default()
///     },
/// };
/// let output = scan.send(client).await?;
/// println!("{} items", output.count());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan<T> {
    /// Table, index, filter and pagination arguments.
    pub multiple_read_args: read::common::MultipleReadArgs<T>,
}

impl<T: Serialize> TryFrom<Scan<T>> for ScanInput {
    type Error = Error;

    fn try_from(scan: Scan<T>) -> Result<Self> {
        let multiple_read_input = scan.multiple_read_args.into_input(&mut 0)?;
        Ok(Self {
            multiple_read_input,
        })
    }
}

impl<T: Serialize> Scan<T> {
    /// Execute the scan operation, reading every page.
    #[cfg_attr(
        feature = "instrument",
        tracing::instrument(name = "dynamo_counter.scan", skip_all, err)
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<operation::scan::ScanOutput, error::SdkError<operation::scan::ScanError>> {
        let scan: ScanInput = self.try_into().map_err(error::BuildError::other)?;
        let mut paginator =
            read::common::apply_multiple_read_input!(client.scan(), scan.multiple_read_input)
                .into_paginator()
                .send();
        read::common::collect_pages!(paginator, operation::scan::ScanOutput)
    }
}
