use crate::common;

use serde::Serialize;
use serde_dynamo::{Result, to_attribute_value};
use std::collections;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SingleReadInput {
    pub(crate) consistent_read: Option<bool>,
    pub(crate) table_name: String,
}

/// Arguments for single-item read operations (GetItem).
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct SingleReadArgs {
    /// Whether to use a consistent read.
    ///
    /// `true` for strongly consistent reads, `false` or `None` for eventually consistent reads.
    /// A read-then-write counter sees its own last write only with a consistent read.
    pub consistent_read: Option<bool>,
    /// The name of the table to read from.
    pub table_name: String,
}

impl From<SingleReadArgs> for SingleReadInput {
    fn from(single_read_args: SingleReadArgs) -> Self {
        Self {
            consistent_read: single_read_args.consistent_read,
            table_name: single_read_args.table_name,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MultipleReadInput {
    pub(crate) consistent_read: Option<bool>,
    pub(crate) exclusive_start_key: Option<common::Item>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values: Option<common::Item>,
    pub(crate) filter_expression: Option<String>,
    pub(crate) index_name: Option<String>,
    pub(crate) limit: Option<i32>,
    pub(crate) table_name: String,
}

/// Arguments for multiple-item read operations (Query, Scan).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipleReadArgs<T> {
    /// Whether to use a consistent read. Not supported on global secondary indexes.
    pub consistent_read: Option<bool>,
    /// Continuation token from an earlier read; reading resumes after this key.
    pub exclusive_start_key: Option<collections::HashMap<String, T>>,
    /// Filter applied after items are read; filtered items still consume capacity.
    pub filter: Option<common::condition::Filter<T>>,
    /// A global or local secondary index to read instead of the base table.
    pub index_name: Option<String>,
    /// Maximum number of items evaluated per page.
    pub limit: Option<i32>,
    /// The name of the table to read from.
    pub table_name: String,
}

impl<T: Serialize> MultipleReadArgs<T> {
    /// Convert, numbering filter value placeholders from `index` so they cannot collide with
    /// placeholders already issued for the same request.
    pub(crate) fn into_input(self, index: &mut usize) -> Result<MultipleReadInput> {
        let exclusive_start_key = match self.exclusive_start_key {
            Some(exclusive_start_key) => {
                let mut item = common::Item::with_capacity(exclusive_start_key.len());
                for (name, value) in exclusive_start_key {
                    item.insert(name, to_attribute_value(value)?);
                }
                Some(item)
            }
            None => None,
        };
        let mut input = MultipleReadInput {
            consistent_read: self.consistent_read,
            exclusive_start_key,
            index_name: self.index_name,
            limit: self.limit,
            table_name: self.table_name,
            ..Default::default()
        };
        if let Some(filter) = self.filter {
            let filter_expression = filter.render(index)?.merge_into(
                &mut input.expression_attribute_names,
                &mut input.expression_attribute_values,
            );
            input.filter_expression = Some(filter_expression);
        }
        Ok(input)
    }
}

/// Follow every page of a paginator and collect items and counts.
macro_rules! collect_pages {
    ($paginator:expr, $output_type:ty) => {{
        let mut items = Vec::new();
        let mut count = 0;
        let mut scanned_count = 0;
        let mut pages = 0usize;
        while let Some(page) = $paginator.next().await {
            let page = page?;
            pages += 1;
            items.extend(page.items.unwrap_or_default());
            count += page.count;
            scanned_count += page.scanned_count;
        }
        tracing::debug!(pages, count, scanned_count, "read all pages");
        let output = <$output_type>::builder()
            .set_items(Some(items))
            .set_count(Some(count))
            .set_scanned_count(Some(scanned_count))
            .build();
        Ok(output)
    }};
}

pub(crate) use collect_pages;

/// Apply the multiple-read settings to a Query or Scan builder.
macro_rules! apply_multiple_read_input {
    ($builder:expr, $input:expr) => {
        $builder
            .set_consistent_read($input.consistent_read)
            .set_exclusive_start_key($input.exclusive_start_key)
            .set_expression_attribute_names($input.expression_attribute_names)
            .set_expression_attribute_values($input.expression_attribute_values)
            .set_filter_expression($input.filter_expression)
            .set_index_name($input.index_name)
            .set_limit($input.limit)
            .table_name($input.table_name)
    };
}

pub(crate) use apply_multiple_read_input;
