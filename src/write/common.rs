use crate::common;

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::{Error, Result};
use std::collections;

/// Write parameters after placeholders have been resolved.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct WriteInput {
    pub(crate) condition_expression: Option<String>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values: Option<common::Item>,
    pub(crate) return_values: Option<types::ReturnValue>,
    pub(crate) table_name: String,
}

impl WriteInput {
    /// Merge an expression into this write and return its expression string.
    pub(crate) fn merge_expression(&mut self, operation: common::ExpressionInput) -> String {
        operation.merge_into(
            &mut self.expression_attribute_names,
            &mut self.expression_attribute_values,
        )
    }
}

/// Arguments common to single-item writes (Put, Update).
#[derive(Clone, Debug, PartialEq)]
pub struct WriteArgs<T> {
    /// Condition that must hold for the write to be applied.
    ///
    /// When it does not hold, the call fails with `ConditionalCheckFailedException`.
    pub condition: Option<common::condition::Filter<T>>,
    /// Which item attributes to return in the response.
    ///
    /// Options: `AllOld`, `AllNew`, `UpdatedOld`, `UpdatedNew`, or `None`.
    pub return_values: Option<types::ReturnValue>,
    /// The name of the table to write to.
    pub table_name: String,
}

impl<T> Default for WriteArgs<T> {
    fn default() -> Self {
        Self {
            condition: None,
            return_values: None,
            table_name: String::new(),
        }
    }
}

impl<T: Serialize> WriteArgs<T> {
    /// Convert, numbering condition value placeholders from `index`.
    pub(crate) fn into_input(self, index: &mut usize) -> Result<WriteInput> {
        let mut input = WriteInput {
            return_values: self.return_values,
            table_name: self.table_name,
            ..Default::default()
        };
        if let Some(condition) = self.condition {
            let condition_expression = condition.render(index)?;
            input.condition_expression = Some(input.merge_expression(condition_expression));
        }
        Ok(input)
    }
}

impl<T: Serialize> TryFrom<WriteArgs<T>> for WriteInput {
    type Error = Error;

    fn try_from(write_args: WriteArgs<T>) -> Result<Self> {
        write_args.into_input(&mut 0)
    }
}

/// Apply the common write settings to a PutItem or UpdateItem builder.
macro_rules! apply_write_input {
    ($builder:expr, $input:expr) => {
        $builder
            .set_condition_expression($input.condition_expression)
            .set_expression_attribute_names($input.expression_attribute_names)
            .set_expression_attribute_values($input.expression_attribute_values)
            .set_return_values($input.return_values)
            .table_name($input.table_name)
    };
}

pub(crate) use apply_write_input;
