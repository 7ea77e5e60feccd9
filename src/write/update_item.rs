use crate::{common, write};

use aws_sdk_dynamodb::{Client, error, operation};
use indexmap::IndexMap;
use serde::Serialize;
use serde_dynamo::{Error, Result, to_attribute_value};
use std::collections;

/// Assignment in a SET clause.
///
/// ```rust
/// use dynamo_counter::write::update_item;
///
/// let assign = update_item::SetInput::Assign("completed".to_string());
/// let increment = update_item::SetInput::Increment(1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum SetInput<T> {
    /// Assign a new value (replaces the existing value).
    Assign(T),
    /// Add to a numeric attribute; fails when the attribute is missing.
    Increment(T),
    /// Subtract from a numeric attribute; fails when the attribute is missing.
    Decrement(T),
    /// Assign only when the attribute does not exist yet.
    IfNotExists(T),
}

impl<T> SetInput<T> {
    fn split(self, path: &str, value_placeholder: &str) -> (T, String) {
        match self {
            Self::Assign(value) => (value, format!("{path} = {value_placeholder}")),
            Self::Increment(value) => (value, format!("{path} = {path} + {value_placeholder}")),
            Self::Decrement(value) => (value, format!("{path} = {path} - {value_placeholder}")),
            Self::IfNotExists(value) => (
                value,
                format!("{path} = if_not_exists({path}, {value_placeholder})"),
            ),
        }
    }
}

/// Update expression.
///
/// Attribute names are unique within a clause, since DynamoDB rejects two actions on the
/// same path.
///
/// ```rust
/// use dynamo_counter::write::update_item;
/// use indexmap::IndexMap;
///
/// // atomic counter: creates the attribute at 1 when it is missing
/// let expression = update_item::UpdateExpression::Add(IndexMap::from([
///     ("Count".to_string(), 1),
/// ]));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateExpression<T> {
    /// ADD: add to a number (missing counts as 0) or union into a set.
    Add(IndexMap<String, T>),
    /// SET: assign or modify attribute values.
    Set(IndexMap<String, SetInput<T>>),
    /// Several clauses in one update expression.
    Combined(Vec<UpdateExpression<T>>),
}

impl<T: Serialize> UpdateExpression<T> {
    fn render(self, index: &mut usize) -> Result<common::ExpressionInput> {
        match self {
            Self::Add(inputs) => {
                let mut operations = Vec::with_capacity(inputs.len());
                for (name, value) in inputs {
                    let path = common::name_placeholder(&name);
                    let value_placeholder = format!(":add{index}");
                    *index += 1;
                    let value = to_attribute_value(value)?;
                    operations.push(common::ExpressionInput {
                        expression: format!("{path} {value_placeholder}"),
                        expression_attribute_names: collections::HashMap::from([(path, name)]),
                        expression_attribute_values: common::Item::from([(
                            value_placeholder,
                            value,
                        )]),
                    });
                }
                let mut operation = common::ExpressionInput::merge(", ", operations);
                operation.expression = format!("ADD {}", operation.expression);
                Ok(operation)
            }
            Self::Set(inputs) => {
                let mut operations = Vec::with_capacity(inputs.len());
                for (name, set_input) in inputs {
                    let path = common::name_placeholder(&name);
                    let value_placeholder = format!(":set{index}");
                    *index += 1;
                    let (value, expression) = set_input.split(&path, &value_placeholder);
                    let value = to_attribute_value(value)?;
                    operations.push(common::ExpressionInput {
                        expression,
                        expression_attribute_names: collections::HashMap::from([(path, name)]),
                        expression_attribute_values: common::Item::from([(
                            value_placeholder,
                            value,
                        )]),
                    });
                }
                let mut operation = common::ExpressionInput::merge(", ", operations);
                operation.expression = format!("SET {}", operation.expression);
                Ok(operation)
            }
            Self::Combined(clauses) => {
                let mut operations = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    operations.push(clause.render(index)?);
                }
                Ok(common::ExpressionInput::merge(" ", operations))
            }
        }
    }
}

impl<T: Serialize> TryFrom<UpdateExpression<T>> for common::ExpressionInput {
    type Error = Error;

    fn try_from(update_expression: UpdateExpression<T>) -> Result<Self> {
        update_expression.render(&mut 0)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct UpdateItemInput {
    keys: common::Item,
    update_expression: String,
    write_input: write::common::WriteInput,
}

/// Update item operation. Creates the item when it does not exist.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::{Client, types};
/// use dynamo_counter::{common, write};
/// use indexmap::IndexMap;
/// use serde_json::Value;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let update_item = write::update_item::UpdateItem {
///     keys: common::key::Keys::partition("CounterName", Value::from("TotalVisits")),
///     update_expression: write::update_item::UpdateExpression::Add(IndexMap::from([
///         ("Count".to_string(), Value::from(1)),
///     ])),
///     write_args: write::common::WriteArgs {
///         return_values: Some(types::ReturnValue::UpdatedNew),
///         table_name: "VisitCounter".to_string(),
///         ..Default::default()
///     },
/// };
/// let output = update_item.send(client).await?;
/// println!("{:?}", output.attributes());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateItem<T> {
    /// The primary key of the item to update.
    pub keys: common::key::Keys<T>,
    /// The changes to make.
    pub update_expression: UpdateExpression<T>,
    /// Table name, condition and return values.
    pub write_args: write::common::WriteArgs<T>,
}

impl<T: Serialize> TryFrom<UpdateItem<T>> for UpdateItemInput {
    type Error = Error;

    fn try_from(update_item: UpdateItem<T>) -> Result<Self> {
        let keys = update_item.keys.try_into()?;
        let mut index = 0;
        let update_expression = update_item.update_expression.render(&mut index)?;
        let mut write_input = update_item.write_args.into_input(&mut index)?;
        let update_expression = write_input.merge_expression(update_expression);
        Ok(Self {
            keys,
            update_expression,
            write_input,
        })
    }
}

impl<T: Serialize> UpdateItem<T> {
    /// Execute the update item operation.
    #[cfg_attr(
        feature = "instrument",
        tracing::instrument(name = "dynamo_counter.update_item", skip_all, err)
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::update_item::UpdateItemOutput,
        error::SdkError<operation::update_item::UpdateItemError>,
    > {
        let update_item: UpdateItemInput = self.try_into().map_err(error::BuildError::other)?;
        let builder = client
            .update_item()
            .set_key(Some(update_item.keys))
            .update_expression(update_item.update_expression);
        write::common::apply_write_input!(builder, update_item.write_input)
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case::set_assign(
        UpdateExpression::Set(
            IndexMap::from(
                [
                    (
                        "status".to_string(),
                        SetInput::Assign(
                            Value::String(
                                "completed".to_string()
                            )
                        )
                    ),
                ]
            )
        ),
        common::ExpressionInput {
            expression: "SET #status = :set0".to_string(),
            expression_attribute_names: collections::HashMap::from(
                [
                    ("#status".to_string(), "status".to_string()),
                ]
            ),
            expression_attribute_values: common::Item::from(
                [
                    (
                        ":set0".to_string(),
                        types::AttributeValue::S(
                            "completed".to_string()
                        )
                    ),
                ]
            ),
        }
    )]
    #[case::set_increment_and_decrement(
        UpdateExpression::Set(
            IndexMap::from(
                [
                    (
                        "Count".to_string(),
                        SetInput::Increment(
                            Value::Number(
                                1.into()
                            )
                        )
                    ),
                    (
                        "stock".to_string(),
                        SetInput::Decrement(
                            Value::Number(
                                3.into()
                            )
                        )
                    ),
                ]
            )
        ),
        common::ExpressionInput {
            expression: "SET #Count = #Count + :set0, #stock = #stock - :set1".to_string(),
            expression_attribute_names: collections::HashMap::from(
                [
                    ("#Count".to_string(), "Count".to_string()),
                    ("#stock".to_string(), "stock".to_string()),
                ]
            ),
            expression_attribute_values: common::Item::from(
                [
                    (
                        ":set0".to_string(),
                        types::AttributeValue::N(
                            "1".to_string()
                        )
                    ),
                    (
                        ":set1".to_string(),
                        types::AttributeValue::N(
                            "3".to_string()
                        )
                    ),
                ]
            ),
        }
    )]
    #[case::set_if_not_exists(
        UpdateExpression::Set(
            IndexMap::from(
                [
                    (
                        "created_date".to_string(),
                        SetInput::IfNotExists(
                            Value::String(
                                "2024-01-01T00:00:00Z".to_string()
                            )
                        )
                    ),
                ]
            )
        ),
        common::ExpressionInput {
            expression: "SET #created_date = if_not_exists(#created_date, :set0)".to_string(),
            expression_attribute_names: collections::HashMap::from(
                [
                    ("#created_date".to_string(), "created_date".to_string()),
                ]
            ),
            expression_attribute_values: common::Item::from(
                [
                    (
                        ":set0".to_string(),
                        types::AttributeValue::S(
                            "2024-01-01T00:00:00Z".to_string()
                        )
                    ),
                ]
            ),
        }
    )]
    #[case::add_counter(
        UpdateExpression::Add(
            IndexMap::from(
                [
                    (
                        "InvocationCount".to_string(),
                        Value::Number(
                            1.into()
                        )
                    ),
                ]
            )
        ),
        common::ExpressionInput {
            expression: "ADD #InvocationCount :add0".to_string(),
            expression_attribute_names: collections::HashMap::from(
                [
                    ("#InvocationCount".to_string(), "InvocationCount".to_string()),
                ]
            ),
            expression_attribute_values: common::Item::from(
                [
                    (
                        ":add0".to_string(),
                        types::AttributeValue::N(
                            "1".to_string()
                        )
                    ),
                ]
            ),
        }
    )]
    #[case::combined(
        UpdateExpression::Combined(
            vec![
                UpdateExpression::Set(
                    IndexMap::from(
                        [
                            (
                                "status".to_string(),
                                SetInput::Assign(
                                    Value::String(
                                        "processed".to_string()
                                    )
                                )
                            ),
                        ]
                    )
                ),
                UpdateExpression::Add(
                    IndexMap::from(
                        [
                            (
                                "revision".to_string(),
                                Value::Number(
                                    1.into()
                                )
                            ),
                        ]
                    )
                ),
            ]
        ),
        common::ExpressionInput {
            expression: "SET #status = :set0 ADD #revision :add1".to_string(),
            expression_attribute_names: collections::HashMap::from(
                [
                    ("#status".to_string(), "status".to_string()),
                    ("#revision".to_string(), "revision".to_string()),
                ]
            ),
            expression_attribute_values: common::Item::from(
                [
                    (
                        ":set0".to_string(),
                        types::AttributeValue::S(
                            "processed".to_string()
                        )
                    ),
                    (
                        ":add1".to_string(),
                        types::AttributeValue::N(
                            "1".to_string()
                        )
                    ),
                ]
            ),
        }
    )]
    fn test_update_expression(
        #[case] update_expression: UpdateExpression<Value>,
        #[case] expected: common::ExpressionInput,
    ) {
        let actual: common::ExpressionInput = update_expression.try_into().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_update_item_with_condition() {
        let update_item = UpdateItem {
            keys: common::key::Keys::partition("customer_id", Value::from("cus-02"))
                .with_sort("order_id", Value::from("ord-3")),
            update_expression: UpdateExpression::Set(IndexMap::from([(
                "status".to_string(),
                SetInput::Assign(Value::from("completed")),
            )])),
            write_args: write::common::WriteArgs {
                condition: Some(common::condition::Filter::all(vec![
                    common::condition::AttributeCondition::new(
                        "status",
                        common::condition::Condition::Equals(Value::from("pending")),
                    ),
                ])),
                return_values: Some(types::ReturnValue::UpdatedNew),
                table_name: "demo-dynamo-python".to_string(),
            },
        };
        let actual: UpdateItemInput = update_item.try_into().unwrap();
        assert_eq!(actual.update_expression, "SET #status = :set0");
        assert_eq!(
            actual.write_input.condition_expression.as_deref(),
            Some("#status = :status_eq1")
        );
        assert_eq!(
            actual.write_input.expression_attribute_values,
            Some(common::Item::from([
                (
                    ":set0".to_string(),
                    types::AttributeValue::S("completed".to_string())
                ),
                (
                    ":status_eq1".to_string(),
                    types::AttributeValue::S("pending".to_string())
                ),
            ]))
        );
        assert_eq!(
            actual.write_input.expression_attribute_names,
            Some(collections::HashMap::from([(
                "#status".to_string(),
                "status".to_string()
            )]))
        );
        assert_eq!(actual.keys.len(), 2);
    }

    #[test]
    fn test_update_item_condition_on_similar_name() {
        let update_item = UpdateItem {
            keys: common::key::Keys::partition("customer_id", Value::from("cus-02"))
                .with_sort("order_id", Value::from("ord-3")),
            update_expression: UpdateExpression::Set(IndexMap::from([(
                "created_date".to_string(),
                SetInput::Assign(Value::from("2024-03-01T10:11:12Z")),
            )])),
            write_args: write::common::WriteArgs {
                condition: Some(common::condition::Filter::all(vec![
                    common::condition::AttributeCondition::new(
                        "created-date",
                        common::condition::Condition::NotExists,
                    ),
                ])),
                table_name: "demo-dynamo-python".to_string(),
                ..Default::default()
            },
        };
        let actual: UpdateItemInput = update_item.try_into().unwrap();
        assert_eq!(
            actual.write_input.condition_expression.as_deref(),
            Some("attribute_not_exists(#created_date)")
        );
        assert_eq!(actual.update_expression, "SET #created_date_1 = :set0");
        assert_eq!(
            actual.write_input.expression_attribute_names,
            Some(collections::HashMap::from([
                ("#created_date".to_string(), "created-date".to_string()),
                ("#created_date_1".to_string(), "created_date".to_string()),
            ]))
        );
    }
}
